//! Syntax-level discovery of template references.
//!
//! Scans template source for `{% extends %}`, `{% include %}` and
//! `{% import %}` statements with string-literal targets, without evaluating
//! anything. Discovered files under the lookup base are loaded into the
//! engine and registered as build dependencies; the traversal is transitive
//! with cycle protection. Dynamic or unresolvable references are silently
//! skipped.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tera::Tera;

use crate::host::DependencySink;

static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{%-?\s*(?:extends|include|import)\s+(?:"([^"]*)"|'([^']*)')"#)
        .expect("reference pattern")
});

/// Template names statically referenced by `source`, in order of appearance.
pub(crate) fn referenced_templates(source: &str) -> Vec<String> {
    REFERENCE_RE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Load every discoverable template referenced from `source` into `tera`,
/// transitively, registering each loaded file with `deps`.
///
/// References escaping the lookup base via `..` are skipped, matching
/// filesystem-loader confinement. A referenced file that fails to parse
/// surfaces here rather than at render time.
pub(crate) fn load_references(
    tera: &mut Tera,
    base: &Path,
    source: &str,
    deps: &mut dyn DependencySink,
) -> tera::Result<()> {
    let mut pending = referenced_templates(source);
    let mut visited: HashSet<String> = HashSet::new();

    while let Some(name) = pending.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        if name.is_empty()
            || Path::new(&name)
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            continue;
        }
        let path = base.join(&name);
        if !path.is_file() {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        deps.note_dependency(&path);
        pending.extend(referenced_templates(&content));
        tera.add_raw_template(&name, &content)?;
    }

    Ok(())
}
