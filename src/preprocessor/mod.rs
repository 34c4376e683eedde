//! mdBook preprocessor adapter.
//!
//! Speaks the stdin/stdout protocol: `[context, book]` JSON in, the
//! transformed book JSON out. Each chapter is rewritten before mdBook parses
//! it — auxiliary documentation directives first, then every `tera` directive
//! is rendered and its fence replaced by the rendered text. Directive
//! failures are warnings and never fail the build.

pub mod docs;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{RawConfig, RenderConfig};
use crate::directive::{
    scan_directives, Directive, DirectiveKind, DirectiveOptions,
};
use crate::host::{
    DependencySink, DocumentSink, Location, TracingWarningSink, WarningCategory, WarningSink,
};
use crate::template_engine::{render_directive, DocumentContext, RenderRequest};

/// Name of the preprocessor, as it appears in `book.toml`.
pub const PREPROCESSOR_NAME: &str = "tera-block";

/// The book structure exchanged over the protocol. Unknown fields round-trip
/// untouched through `extra`.
#[derive(Debug, Deserialize, Serialize)]
pub struct Book {
    pub sections: Vec<BookItem>,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub enum BookItem {
    Chapter(Chapter),
    Separator,
    PartTitle(String),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Chapter {
    pub name: String,
    pub content: String,
    /// Chapter source path relative to the book `src` directory; `None` for
    /// draft chapters, which have no source to attribute output to.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub sub_items: Vec<BookItem>,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

/// Accumulates dependency registrations for the whole book run.
#[derive(Debug, Default)]
pub struct DependencyCollector {
    paths: BTreeSet<PathBuf>,
}

impl DependencySink for DependencyCollector {
    fn note_dependency(&mut self, path: &Path) {
        self.paths.insert(path.to_path_buf());
    }
}

impl DependencyCollector {
    /// Write the collected paths, one per line, sorted.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let mut contents = String::new();
        for p in &self.paths {
            contents.push_str(&p.display().to_string());
            contents.push('\n');
        }
        std::fs::write(path, contents)
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }
}

/// Run the whole preprocessor over a protocol input string, returning the
/// book JSON to print on stdout.
pub fn run(input: &str) -> anyhow::Result<String> {
    let (ctx, mut book): (Value, Book) = serde_json::from_str(input)?;

    let root = Path::new(ctx.get("root").and_then(Value::as_str).unwrap_or("."));
    let src = ctx
        .pointer("/config/book/src")
        .and_then(Value::as_str)
        .unwrap_or("src");
    let src_root = root.join(src);
    let renderer = ctx.get("renderer").and_then(Value::as_str).unwrap_or("html");

    let raw = RawConfig::from_table(ctx.pointer(&format!("/config/preprocessor/{PREPROCESSOR_NAME}")));
    let dependency_file = raw.dependency_file.clone();
    let config = RenderConfig::from_raw(raw);

    let mut warnings = TracingWarningSink;
    let mut deps = DependencyCollector::default();
    process_items(
        &mut book.sections,
        &src_root,
        renderer,
        &config,
        &mut warnings,
        &mut deps,
    );

    match dependency_file {
        Some(file) => {
            let file = if file.is_absolute() { file } else { root.join(file) };
            deps.write_to(&file)?;
            tracing::debug!(file = %file.display(), "Wrote dependency file");
        }
        None => {
            for path in deps.paths() {
                tracing::debug!(path = %path.display(), "Registered template dependency");
            }
        }
    }

    Ok(serde_json::to_string(&book)?)
}

fn process_items(
    items: &mut [BookItem],
    src_root: &Path,
    renderer: &str,
    config: &RenderConfig,
    warnings: &mut dyn WarningSink,
    deps: &mut dyn DependencySink,
) {
    for item in items {
        if let BookItem::Chapter(chapter) = item {
            if let Some(path) = chapter.path.clone() {
                let doc = DocumentContext {
                    doc_path: path,
                    src_root: src_root.to_path_buf(),
                };
                chapter.content =
                    process_chapter(&chapter.content, &doc, renderer, config, warnings, deps);
            }
            process_items(&mut chapter.sub_items, src_root, renderer, config, warnings, deps);
        }
    }
}

/// Rewrite one chapter: expand auxiliary directives, then render every
/// `tera` directive in place.
pub fn process_chapter(
    content: &str,
    doc: &DocumentContext,
    renderer: &str,
    config: &RenderConfig,
    warnings: &mut dyn WarningSink,
    deps: &mut dyn DependencySink,
) -> String {
    // Auxiliary documentation directives first: their output may itself
    // contain a `tera` directive (live example), picked up by the second
    // pass.
    let mut example_number = 0usize;
    let expanded = splice(content, |directive| match directive.kind {
        DirectiveKind::ConfigReference => Some(docs::config_reference()),
        DirectiveKind::Example => {
            example_number += 1;
            Some(docs::example_section(directive, example_number))
        }
        DirectiveKind::Render => None,
    });

    splice(&expanded, |directive| {
        if directive.kind != DirectiveKind::Render {
            return Some(String::new());
        }
        Some(render_block(directive, doc, renderer, config, warnings, deps))
    })
}

/// Replace directive spans in `content` using `replace`; `None` leaves the
/// block untouched. Spans arrive in source order and never overlap.
fn splice<F>(content: &str, mut replace: F) -> String
where
    F: FnMut(&Directive) -> Option<String>,
{
    let mut output = String::with_capacity(content.len());
    let mut cursor = 0usize;
    for directive in scan_directives(content) {
        let Some(replacement) = replace(&directive) else {
            continue;
        };
        output.push_str(&content[cursor..directive.span.start]);
        output.push_str(&replacement);
        cursor = directive.span.end;
    }
    output.push_str(&content[cursor..]);
    output
}

/// Render one `tera` directive into its replacement text. Failures emit a
/// warning and replace the fence with nothing.
fn render_block(
    directive: &Directive,
    doc: &DocumentContext,
    renderer: &str,
    config: &RenderConfig,
    warnings: &mut dyn WarningSink,
    deps: &mut dyn DependencySink,
) -> String {
    let location = Location::new(doc.source_file(), directive.line);
    let options = match DirectiveOptions::parse(&directive.info) {
        Ok(options) => options,
        Err(e) => {
            warnings.warn(&location, WarningCategory::DirectiveOption, &e.to_string());
            return String::new();
        }
    };

    let mut sink = SpliceSink::new(renderer);
    let request = RenderRequest {
        options: &options,
        body: &directive.body,
        line: directive.line,
        body_line: directive.body_line,
        doc,
    };
    render_directive(&request, config, warnings, deps, &mut sink);

    let mut replacement = sink.inserted.unwrap_or_default();
    if !replacement.is_empty() && !replacement.ends_with('\n') {
        replacement.push('\n');
    }
    if let Some(debug) = sink.debug {
        replacement.push('\n');
        replacement.push_str(&debug);
    }
    replacement
}

/// Collects the output of a single directive invocation for splicing.
#[derive(Debug)]
struct SpliceSink<'a> {
    renderer: &'a str,
    inserted: Option<String>,
    debug: Option<String>,
}

impl<'a> SpliceSink<'a> {
    fn new(renderer: &'a str) -> Self {
        Self {
            renderer,
            inserted: None,
            debug: None,
        }
    }
}

impl DocumentSink for SpliceSink<'_> {
    fn insert_source(&mut self, text: &str, origin: &Location) {
        tracing::debug!(origin = %origin, bytes = text.len(), "Inserting rendered text");
        self.inserted = Some(text.to_string());
    }

    fn insert_raw(&mut self, text: &str, format: &str, origin: &Location) {
        // Chapter markdown passes raw HTML through to the renderer, so a
        // matching format splices verbatim. Output for any other format has
        // no destination in this build and is dropped.
        if format == self.renderer {
            tracing::debug!(origin = %origin, format, "Inserting raw output");
            self.inserted = Some(text.to_string());
        } else {
            tracing::debug!(origin = %origin, format, "Dropping raw output for other renderer");
            self.inserted = Some(String::new());
        }
    }

    fn emit_debug_block(&mut self, text: &str, _location: &Location) {
        self.debug = Some(fenced_block(text, "text"));
    }
}

/// Wrap `text` in a fence long enough that backtick runs inside it cannot
/// close the fence early.
pub(crate) fn fenced_block(text: &str, info: &str) -> String {
    let mut longest = 0usize;
    let mut current = 0usize;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    let fence = "`".repeat((longest + 1).max(3));
    let body = text.strip_suffix('\n').unwrap_or(text);
    format!("{fence}{info}\n{body}\n{fence}\n")
}
