//! The directive render procedure.
//!
//! Strictly sequential, abort-on-first-error: every failure emits exactly one
//! warning through the [`WarningSink`] and produces no output. Nothing here
//! escalates to a build-fatal error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tera::Tera;

use super::discovery;
use crate::config::RenderConfig;
use crate::directive::DirectiveOptions;
use crate::host::{DependencySink, DocumentSink, Location, WarningCategory, WarningSink};

/// Ambient facts about the document being built, fixed for all directives in
/// that document.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    /// Chapter path relative to the book source root.
    pub doc_path: PathBuf,
    /// Book source root; also the template lookup base.
    pub src_root: PathBuf,
}

impl DocumentContext {
    /// Full path of the document's source file.
    pub fn source_file(&self) -> PathBuf {
        self.src_root.join(&self.doc_path)
    }
}

/// One directive invocation: parsed options, body text, and attribution.
#[derive(Debug)]
pub struct RenderRequest<'a> {
    pub options: &'a DirectiveOptions,
    /// Directive body, used as template source when no `file` option is given.
    pub body: &'a str,
    /// 1-based line of the directive itself; warnings point here.
    pub line: usize,
    /// 1-based line of the body within the document source.
    pub body_line: usize,
    pub doc: &'a DocumentContext,
}

/// Render one directive, sending output, warnings and dependency
/// registrations through the injected sinks.
pub fn render_directive(
    request: &RenderRequest<'_>,
    config: &RenderConfig,
    warnings: &mut dyn WarningSink,
    deps: &mut dyn DependencySink,
    out: &mut dyn DocumentSink,
) {
    let doc = request.doc;
    let location = Location::new(doc.source_file(), request.line);

    // Context assembly, lowest precedence first: host environment entry,
    // then the named context, then the inline ctx option.
    let mut variables = serde_json::Map::new();
    variables.insert("env".to_string(), environment_entry(doc));

    if let Some(name) = &request.options.context_name {
        match config.contexts.get(name) {
            None => {
                warnings.warn(
                    &location,
                    WarningCategory::ContextNotFound,
                    &format!("Context '{name}' not found in configured contexts"),
                );
                return;
            }
            Some(Value::Object(entries)) => {
                for (key, value) in entries {
                    variables.insert(key.clone(), value.clone());
                }
            }
            Some(other) => {
                warnings.warn(
                    &location,
                    WarningCategory::ContextNotAMap,
                    &format!(
                        "Expected context '{name}' to be a table, got {}",
                        json_type_name(other)
                    ),
                );
                return;
            }
        }
    }

    if let Some(raw) = &request.options.ctx {
        match serde_json::from_str::<Value>(raw) {
            Err(e) => {
                warnings.warn(
                    &location,
                    WarningCategory::CtxOptionInvalidJson,
                    &format!("Error parsing 'ctx' option as JSON: {e}"),
                );
                return;
            }
            Ok(Value::Object(entries)) => {
                for (key, value) in entries {
                    variables.insert(key, value);
                }
            }
            Ok(other) => {
                warnings.warn(
                    &location,
                    WarningCategory::CtxOptionNotAMap,
                    &format!(
                        "Expected 'ctx' option to be a JSON object, got {}",
                        json_type_name(&other)
                    ),
                );
                return;
            }
        }
    }

    // Isolated engine per invocation. Undefined variables are render errors
    // in Tera, which is the strictness this procedure requires.
    let mut tera = Tera::default();
    if let Err(message) = apply_engine_options(&mut tera, &config.engine) {
        warnings.warn(&location, WarningCategory::EngineOption, &message);
        return;
    }

    if let Err(e) = config.filters.install(&mut tera) {
        warnings.warn(
            &location,
            WarningCategory::FilterInstall,
            &format!("Error installing filters: {e}"),
        );
        return;
    }
    if let Err(e) = config.testers.install(&mut tera) {
        warnings.warn(
            &location,
            WarningCategory::TesterInstall,
            &format!("Error installing testers: {e}"),
        );
        return;
    }

    // Template source: external file wins over body content.
    let (source_text, origin) = if let Some(file_option) = &request.options.file {
        if !request.body.is_empty() {
            warnings.warn(
                &location,
                WarningCategory::FileAndContent,
                "Both 'file' and directive content specified, ignoring content",
            );
        }
        let path = resolve_template_path(doc, file_option);
        match std::fs::read_to_string(&path) {
            Err(e) => {
                warnings.warn(
                    &location,
                    WarningCategory::FileRead,
                    &format!("Error reading template file {}: {e}", path.display()),
                );
                return;
            }
            Ok(text) => {
                deps.note_dependency(&path);
                // Attribution resets to the first line of the file.
                (text, Location::new(path, 1))
            }
        }
    } else {
        (
            request.body.to_string(),
            Location::new(doc.source_file(), request.body_line),
        )
    };

    if let Err(e) = discovery::load_references(&mut tera, &doc.src_root, &source_text, deps) {
        warnings.warn(
            &location,
            WarningCategory::Render,
            &format!("Error rendering template: {}", error_chain(&e)),
        );
        return;
    }

    let template_name = origin.file.display().to_string();
    if let Err(e) = tera.add_raw_template(&template_name, &source_text) {
        warnings.warn(
            &location,
            WarningCategory::Render,
            &format!("Error rendering template: {}", error_chain(&e)),
        );
        return;
    }

    let mut context = tera::Context::new();
    for (key, value) in &variables {
        context.insert(key.as_str(), value);
    }

    let rendered = match tera.render(&template_name, &context) {
        Err(e) => {
            warnings.warn(
                &location,
                WarningCategory::Render,
                &format!("Error rendering template: {}", error_chain(&e)),
            );
            return;
        }
        Ok(rendered) => rendered,
    };

    match &request.options.raw {
        Some(format) => out.insert_raw(&rendered, format, &origin),
        None => out.insert_source(&rendered, &origin),
    }

    if config.debug || request.options.debug {
        out.emit_debug_block(&rendered, &location);
    }
}

/// The `env` context entry exposing host build facts to templates.
fn environment_entry(doc: &DocumentContext) -> Value {
    json!({
        "doc": doc.doc_path.display().to_string(),
        "source": doc.source_file().display().to_string(),
        "root": doc.src_root.display().to_string(),
        "preprocessor": {
            "name": "tera-block",
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

/// Apply opaque engine options. Autoescape defaults off — the output is
/// document source, not HTML.
fn apply_engine_options(tera: &mut Tera, options: &HashMap<String, Value>) -> Result<(), String> {
    tera.autoescape_on(vec![]);
    for (key, value) in options {
        match key.as_str() {
            "autoescape" => match value.as_bool() {
                Some(true) => tera.autoescape_on(vec![".html", ".htm", ".xml"]),
                Some(false) => tera.autoescape_on(vec![]),
                None => {
                    return Err(format!(
                        "Engine option 'autoescape' expects a boolean, got {}",
                        json_type_name(value)
                    ));
                }
            },
            other => return Err(format!("Unknown engine option '{other}'")),
        }
    }
    Ok(())
}

/// Resolve the `file=` option: leading `/` is relative to the source root,
/// anything else is relative to the current document's directory.
fn resolve_template_path(doc: &DocumentContext, option: &str) -> PathBuf {
    if let Some(rest) = option.strip_prefix('/') {
        return doc.src_root.join(rest);
    }
    let source = doc.source_file();
    let dir = source.parent().unwrap_or(Path::new(""));
    dir.join(option)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Full error chain, joined so warnings carry the root cause (Tera's top
/// error is usually just "Failed to render '...'").
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
