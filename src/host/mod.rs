//! Host-facing interfaces for warning emission, dependency registration,
//! and document output.
//!
//! The render procedure never talks to a concrete host. It calls these three
//! narrow traits, so the mdBook adapter and the test doubles are
//! interchangeable consumers.

use std::fmt;
use std::path::{Path, PathBuf};

/// A position in documentation source, used to attribute warnings and
/// inserted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Source file the text originates from.
    pub file: PathBuf,
    /// 1-based line number within that file.
    pub line: usize,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Fixed warning taxonomy. Every warning a directive invocation can emit
/// falls into exactly one of these categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCategory {
    ContextNotFound,
    ContextNotAMap,
    CtxOptionInvalidJson,
    CtxOptionNotAMap,
    FilterInstall,
    TesterInstall,
    EngineOption,
    DirectiveOption,
    FileAndContent,
    FileRead,
    Render,
}

impl WarningCategory {
    /// Stable tag for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContextNotFound => "context-not-found",
            Self::ContextNotAMap => "context-not-a-map",
            Self::CtxOptionInvalidJson => "ctx-invalid-json",
            Self::CtxOptionNotAMap => "ctx-not-a-map",
            Self::FilterInstall => "filter-install",
            Self::TesterInstall => "tester-install",
            Self::EngineOption => "engine-option",
            Self::DirectiveOption => "directive-option",
            Self::FileAndContent => "file-and-content",
            Self::FileRead => "file-read",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives warnings from directive invocations. Warnings never abort the
/// build; they abort only the current invocation.
pub trait WarningSink {
    fn warn(&mut self, location: &Location, category: WarningCategory, message: &str);
}

/// Receives build-dependency registrations: files whose contents the current
/// document's output depends on. Pass-through only — deduplication is the
/// host's concern.
pub trait DependencySink {
    fn note_dependency(&mut self, path: &Path);
}

/// Receives rendered output. At most one of `insert_source` / `insert_raw`
/// and at most one `emit_debug_block` call per invocation.
pub trait DocumentSink {
    /// Insert rendered text into the document's parse stream, attributed to
    /// `origin`, so downstream parsing treats it as original source at that
    /// position.
    fn insert_source(&mut self, text: &str, origin: &Location);

    /// Insert rendered text as raw output for the named renderer format,
    /// bypassing the document parser. The host decides whether the format
    /// applies to the current build; text for other formats produces no
    /// output.
    fn insert_raw(&mut self, text: &str, format: &str, origin: &Location);

    /// Emit a visible literal block with the verbatim rendered text, in
    /// addition to the inserted source. Only called when debug is active.
    fn emit_debug_block(&mut self, text: &str, location: &Location);
}

/// Production warning sink: structured `tracing` warnings with a fixed tag.
#[derive(Debug, Default)]
pub struct TracingWarningSink;

impl WarningSink for TracingWarningSink {
    fn warn(&mut self, location: &Location, category: WarningCategory, message: &str) {
        tracing::warn!(
            location = %location,
            category = %category,
            "{message} [tera-block]"
        );
    }
}
