//! Shared test doubles for the injected host interfaces.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mdbook_tera_block::host::{
    DependencySink, DocumentSink, Location, WarningCategory, WarningSink,
};

/// Collects warnings instead of logging them.
#[derive(Debug, Default)]
pub struct RecordingWarnings {
    pub entries: Vec<(Location, WarningCategory, String)>,
}

impl WarningSink for RecordingWarnings {
    fn warn(&mut self, location: &Location, category: WarningCategory, message: &str) {
        self.entries
            .push((location.clone(), category, message.to_string()));
    }
}

impl RecordingWarnings {
    pub fn categories(&self) -> Vec<WarningCategory> {
        self.entries.iter().map(|(_, c, _)| *c).collect()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, _, m)| m.as_str()).collect()
    }
}

/// Collects dependency registrations.
#[derive(Debug, Default)]
pub struct RecordingDeps {
    pub paths: Vec<PathBuf>,
}

impl DependencySink for RecordingDeps {
    fn note_dependency(&mut self, path: &Path) {
        self.paths.push(path.to_path_buf());
    }
}

/// Collects document output.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub inserted: Vec<(String, Location)>,
    pub raw: Vec<(String, String, Location)>,
    pub debug_blocks: Vec<(String, Location)>,
}

impl DocumentSink for RecordingOutput {
    fn insert_source(&mut self, text: &str, origin: &Location) {
        self.inserted.push((text.to_string(), origin.clone()));
    }

    fn insert_raw(&mut self, text: &str, format: &str, origin: &Location) {
        self.raw
            .push((text.to_string(), format.to_string(), origin.clone()));
    }

    fn emit_debug_block(&mut self, text: &str, location: &Location) {
        self.debug_blocks.push((text.to_string(), location.clone()));
    }
}
