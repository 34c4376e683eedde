//! mdBook preprocessor that renders Tera template blocks embedded in
//! chapters.
//!
//! Chapters may contain fenced blocks tagged `tera`; each block is rendered
//! through an isolated Tera engine with a context assembled from host
//! configuration and directive options, and the rendered text replaces the
//! fence before mdBook parses the chapter. Render failures are downgraded to
//! warnings — a broken directive produces no output, never a broken build.
//!
//! # Modules
//!
//! - [`config`] — resolution of the `[preprocessor.tera-block]` table
//! - [`directive`] — fenced-block discovery and option parsing
//! - [`host`] — injected interfaces for warnings, dependencies, and output
//! - [`template_engine`] — the per-directive render procedure
//! - [`preprocessor`] — the mdBook protocol adapter

pub mod config;
pub mod directive;
pub mod host;
pub mod preprocessor;
pub mod template_engine;
