//! Tera-based rendering of directive blocks.
//!
//! One isolated engine per invocation: context assembly, filter/tester
//! installation, source resolution, reference discovery, render, output.

mod discovery;
mod engine;
pub(crate) mod filters;
pub(crate) mod testers;

pub use engine::{render_directive, DocumentContext, RenderRequest};
