//! Auxiliary directives used to document the preprocessor itself.
//!
//! `tera-config` renders the configuration option reference; `tera-example`
//! renders a numbered source/output example. Neither touches the render
//! procedure.

use crate::config::CONFIG_OPTIONS;
use crate::directive::{tokenize, Directive};

use super::fenced_block;

/// Markdown table of every configuration option, from option metadata.
pub(crate) fn config_reference() -> String {
    let mut out = String::from("**Configuration options** (`[preprocessor.tera-block]`):\n\n");
    out.push_str("| Option | Description | Default |\n");
    out.push_str("| --- | --- | --- |\n");
    for option in CONFIG_OPTIONS {
        out.push_str(&format!(
            "| `{}` | {} | {} |\n",
            option.name, option.doc, option.default
        ));
    }
    out
}

/// A numbered example section: optional `conf=` and `template=` snippets,
/// the directive source verbatim, then the source itself so the render pass
/// produces the live output below it.
pub(crate) fn example_section(directive: &Directive, number: usize) -> String {
    let mut conf = None;
    let mut template = None;
    let mut template_path = "template.tera".to_string();

    // Aux directive, display-only: unknown or malformed options are skipped.
    if let Ok(tokens) = tokenize(&directive.info) {
        for token in tokens.into_iter().skip(1) {
            match token.split_once('=') {
                Some(("conf", value)) => conf = Some(value.to_string()),
                Some(("template", value)) => template = Some(value.to_string()),
                Some(("template_path" | "template-path", value)) => {
                    template_path = value.to_string()
                }
                _ => {}
            }
        }
    }

    let mut out = format!("#### Example {number}\n\n");
    if let Some(conf) = conf {
        out.push_str("**book.toml:**\n\n");
        out.push_str(&fenced_block(&conf, "toml"));
        out.push('\n');
    }
    if let Some(template) = template {
        out.push_str(&format!("**{template_path}:**\n\n"));
        out.push_str(&fenced_block(&template, "tera"));
        out.push('\n');
    }
    out.push_str("**Source:**\n\n");
    out.push_str(&fenced_block(&directive.body, "markdown"));
    out.push_str("\n**Rendered:**\n\n");
    out.push_str(&directive.body);
    out.push('\n');
    out
}
