//! Fenced-block scanning over chapter markdown.
//!
//! Uses pulldown-cmark's offset iterator so each directive carries the byte
//! span of its whole fence (for splicing) and the line number of its body
//! (for attribution). Fences nested inside longer fences are plain text to
//! the parser and are never picked up as directives.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::{Directive, DirectiveKind};

/// Find every directive block in `content`, in source order.
pub fn scan_directives(content: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    let mut open: Option<Directive> = None;
    let mut body_start: Option<usize> = None;

    for (event, range) in Parser::new_ext(content, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let tag = info.split_whitespace().next().unwrap_or("");
                if let Some(kind) = DirectiveKind::from_tag(tag) {
                    open = Some(Directive {
                        kind,
                        info: info.to_string(),
                        body: String::new(),
                        line: line_of(content, range.start),
                        span: range,
                        body_line: 0,
                    });
                    body_start = None;
                }
            }
            Event::Text(text) => {
                if let Some(directive) = open.as_mut() {
                    if body_start.is_none() {
                        body_start = Some(range.start);
                    }
                    directive.body.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(mut directive) = open.take() {
                    // Line of the first body byte; an empty body sits on the
                    // line after the opening fence.
                    let offset = body_start.unwrap_or(directive.span.start);
                    let mut line = line_of(content, offset);
                    if body_start.is_none() {
                        line += 1;
                    }
                    directive.body_line = line;
                    // Fenced bodies carry a trailing newline per line; the
                    // template source should not gain one the author didn't
                    // write on the last line.
                    if directive.body.ends_with('\n') {
                        directive.body.pop();
                    }
                    directives.push(directive);
                }
            }
            _ => {}
        }
    }

    directives
}

/// 1-based line number of a byte offset.
fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}
