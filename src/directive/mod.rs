//! Directive blocks embedded in chapter markdown.
//!
//! A directive is a fenced code block whose info string starts with one of
//! the recognized tags:
//!
//! ````markdown
//! ```tera quickstart ctx='{"name": "demo"}' debug
//! Hello {{ name }}!
//! ```
//! ````
//!
//! The first bare token after the tag selects a named context; `key=value`
//! tokens are options; a bare `debug` token is a flag.

mod scan;

pub use scan::scan_directives;

/// Recognized directive tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `tera` — render the block through the template engine.
    Render,
    /// `tera-config` — emit the configuration option reference.
    ConfigReference,
    /// `tera-example` — emit a paired source/output example section.
    Example,
}

impl DirectiveKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "tera" => Some(Self::Render),
            "tera-config" => Some(Self::ConfigReference),
            "tera-example" => Some(Self::Example),
            _ => None,
        }
    }
}

/// A directive occurrence found in a chapter.
#[derive(Debug, Clone)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Full info string, including the tag.
    pub info: String,
    /// Body text between the fences.
    pub body: String,
    /// Byte span of the whole fenced block within the chapter source.
    pub span: std::ops::Range<usize>,
    /// 1-based line number of the opening fence.
    pub line: usize,
    /// 1-based line number of the first body line.
    pub body_line: usize,
}

/// Parsed options for a `tera` directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveOptions {
    /// Positional argument: the named context to merge.
    pub context_name: Option<String>,
    /// `file=` — render an external template instead of the body.
    pub file: Option<String>,
    /// `ctx=` — JSON object of inline context variables.
    pub ctx: Option<String>,
    /// `raw=` — emit the rendered text as raw output for the named renderer
    /// format instead of splicing it into the chapter source.
    pub raw: Option<String>,
    /// `debug` — also emit the raw rendered text.
    pub debug: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("unterminated quote in directive options")]
    UnterminatedQuote,
    #[error("unknown directive option '{0}'")]
    UnknownOption(String),
    #[error("unexpected argument '{0}', context name already given")]
    ExtraArgument(String),
}

impl DirectiveOptions {
    /// Parse the info string of a `tera` directive (tag included).
    pub fn parse(info: &str) -> Result<Self, OptionError> {
        let mut options = Self::default();
        let mut tokens = tokenize(info)?.into_iter();
        // First token is the directive tag itself.
        tokens.next();

        for token in tokens {
            if let Some((key, value)) = token.split_once('=') {
                match key {
                    "file" => options.file = Some(value.to_string()),
                    "ctx" => options.ctx = Some(value.to_string()),
                    "raw" => options.raw = Some(value.to_string()),
                    _ => return Err(OptionError::UnknownOption(key.to_string())),
                }
            } else if token == "debug" {
                options.debug = true;
            } else if options.context_name.is_some() {
                return Err(OptionError::ExtraArgument(token));
            } else {
                options.context_name = Some(token);
            }
        }
        Ok(options)
    }
}

/// Split an info string on whitespace, honoring single and double quotes so
/// option values can carry spaces (`ctx='{"a": 1}'`). Quotes are stripped.
pub(crate) fn tokenize(info: &str) -> Result<Vec<String>, OptionError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in info.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quote.is_some() {
        return Err(OptionError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
