//! Configuration resolution for the `[preprocessor.tera-block]` table.
//!
//! The host table is re-read on every book build and resolved into an
//! immutable [`RenderConfig`]. Absent values default silently — configuration
//! resolution itself has no error conditions. Shape problems in individual
//! values (a context that is not a table, an unknown filter name) surface
//! later, as per-invocation warnings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tera::Tera;

use crate::template_engine::{filters, testers};

/// A custom filter callable, same shape Tera's blanket `Filter` impl accepts.
pub type FilterFn =
    Arc<dyn Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync>;

/// A custom tester callable, same shape Tera's blanket `Test` impl accepts.
pub type TesterFn = Arc<dyn Fn(Option<&Value>, &[Value]) -> tera::Result<bool> + Send + Sync>;

/// Raw shape of the `book.toml` preprocessor table.
///
/// `filters` / `tests` are allowlists of built-in names — TOML cannot carry
/// callables. Custom callables enter through [`RenderConfig`] directly.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RawConfig {
    /// Named contexts: context name to a table of template variables.
    pub contexts: HashMap<String, Value>,

    /// Engine options applied to the Tera instance (currently `autoescape`).
    pub engine: HashMap<String, Value>,

    /// Built-in filters to install. Absent means all built-ins.
    pub filters: Option<Vec<String>>,

    /// Built-in testers to install. Absent means all built-ins.
    pub tests: Option<Vec<String>>,

    /// Emit a visible block with the raw rendered text for every directive.
    pub debug: bool,

    /// Where to write the collected dependency list after the build.
    pub dependency_file: Option<PathBuf>,
}

impl RawConfig {
    /// Deserialize the preprocessor table, falling back to defaults when the
    /// table is missing or malformed.
    pub fn from_table(table: Option<&Value>) -> Self {
        let Some(table) = table else {
            return Self::default();
        };
        match serde_json::from_value(table.clone()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse preprocessor config, using defaults");
                Self::default()
            }
        }
    }
}

/// Immutable configuration record resolved once per invocation.
pub struct RenderConfig {
    /// Named contexts selectable by the directive's positional argument.
    pub contexts: HashMap<String, Value>,
    /// Opaque engine options.
    pub engine: HashMap<String, Value>,
    /// Filters to install into the render environment.
    pub filters: FilterRegistry,
    /// Testers to install into the render environment.
    pub testers: TesterRegistry,
    /// Whether every directive also emits its raw rendered text.
    pub debug: bool,
}

impl RenderConfig {
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            contexts: raw.contexts,
            engine: raw.engine,
            filters: FilterRegistry::from_names(
                raw.filters
                    .unwrap_or_else(|| filters::builtin_names().map(String::from).collect()),
            ),
            testers: TesterRegistry::from_names(
                raw.tests
                    .unwrap_or_else(|| testers::builtin_names().map(String::from).collect()),
            ),
            debug: raw.debug,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_raw(RawConfig::default())
    }
}

/// Source of a registered filter or tester.
enum Callable<F> {
    /// Resolve by name against the built-in set at install time.
    Builtin,
    /// Caller-supplied callable.
    Custom(F),
}

/// Filters to install into a render environment, in registration order.
#[derive(Default)]
pub struct FilterRegistry {
    entries: Vec<(String, Callable<FilterFn>)>,
}

impl FilterRegistry {
    fn from_names(names: Vec<String>) -> Self {
        Self {
            entries: names
                .into_iter()
                .map(|n| (n, Callable::Builtin))
                .collect(),
        }
    }

    /// Register a caller-supplied filter.
    pub fn register(&mut self, name: impl Into<String>, func: FilterFn) {
        self.entries.push((name.into(), Callable::Custom(func)));
    }

    /// Install every entry into `tera`. Fails on an unknown built-in name or
    /// a name that is not a valid identifier.
    pub fn install(&self, tera: &mut Tera) -> Result<(), InstallError> {
        for (name, callable) in &self.entries {
            if !is_valid_name(name) {
                return Err(InstallError::InvalidName {
                    kind: "filter",
                    name: name.clone(),
                });
            }
            match callable {
                Callable::Builtin => {
                    let func = filters::builtin(name).ok_or_else(|| InstallError::Unknown {
                        kind: "filter",
                        name: name.clone(),
                    })?;
                    tera.register_filter(name, func);
                }
                Callable::Custom(func) => {
                    let func = Arc::clone(func);
                    tera.register_filter(
                        name,
                        move |value: &Value, args: &HashMap<String, Value>| func(value, args),
                    );
                }
            }
        }
        Ok(())
    }
}

/// Testers to install into a render environment, in registration order.
#[derive(Default)]
pub struct TesterRegistry {
    entries: Vec<(String, Callable<TesterFn>)>,
}

impl TesterRegistry {
    fn from_names(names: Vec<String>) -> Self {
        Self {
            entries: names
                .into_iter()
                .map(|n| (n, Callable::Builtin))
                .collect(),
        }
    }

    /// Register a caller-supplied tester.
    pub fn register(&mut self, name: impl Into<String>, func: TesterFn) {
        self.entries.push((name.into(), Callable::Custom(func)));
    }

    /// Install every entry into `tera`. Same failure modes as filters.
    pub fn install(&self, tera: &mut Tera) -> Result<(), InstallError> {
        for (name, callable) in &self.entries {
            if !is_valid_name(name) {
                return Err(InstallError::InvalidName {
                    kind: "tester",
                    name: name.clone(),
                });
            }
            match callable {
                Callable::Builtin => {
                    let func = testers::builtin(name).ok_or_else(|| InstallError::Unknown {
                        kind: "tester",
                        name: name.clone(),
                    })?;
                    tera.register_tester(name, func);
                }
                Callable::Custom(func) => {
                    let func = Arc::clone(func);
                    tera.register_tester(
                        name,
                        move |value: Option<&Value>, args: &[Value]| func(value, args),
                    );
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("unknown built-in {kind} '{name}'")]
    Unknown { kind: &'static str, name: String },
    #[error("invalid {kind} name '{name}'")]
    InvalidName { kind: &'static str, name: String },
}

/// Valid filter/tester names are non-empty identifiers.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Metadata for one configuration option, used by the `tera-config`
/// documentation directive.
pub struct ConfigOption {
    pub name: &'static str,
    pub doc: &'static str,
    pub default: &'static str,
}

/// Every option the preprocessor table accepts, in documentation order.
pub const CONFIG_OPTIONS: &[ConfigOption] = &[
    ConfigOption {
        name: "contexts",
        doc: "A table mapping context names to tables of template variables",
        default: "`{}`",
    },
    ConfigOption {
        name: "engine",
        doc: "Options applied to the Tera engine (`autoescape = true|false`)",
        default: "`{}`",
    },
    ConfigOption {
        name: "filters",
        doc: "Built-in filters to install (`snake_case`, `pascal_case`, `camel_case`, `kebab_case`)",
        default: "all built-ins",
    },
    ConfigOption {
        name: "tests",
        doc: "Built-in testers to install (`blank`, `identifier`)",
        default: "all built-ins",
    },
    ConfigOption {
        name: "debug",
        doc: "Also output the raw rendered text as a visible code block",
        default: "`false`",
    },
    ConfigOption {
        name: "dependency-file",
        doc: "Path to write the list of files the rendered book depends on",
        default: "unset",
    },
];
