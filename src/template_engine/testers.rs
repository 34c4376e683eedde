//! Built-in Tera testers, installable by name from host configuration.
//!
//! Tera already ships the common testers (`odd`, `starting_with`, ...); these
//! add checks useful inside documentation templates without colliding with
//! that set.

use tera::{Result, Value};

pub(crate) type BuiltinTester = fn(Option<&Value>, &[Value]) -> Result<bool>;

const BUILTINS: &[(&str, BuiltinTester)] = &[("blank", blank), ("identifier", identifier)];

/// Names of all built-in testers, in registration order.
pub(crate) fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

/// Look up a built-in tester by name.
pub(crate) fn builtin(name: &str) -> Option<BuiltinTester> {
    BUILTINS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, func)| *func)
}

/// `value is blank` — null, empty/whitespace string, empty array or object.
fn blank(value: Option<&Value>, _args: &[Value]) -> Result<bool> {
    Ok(match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    })
}

/// `value is identifier` — a string usable as a variable or filter name.
fn identifier(value: Option<&Value>, _args: &[Value]) -> Result<bool> {
    let Some(s) = value.and_then(Value::as_str) else {
        return Ok(false);
    };
    let mut chars = s.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    Ok(valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_'))
}
