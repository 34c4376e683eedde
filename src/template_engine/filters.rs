//! Built-in Tera filters for case conversion, installable by name from host
//! configuration.

use std::collections::HashMap;

use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase};
use tera::{Result, Value};

pub(crate) type BuiltinFilter = fn(&Value, &HashMap<String, Value>) -> Result<Value>;

const BUILTINS: &[(&str, BuiltinFilter)] = &[
    ("snake_case", snake_case),
    ("pascal_case", pascal_case),
    ("camel_case", camel_case),
    ("kebab_case", kebab_case),
];

/// Names of all built-in filters, in registration order.
pub(crate) fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

/// Look up a built-in filter by name.
pub(crate) fn builtin(name: &str) -> Option<BuiltinFilter> {
    BUILTINS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, func)| *func)
}

fn expect_str<'a>(value: &'a Value, filter: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{filter} filter expects a string")))
}

fn snake_case(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    Ok(Value::String(expect_str(value, "snake_case")?.to_snake_case()))
}

fn pascal_case(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    Ok(Value::String(
        expect_str(value, "pascal_case")?.to_pascal_case(),
    ))
}

fn camel_case(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    Ok(Value::String(
        expect_str(value, "camel_case")?.to_lower_camel_case(),
    ))
}

fn kebab_case(value: &Value, _args: &HashMap<String, Value>) -> Result<Value> {
    Ok(Value::String(expect_str(value, "kebab_case")?.to_kebab_case()))
}
