//! Convert runtime values to JSON for machine-readable CLI output

use serde_json::{json, Value as JsonValue};

use crate::scope::Scope;
use crate::value::Value;

/// Convert a runtime value into JSON.
///
/// Scalars map directly; durations render in canonical literal form;
/// lambdas render as their formatted source; opaque values (objects,
/// callables) render as their description.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::Duration(d) => json!(d.to_string()),
        Value::String(s) => json!(s),
        Value::Regex(r) => json!(format!("/{}/", r.as_str())),
        Value::Lambda(_) => json!(value.to_string()),
        Value::List(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
        Value::Star => json!("*"),
        Value::Reference(r) => json!(format!("\"{r}\"")),
        Value::Object(o) => json!(o.borrow().describe()),
        Value::Func(_) => json!("<function>"),
    }
}

/// Dump a scope's bindings as a JSON object, keys sorted.
pub fn scope_to_json(scope: &Scope) -> JsonValue {
    let mut map = serde_json::Map::new();
    let mut entries: Vec<_> = scope.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in entries {
        map.insert(name.clone(), value_to_json(value));
    }
    JsonValue::Object(map)
}
