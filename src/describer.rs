//! Capability dispatch onto host objects.
//!
//! The evaluator never sees a host object's concrete type. It interacts
//! through [`SelfDescriber`]: chain methods (reached with `|`), and
//! properties (reached with `.`, either read bare or called with arguments
//! as a setter). `@` calls go through the scope's dynamic methods and never
//! touch this trait.
//!
//! Host types may implement the trait natively. For types that cannot be
//! modified, [`Describer`] is a composable registry of closures providing
//! the same surface: register chain methods, properties, and setters by
//! name, and compose capability sets with [`Describer::inherit`] (entries
//! already present shadow inherited ones).

use std::collections::HashMap;

use crate::evaluator::EvalError;
use crate::value::Value;

/// The capability surface a host object exposes to scripts.
pub trait SelfDescriber {
    /// A short human-readable name for the object, used in diagnostics.
    fn describe(&self) -> String;

    fn has_chain_method(&self, name: &str) -> bool;

    /// Invoke a chain method. Only called after `has_chain_method`
    /// returned true for `name`.
    fn call_chain_method(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError>;

    fn has_property(&self, name: &str) -> bool;

    /// Read a property value. `None` for write-only properties.
    fn property(&self, name: &str) -> Option<Value>;

    /// Set a property from call arguments. The evaluator pushes the
    /// receiver back onto the stack afterwards, so property calls chain.
    fn set_property(&mut self, name: &str, args: &[Value]) -> Result<(), EvalError>;
}

type MethodFn = Box<dyn FnMut(&[Value]) -> Result<Value, EvalError>>;
type SetterFn = Box<dyn FnMut(&[Value]) -> Result<Value, EvalError>>;

/// A registry-backed [`SelfDescriber`] for host types that do not implement
/// the trait themselves.
///
/// Script-level names are lower-camel while host-level registrations are
/// often upper-camel; lookup is case-insensitive at the first letter, so a
/// method registered as `Spawn` answers to `spawn`.
///
/// # Examples
///
/// ```
/// use plumb_lang::describer::Describer;
/// use plumb_lang::value::Value;
///
/// let base = Describer::new("node").with_property("period", Value::Int(0));
/// let mut window = Describer::new("window")
///     .with_property("every", Value::Int(0));
/// window.inherit(base);
/// ```
pub struct Describer {
    description: String,
    chain_methods: HashMap<String, MethodFn>,
    properties: HashMap<String, Value>,
    setters: HashMap<String, SetterFn>,
}

impl Describer {
    pub fn new(description: impl Into<String>) -> Self {
        Describer {
            description: description.into(),
            chain_methods: HashMap::new(),
            properties: HashMap::new(),
            setters: HashMap::new(),
        }
    }

    pub fn with_chain_method(
        mut self,
        name: impl Into<String>,
        f: impl FnMut(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        self.chain_methods.insert(name.into(), Box::new(f));
        self
    }

    /// Register a plain stored property. Setting it replaces the stored
    /// value with the single call argument.
    pub fn with_property(mut self, name: impl Into<String>, initial: Value) -> Self {
        self.properties.insert(name.into(), initial);
        self
    }

    /// Register a computed/validated property: the closure receives the
    /// call arguments and returns the value to store.
    pub fn with_setter(
        mut self,
        name: impl Into<String>,
        f: impl FnMut(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        self.setters.insert(name.into(), Box::new(f));
        self
    }

    /// Compose an inherited capability set under this one. Entries already
    /// registered here shadow the inherited ones on name collision, so
    /// composition order encodes the outer-overrides-inner rule.
    pub fn inherit(&mut self, base: Describer) {
        for (name, f) in base.chain_methods {
            self.chain_methods.entry(name).or_insert(f);
        }
        for (name, value) in base.properties {
            self.properties.entry(name).or_insert(value);
        }
        for (name, f) in base.setters {
            self.setters.entry(name).or_insert(f);
        }
    }

    /// Resolve a script-level name against a registry: exact match first,
    /// then with the first letter capitalized.
    fn resolve<'a, V>(map: &'a HashMap<String, V>, name: &str) -> Option<&'a str> {
        if map.contains_key(name) {
            return map.get_key_value(name).map(|(k, _)| k.as_str());
        }
        let capitalized = capitalize_first(name);
        map.get_key_value(capitalized.as_str()).map(|(k, _)| k.as_str())
    }
}

impl SelfDescriber for Describer {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn has_chain_method(&self, name: &str) -> bool {
        Describer::resolve(&self.chain_methods, name).is_some()
    }

    fn call_chain_method(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let key = Describer::resolve(&self.chain_methods, name)
            .map(str::to_string)
            .ok_or_else(|| {
                EvalError::MissingMethod(format!(
                    "no chain method \"{name}\" on {}",
                    self.description
                ))
            })?;
        let f = self.chain_methods.get_mut(&key).expect("resolved key");
        f(args)
    }

    fn has_property(&self, name: &str) -> bool {
        Describer::resolve(&self.properties, name).is_some()
            || Describer::resolve(&self.setters, name).is_some()
    }

    fn property(&self, name: &str) -> Option<Value> {
        let key = Describer::resolve(&self.properties, name)?;
        self.properties.get(key).cloned()
    }

    fn set_property(&mut self, name: &str, args: &[Value]) -> Result<(), EvalError> {
        if let Some(key) = Describer::resolve(&self.setters, name).map(str::to_string) {
            let f = self.setters.get_mut(&key).expect("resolved key");
            let value = f(args)?;
            self.properties.insert(key, value);
            return Ok(());
        }
        let key = Describer::resolve(&self.properties, name)
            .map(str::to_string)
            .ok_or_else(|| {
                EvalError::MissingMethod(format!(
                    "no property \"{name}\" on {}",
                    self.description
                ))
            })?;
        match args {
            [value] => {
                self.properties.insert(key, value.clone());
                Ok(())
            }
            _ => Err(EvalError::TypeError(format!(
                "property \"{name}\" on {} takes exactly one argument, got {}",
                self.description,
                args.len()
            ))),
        }
    }
}

fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_letter_case_fallback() {
        let mut d = Describer::new("host")
            .with_chain_method("Spawn", |_| Ok(Value::Int(1)))
            .with_property("Period", Value::Int(0));
        assert!(d.has_chain_method("spawn"));
        assert!(d.has_chain_method("Spawn"));
        assert!(d.has_property("period"));
        assert_eq!(d.call_chain_method("spawn", &[]).unwrap(), Value::Int(1));
        d.set_property("period", &[Value::Int(5)]).unwrap();
        assert_eq!(d.property("period"), Some(Value::Int(5)));
    }

    #[test]
    fn test_inherit_shadows_inner() {
        let base = Describer::new("base")
            .with_property("period", Value::Int(1))
            .with_property("every", Value::Int(2));
        let mut outer = Describer::new("outer").with_property("period", Value::Int(10));
        outer.inherit(base);
        // Outer keeps its own entry, inherits the rest
        assert_eq!(outer.property("period"), Some(Value::Int(10)));
        assert_eq!(outer.property("every"), Some(Value::Int(2)));
    }

    #[test]
    fn test_setter_validates() {
        let mut d = Describer::new("host").with_setter("count", |args| match args {
            [v] => Ok(Value::Int(v.to_i64()?)),
            _ => Err(EvalError::TypeError("count takes one argument".into())),
        });
        d.set_property("count", &[Value::String("42".into())]).unwrap();
        assert_eq!(d.property("count"), Some(Value::Int(42)));
        assert!(d.set_property("count", &[Value::Bool(true)]).is_err());
    }
}
