use std::collections::HashMap;
use std::rc::Rc;

use crate::evaluator::EvalError;
use crate::value::Value;

/// A host-registered callable invoked through the `@` chain operator.
/// Receives the receiver value and the evaluated arguments.
pub type DynamicFn = Rc<dyn Fn(&Value, &[Value]) -> Result<Value, EvalError>>;

/// The mutable lexical scope of one evaluation run.
///
/// A flat mapping from identifier to value, plus a separate namespace of
/// dynamic methods. Variable bindings are write-once: a second `set` of the
/// same name reports a redefinition error and leaves the first binding
/// untouched. A scope belongs to a single evaluation at a time; it is not
/// meant to be shared across concurrent runs.
#[derive(Default, Clone)]
pub struct Scope {
    vars: HashMap<String, Value>,
    dynamic_methods: HashMap<String, DynamicFn>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`. Vars are immutable: rebinding an existing
    /// name is an error and the existing value stays.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Result<(), EvalError> {
        let name = name.into();
        if self.vars.contains_key(&name) {
            return Err(EvalError::Redefined(name));
        }
        self.vars.insert(name, value);
        Ok(())
    }

    /// Look up a bound name. The error lists what is currently in scope.
    pub fn get(&self, name: &str) -> Result<Value, EvalError> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::Undefined {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Currently bound names, sorted for stable diagnostics.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.vars.keys().cloned().collect();
        names.sort();
        names
    }

    /// Iterate over the current bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// Register a callable under the dynamic-method namespace. Unlike vars,
    /// dynamic methods may be replaced.
    pub fn set_dynamic_method(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&Value, &[Value]) -> Result<Value, EvalError> + 'static,
    ) {
        self.dynamic_methods.insert(name.into(), Rc::new(f));
    }

    pub fn dynamic_method(&self, name: &str) -> Option<DynamicFn> {
        self.dynamic_methods.get(name).cloned()
    }
}
