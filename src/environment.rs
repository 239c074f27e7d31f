use crate::errors::RuntimeError;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a scope. Closures hold one of these, so a scope lives as
/// long as the longest-lived function that captured it.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope of name bindings with a link to the scope it is nested in.
#[derive(Default)]
pub struct Environment {
    values: FxHashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Self {
            values: FxHashMap::default(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Binds `name` in this scope. Shadowing an outer binding is fine,
    /// rebinding one in the same scope is not.
    pub fn define(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.values.contains_key(name) {
            return Err(RuntimeError::new(format!("Identifier already declared '{name}'.")));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }
        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => Err(RuntimeError::new(format!("Undefined variable '{name}'."))),
        }
    }

    /// Overwrites the innermost existing binding of `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(RuntimeError::new(format!("Identifier not declared '{name}'."))),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        write!(f, "{names:?}")?;
        if let Some(enclosing) = &self.enclosing {
            write!(f, " -> {:?}", enclosing.borrow())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0)).unwrap();
        assert_eq!(env.get("a").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn redefinition_in_same_scope_fails() {
        let mut env = Environment::new();
        env.define("a", Value::Nil).unwrap();
        let err = env.define("a", Value::Bool(true)).unwrap_err();
        assert_eq!(err.message, "Identifier already declared 'a'.");
    }

    #[test]
    fn shadowing_in_nested_scope() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("a", Value::Number(1.0)).unwrap();
        let mut inner = Environment::with_enclosing(Rc::clone(&outer));
        inner.define("a", Value::Number(2.0)).unwrap();
        assert_eq!(inner.get("a").unwrap(), Value::Number(2.0));
        assert_eq!(outer.borrow().get("a").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn lookup_walks_outward() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("a", Value::String("x".into())).unwrap();
        let middle = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        let inner = Environment::with_enclosing(middle);
        assert_eq!(inner.get("a").unwrap(), Value::String("x".into()));
        let err = inner.get("b").unwrap_err();
        assert_eq!(err.message, "Undefined variable 'b'.");
    }

    #[test]
    fn assign_mutates_the_defining_scope() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("a", Value::Number(1.0)).unwrap();
        let mut inner = Environment::with_enclosing(Rc::clone(&outer));
        inner.assign("a", Value::Number(5.0)).unwrap();
        assert_eq!(outer.borrow().get("a").unwrap(), Value::Number(5.0));
        let err = inner.assign("missing", Value::Nil).unwrap_err();
        assert_eq!(err.message, "Identifier not declared 'missing'.");
    }

    #[test]
    fn debug_lists_scope_chain() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("g", Value::Nil).unwrap();
        let mut inner = Environment::with_enclosing(outer);
        inner.define("b", Value::Nil).unwrap();
        inner.define("a", Value::Nil).unwrap();
        assert_eq!(format!("{inner:?}"), r#"["a", "b"] -> ["g"]"#);
    }
}
