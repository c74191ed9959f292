//! Variable bindings supplied by the caller.

use hashbrown::HashMap;

use crate::String;
use crate::values::Value;

/// Variable storage read and written during one evaluation.
///
/// The engine never shares a context between evaluations; callers that do so
/// must synchronize it themselves.
pub trait Context {
    fn get(&self, name: &str) -> Option<Value>;

    fn set(&mut self, name: &str, value: Value);

    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// A [`Context`] backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct MapContext {
    vars: HashMap<String, Value>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding, returning the context for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Context for MapContext {
    fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(String::from(name), value);
    }

    fn has(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MapContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut ctx = MapContext::new().with("x", 1);
        assert_eq!(ctx.get("x"), Some(Value::Int(1)));
        assert!(!ctx.has("y"));

        ctx.set("y", Value::from("two"));
        assert!(ctx.has("y"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_null_binding_is_present() {
        let ctx = MapContext::new().with("n", Value::Null);
        assert!(ctx.has("n"));
        assert_eq!(ctx.get("n"), Some(Value::Null));
    }

    #[test]
    fn test_from_iterator() {
        let ctx: MapContext = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(ctx.get("b"), Some(Value::Int(2)));
    }
}
