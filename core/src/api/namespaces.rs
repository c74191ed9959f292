//! Callable namespaces registered with an engine.

use alloc::sync::Arc;
use core::fmt;

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use pest::Parser;

use super::Error;
use crate::parser::{Rule, ScriptParser};
use crate::values::HostObject;
use crate::{String, Vec, format};

static EMPTY: Lazy<Namespaces> = Lazy::new(|| Namespaces {
    entries: Arc::new(HashMap::new()),
});

/// An immutable mapping from namespace names to host objects.
///
/// `ns:fn(args)` calls `fn` on the object registered under `ns`; unprefixed
/// calls use the object registered under the empty name. Cloning shares the
/// underlying map. The default value is one process-wide empty map.
#[derive(Clone)]
pub struct Namespaces {
    entries: Arc<HashMap<String, Arc<dyn HostObject>>>,
}

impl Namespaces {
    /// The shared empty mapping.
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    pub fn builder() -> NamespacesBuilder {
        NamespacesBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn HostObject>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether both values share the same underlying map.
    pub fn ptr_eq(&self, other: &Namespaces) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Namespaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Builder for [`Namespaces`].
///
/// # Example
///
/// ```
/// use sable_core::Namespaces;
/// use sable_core::values::{HostObject, Value};
///
/// #[derive(Debug)]
/// struct MathLib;
///
/// impl HostObject for MathLib {
///     fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, String>> {
///         match (name, args) {
///             ("twice", [Value::Int(i)]) => Some(Ok(Value::Int(i * 2))),
///             _ => None,
///         }
///     }
/// }
///
/// let mut builder = Namespaces::builder();
/// builder.register("math", MathLib);
/// let namespaces = builder.build().unwrap();
/// assert!(namespaces.contains("math"));
/// ```
#[derive(Default)]
pub struct NamespacesBuilder {
    entries: Vec<(String, Arc<dyn HostObject>)>,
}

impl NamespacesBuilder {
    /// Register a host object under `name`.
    ///
    /// Names are validated when the mapping is built.
    pub fn register(&mut self, name: &str, object: impl HostObject + 'static) -> &mut Self {
        self.register_shared(name, Arc::new(object))
    }

    /// Register an already shared host object under `name`.
    pub fn register_shared(&mut self, name: &str, object: Arc<dyn HostObject>) -> &mut Self {
        self.entries.push((String::from(name), object));
        self
    }

    /// Build the mapping.
    ///
    /// Fails with [`Error::Configuration`] if a name is registered twice or
    /// is neither empty nor a valid identifier.
    pub fn build(self) -> Result<Namespaces, Error> {
        if self.entries.is_empty() {
            return Ok(Namespaces::empty());
        }
        let mut map = HashMap::with_capacity(self.entries.len());
        for (name, object) in self.entries {
            if !is_valid_name(&name) {
                return Err(Error::Configuration(format!(
                    "invalid namespace name '{}'",
                    name
                )));
            }
            if map.insert(name.clone(), object).is_some() {
                return Err(Error::Configuration(format!(
                    "namespace '{}' is registered more than once",
                    name
                )));
            }
        }
        Ok(Namespaces {
            entries: Arc::new(map),
        })
    }
}

/// A name is valid if it is empty or the grammar accepts it as an identifier.
fn is_valid_name(name: &str) -> bool {
    if name.is_empty() {
        return true;
    }
    ScriptParser::parse(Rule::ident, name)
        .ok()
        .and_then(|mut pairs| pairs.next())
        .is_some_and(|pair| pair.as_str().len() == name.len())
}
