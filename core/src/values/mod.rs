//! Runtime values and the host-object hook.

mod value;

pub use value::{HostObject, Value};
