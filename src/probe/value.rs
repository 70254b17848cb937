//! Type-erased call results.

use std::any::{type_name, Any};
use std::fmt;

use crate::error::DispatchError;

/// An owned value of some `Send + 'static` type.
///
/// Carries the name of the type it was created from, so mismatches can be
/// reported without guessing.
pub struct Value {
    inner: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the stored type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Recovers the stored value, handing `self` back on a type mismatch.
    pub fn downcast<T: 'static>(self) -> Result<T, Value> {
        let type_name = self.type_name;
        self.inner
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|inner| Value { inner, type_name })
    }

    /// Recovers the stored value as a call result.
    pub fn take<T: 'static>(self) -> Result<T, DispatchError> {
        self.downcast::<T>().map_err(|value| DispatchError::ResultType {
            expected: type_name::<T>(),
            found: value.type_name,
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.type_name)
    }
}
