//! Typed handles to resource outputs
//!
//! An [`Output<T>`] is either a known literal or a reference to a field that
//! the engine fills in after the owning node is registered. The type
//! parameter only documents what the field will hold; it is never checked at
//! resolution time.

use crate::property::{IntoProperty, OutputRef, PathSegment, PropertyValue};
use crate::secret::Secret;
use crate::types::NodeId;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

/// Handle to a possibly-unresolved value of type `T`
pub struct Output<T> {
    value: PropertyValue,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Output<T> {
    /// Handle to `field` of `node`
    #[must_use]
    pub fn computed(node: NodeId, field: impl Into<String>) -> Self {
        Self::from_property(PropertyValue::Output(OutputRef::new(node, field)))
    }

    /// Wrap an already-built property value
    #[inline]
    #[must_use]
    pub fn from_property(value: PropertyValue) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub fn property(&self) -> &PropertyValue {
        &self.value
    }

    /// Node this output comes from, if it is computed
    #[must_use]
    pub fn source(&self) -> Option<NodeId> {
        match &self.value {
            PropertyValue::Output(output) => Some(output.node),
            PropertyValue::Secret(inner) => match &**inner.expose() {
                PropertyValue::Output(output) => Some(output.node),
                _ => None,
            },
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.value.is_resolved()
    }

    /// Mark the value as secret
    #[must_use]
    pub fn as_secret(self) -> Self {
        Self::from_property(PropertyValue::secret(self.value))
    }

    /// Member `key` of an object-valued output
    #[must_use]
    pub fn field<U>(&self, key: &str) -> Output<U> {
        self.step(PathSegment::Key(key.to_string()))
    }

    /// Element `index` of a list-valued output
    #[must_use]
    pub fn index<U>(&self, index: usize) -> Output<U> {
        self.step(PathSegment::Index(index))
    }

    fn step<U>(&self, segment: PathSegment) -> Output<U> {
        let value = match &self.value {
            PropertyValue::Output(output) => PropertyValue::Output(output.join(segment)),
            PropertyValue::Secret(inner) => match &**inner.expose() {
                PropertyValue::Output(output) => {
                    PropertyValue::secret(PropertyValue::Output(output.join(segment)))
                }
                known => known
                    .at_path(std::slice::from_ref(&segment))
                    .map_or(PropertyValue::Null, PropertyValue::secret),
            },
            known => known
                .at_path(std::slice::from_ref(&segment))
                .unwrap_or(PropertyValue::Null),
        };
        Output::from_property(value)
    }
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self::from_property(self.value.clone())
    }
}

impl<T> PartialEq for Output<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Debug for Output<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Output({})", self.value)
    }
}

impl<T> IntoProperty for Output<T> {
    fn into_property(self) -> PropertyValue {
        self.value
    }
}

impl<T> IntoProperty for &Output<T> {
    fn into_property(self) -> PropertyValue {
        self.value.clone()
    }
}

impl From<String> for Output<String> {
    fn from(value: String) -> Self {
        Self::from_property(PropertyValue::String(value))
    }
}

impl From<&str> for Output<String> {
    fn from(value: &str) -> Self {
        Self::from_property(PropertyValue::String(value.to_string()))
    }
}

impl From<Secret<String>> for Output<String> {
    fn from(value: Secret<String>) -> Self {
        Self::from_property(value.into_property())
    }
}
