//! Opaque wrapper for sensitive configuration values

use std::fmt::{self, Debug, Display, Formatter};

/// Placeholder printed wherever a secret would otherwise appear
pub const REDACTED: &str = "[secret]";

/// A value that must never reach logs, plans or exports in plain form
///
/// `Debug` and `Display` both print [`REDACTED`]; the only way to read the
/// value is [`Secret::expose`]. Converting a secret into a property wraps it
/// in `PropertyValue::Secret` so the marking survives resolution.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret<T>(T);

impl<T> Secret<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the plain value
    #[inline]
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Debug for Secret<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> Display for Secret<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
