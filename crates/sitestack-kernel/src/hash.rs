//! Content hashing for declared graphs
//!
//! Provides [`ContentHash`], a 32-byte Blake3 digest over the canonical form
//! of a declaration. Secret plaintext never enters the hasher; a secret
//! contributes only a fixed marker, so two graphs that differ only in a
//! secret value share a fingerprint.

use crate::property::{OutputRef, PathSegment, PropertyValue};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte content hash (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| HashError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }
}

impl serde::Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Errors for hash parsing
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Incremental hasher over canonical declaration parts
///
/// Every part is tagged and length-prefixed so adjacent fields cannot run
/// together.
#[derive(Default)]
pub struct Fingerprinter {
    hasher: blake3::Hasher,
}

impl Fingerprinter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn str(&mut self, value: &str) -> &mut Self {
        self.tag(b's');
        self.len(value.len());
        self.hasher.update(value.as_bytes());
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.tag(b'u');
        self.hasher.update(&value.to_le_bytes());
        self
    }

    pub fn property(&mut self, value: &PropertyValue) -> &mut Self {
        match value {
            PropertyValue::Null => self.tag(b'0'),
            PropertyValue::Bool(b) => {
                self.tag(b'b');
                self.hasher.update(&[u8::from(*b)]);
            }
            PropertyValue::Number(n) => {
                self.tag(b'n');
                self.str(&n.to_string());
            }
            PropertyValue::String(s) => {
                self.str(s);
            }
            PropertyValue::List(items) => {
                self.tag(b'l');
                self.len(items.len());
                for item in items {
                    self.property(item);
                }
            }
            PropertyValue::Object(members) => {
                self.tag(b'o');
                self.len(members.len());
                for (key, member) in members {
                    self.str(key);
                    self.property(member);
                }
            }
            PropertyValue::Secret(_) => self.tag(b'x'),
            PropertyValue::Output(output) => self.output_ref(output),
        }
        self
    }

    fn output_ref(&mut self, output: &OutputRef) {
        self.tag(b'r');
        self.u64(u64::from(output.node.0));
        self.str(&output.field);
        self.len(output.path.len());
        for segment in &output.path {
            match segment {
                PathSegment::Key(key) => {
                    self.str(key);
                }
                PathSegment::Index(index) => {
                    self.u64(*index as u64);
                }
            }
        }
    }

    fn tag(&mut self, tag: u8) {
        self.hasher.update(&[tag]);
    }

    fn len(&mut self, len: usize) {
        self.hasher.update(&(len as u64).to_le_bytes());
    }

    #[must_use]
    pub fn finish(&self) -> ContentHash {
        ContentHash(*self.hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::IntoProperty;
    use crate::secret::Secret;

    #[test]
    fn hash_roundtrips_through_hex() {
        let hash = Fingerprinter::new().str("static site").finish();
        let parsed: ContentHash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
        assert_eq!(hash.short().len(), 16);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            "abcd".parse::<ContentHash>(),
            Err(HashError::InvalidLength { actual: 2, .. })
        ));
    }

    #[test]
    fn secret_plaintext_does_not_affect_fingerprint() {
        let a = Secret::new("Z111".to_string()).into_property();
        let b = Secret::new("Z222".to_string()).into_property();
        assert_eq!(
            Fingerprinter::new().property(&a).finish(),
            Fingerprinter::new().property(&b).finish()
        );
    }

    #[test]
    fn adjacent_strings_do_not_collide() {
        let ab = Fingerprinter::new().str("ab").str("c").finish();
        let abc = Fingerprinter::new().str("a").str("bc").finish();
        assert_ne!(ab, abc);
    }
}
