//! Property values flowing between declared resources
//!
//! A [`PropertyValue`] is either fully known, a reference to another node's
//! not-yet-resolved output ([`OutputRef`]), or a tree mixing both. Secrets
//! are carried as a distinct variant so the marking survives resolution and
//! every rendering can redact them.

use crate::secret::{Secret, REDACTED};
use crate::types::NodeId;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// One step into a nested property
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, ".{key}"),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Reference to an output field of a declared node
///
/// `field` names one of the node's declared outputs; `path` then walks into
/// the field's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub node: NodeId,
    pub field: String,
    pub path: Vec<PathSegment>,
}

impl OutputRef {
    #[inline]
    pub fn new(node: NodeId, field: impl Into<String>) -> Self {
        Self {
            node,
            field: field.into(),
            path: Vec::new(),
        }
    }

    /// Extend the path by one segment
    #[must_use]
    pub fn join(&self, segment: PathSegment) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self {
            node: self.node,
            field: self.field.clone(),
            path,
        }
    }
}

impl Display for OutputRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.field)?;
        for segment in &self.path {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// A declared or resolved resource property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<PropertyValue>),
    Object(BTreeMap<String, PropertyValue>),
    Secret(Secret<Box<PropertyValue>>),
    Output(OutputRef),
}

impl PropertyValue {
    /// Wrap a value as secret (idempotent)
    #[must_use]
    pub fn secret(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Secret(_) => value,
            other => PropertyValue::Secret(Secret::new(Box::new(other))),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Object member lookup (does not look through secrets)
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        match self {
            PropertyValue::Object(members) => members.get(key),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_secret(&self) -> bool {
        matches!(self, PropertyValue::Secret(_))
    }

    /// Whether a secret appears anywhere in this value
    #[must_use]
    pub fn contains_secret(&self) -> bool {
        match self {
            PropertyValue::Secret(_) => true,
            PropertyValue::List(items) => items.iter().any(PropertyValue::contains_secret),
            PropertyValue::Object(members) => members.values().any(PropertyValue::contains_secret),
            _ => false,
        }
    }

    /// Whether no output reference remains
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.output_refs().is_empty()
    }

    /// Every output reference inside this value, in traversal order
    #[must_use]
    pub fn output_refs(&self) -> Vec<&OutputRef> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, refs: &mut Vec<&'a OutputRef>) {
        match self {
            PropertyValue::Output(output) => refs.push(output),
            PropertyValue::List(items) => items.iter().for_each(|item| item.collect_refs(refs)),
            PropertyValue::Object(members) => {
                members.values().for_each(|member| member.collect_refs(refs));
            }
            PropertyValue::Secret(inner) => inner.expose().collect_refs(refs),
            _ => {}
        }
    }

    /// Walk `path` into this value
    ///
    /// Walking through a secret yields a secret, so taint follows the data.
    #[must_use]
    pub fn at_path(&self, path: &[PathSegment]) -> Option<PropertyValue> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self.clone());
        };
        match (self, head) {
            (PropertyValue::Secret(inner), _) => {
                inner.expose().at_path(path).map(PropertyValue::secret)
            }
            (PropertyValue::Object(members), PathSegment::Key(key)) => {
                members.get(key)?.at_path(rest)
            }
            (PropertyValue::List(items), PathSegment::Index(index)) => {
                items.get(*index)?.at_path(rest)
            }
            _ => None,
        }
    }

    /// Replace every output reference using `lookup`
    ///
    /// # Errors
    /// Returns the first reference `lookup` could not satisfy.
    pub fn resolve<F>(&self, lookup: &F) -> Result<PropertyValue, OutputRef>
    where
        F: Fn(&OutputRef) -> Option<PropertyValue>,
    {
        match self {
            PropertyValue::Output(output) => lookup(output).ok_or_else(|| output.clone()),
            PropertyValue::List(items) => items
                .iter()
                .map(|item| item.resolve(lookup))
                .collect::<Result<Vec<_>, _>>()
                .map(PropertyValue::List),
            PropertyValue::Object(members) => members
                .iter()
                .map(|(key, member)| Ok((key.clone(), member.resolve(lookup)?)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(PropertyValue::Object),
            PropertyValue::Secret(inner) => {
                inner.expose().resolve(lookup).map(PropertyValue::secret)
            }
            known => Ok(known.clone()),
        }
    }

    /// Build from plain JSON
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(b),
            Value::Number(n) => PropertyValue::Number(n),
            Value::String(s) => PropertyValue::String(s),
            Value::Array(items) => {
                PropertyValue::List(items.into_iter().map(Self::from_json).collect())
            }
            Value::Object(members) => PropertyValue::Object(
                members
                    .into_iter()
                    .map(|(key, member)| (key, Self::from_json(member)))
                    .collect(),
            ),
        }
    }

    /// JSON rendering with secrets replaced by [`REDACTED`] and outputs
    /// rendered as `<computed #n.field>`
    #[must_use]
    pub fn to_redacted_json(&self) -> serde_json::Value {
        self.to_json(false)
    }

    /// JSON rendering including secret plaintext
    ///
    /// Meant for engine bindings that must hand the value to a provider.
    #[must_use]
    pub fn to_exposed_json(&self) -> serde_json::Value {
        self.to_json(true)
    }

    fn to_json(&self, expose: bool) -> serde_json::Value {
        use serde_json::Value;
        match self {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Number(n) => Value::Number(n.clone()),
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::List(items) => {
                Value::Array(items.iter().map(|item| item.to_json(expose)).collect())
            }
            PropertyValue::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(key, member)| (key.clone(), member.to_json(expose)))
                    .collect(),
            ),
            PropertyValue::Secret(inner) if expose => inner.expose().to_json(expose),
            PropertyValue::Secret(_) => Value::String(REDACTED.to_string()),
            PropertyValue::Output(output) => Value::String(format!("<computed {output}>")),
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_redacted_json())
    }
}

impl Serialize for PropertyValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_redacted_json().serialize(serializer)
    }
}

/// Named inputs or outputs of a resource, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyMap(BTreeMap<String, PropertyValue>);

impl PropertyMap {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl IntoProperty) -> Self {
        self.0.insert(key.into(), value.into_property());
        self
    }

    /// Builder-style insert that skips `None`
    #[must_use]
    pub fn with_opt<V: IntoProperty>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl IntoProperty) {
        self.0.insert(key.into(), value.into_property());
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Every output reference across all values
    #[must_use]
    pub fn output_refs(&self) -> Vec<&OutputRef> {
        self.0.values().flat_map(PropertyValue::output_refs).collect()
    }

    /// Resolve every value, see [`PropertyValue::resolve`]
    ///
    /// # Errors
    /// Returns the first unsatisfied reference.
    pub fn resolve<F>(&self, lookup: &F) -> Result<PropertyMap, OutputRef>
    where
        F: Fn(&OutputRef) -> Option<PropertyValue>,
    {
        self.0
            .iter()
            .map(|(key, value)| Ok((key.clone(), value.resolve(lookup)?)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(PropertyMap)
    }

    /// Redacted JSON object
    #[must_use]
    pub fn to_redacted_json(&self) -> serde_json::Value {
        PropertyValue::Object(self.0.clone()).to_redacted_json()
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PropertyMap {
    type Item = (String, PropertyValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for PropertyMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_redacted_json())
    }
}

/// Conversion into a [`PropertyValue`]
pub trait IntoProperty {
    fn into_property(self) -> PropertyValue;
}

impl IntoProperty for PropertyValue {
    fn into_property(self) -> PropertyValue {
        self
    }
}

impl IntoProperty for PropertyMap {
    fn into_property(self) -> PropertyValue {
        PropertyValue::Object(self.0)
    }
}

impl IntoProperty for String {
    fn into_property(self) -> PropertyValue {
        PropertyValue::String(self)
    }
}

impl IntoProperty for &str {
    fn into_property(self) -> PropertyValue {
        PropertyValue::String(self.to_string())
    }
}

impl IntoProperty for bool {
    fn into_property(self) -> PropertyValue {
        PropertyValue::Bool(self)
    }
}

macro_rules! int_into_property {
    ($($t:ty),*) => {
        $(
            impl IntoProperty for $t {
                fn into_property(self) -> PropertyValue {
                    PropertyValue::Number(serde_json::Number::from(self))
                }
            }
        )*
    };
}

int_into_property!(u16, u32, u64, i32, i64);

impl<T: IntoProperty> IntoProperty for Vec<T> {
    fn into_property(self) -> PropertyValue {
        PropertyValue::List(self.into_iter().map(IntoProperty::into_property).collect())
    }
}

impl<T: IntoProperty> IntoProperty for Option<T> {
    fn into_property(self) -> PropertyValue {
        self.map_or(PropertyValue::Null, IntoProperty::into_property)
    }
}

impl<T: IntoProperty> IntoProperty for BTreeMap<String, T> {
    fn into_property(self) -> PropertyValue {
        PropertyValue::Object(
            self.into_iter()
                .map(|(key, value)| (key, value.into_property()))
                .collect(),
        )
    }
}

impl<T: IntoProperty> IntoProperty for Secret<T> {
    fn into_property(self) -> PropertyValue {
        PropertyValue::secret(self.into_inner().into_property())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cert_ref() -> OutputRef {
        OutputRef::new(NodeId(1), "domainValidationOptions")
    }

    #[test]
    fn property_map_builder_orders_keys() {
        let map = PropertyMap::new()
            .with("ttl", 60u32)
            .with("name", "www")
            .with_opt("zoneId", None::<String>);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["name", "ttl"]);
        assert_eq!(map.get("ttl").and_then(PropertyValue::as_i64), Some(60));
    }

    #[test]
    fn secrets_are_redacted_in_every_rendering() {
        let map = PropertyMap::new().with("zoneId", Secret::new("Z0SECRET".to_string()));
        assert_eq!(map.to_redacted_json(), json!({ "zoneId": REDACTED }));
        assert!(!format!("{map}").contains("Z0SECRET"));
        assert!(!format!("{map:?}").contains("Z0SECRET"));
        assert!(!serde_json::to_string(&map).unwrap().contains("Z0SECRET"));
    }

    #[test]
    fn exposed_json_reveals_secret() {
        let value = PropertyValue::secret("Z0SECRET".into_property());
        assert_eq!(value.to_exposed_json(), json!("Z0SECRET"));
    }

    #[test]
    fn output_refs_found_in_nested_values() {
        let name = PropertyValue::Output(cert_ref().join(PathSegment::Index(0)));
        let map = PropertyMap::new()
            .with("records", vec![name.clone()])
            .with("ttl", 60u32);
        assert_eq!(map.output_refs().len(), 1);
        assert!(!name.is_resolved());
    }

    #[test]
    fn resolve_replaces_references() {
        let reference = cert_ref().join(PathSegment::Index(0));
        let value = PropertyValue::List(vec![PropertyValue::Output(reference.clone())]);

        let resolved = value
            .resolve(&|r: &OutputRef| (r == &reference).then(|| "_abc.example.com.".into_property()))
            .unwrap();
        assert_eq!(resolved, PropertyValue::List(vec!["_abc.example.com.".into_property()]));

        let missing = value.resolve(&|_: &OutputRef| None);
        assert_eq!(missing, Err(reference));
    }

    #[test]
    fn at_path_keeps_secret_taint() {
        let value = PropertyValue::secret(PropertyValue::from_json(json!([{ "zone": "Z1" }])));
        let zone = value
            .at_path(&[PathSegment::Index(0), PathSegment::Key("zone".into())])
            .unwrap();
        assert!(zone.is_secret());
        assert_eq!(zone.to_exposed_json(), json!("Z1"));
    }

    #[test]
    fn at_path_misses_return_none() {
        let value = PropertyValue::from_json(json!({ "a": [1, 2] }));
        assert!(value.at_path(&[PathSegment::Key("b".into())]).is_none());
        assert!(value
            .at_path(&[PathSegment::Key("a".into()), PathSegment::Index(5)])
            .is_none());
    }

    #[test]
    fn computed_outputs_render_as_placeholders() {
        let value = PropertyValue::Output(OutputRef::new(NodeId(4), "arn"));
        assert_eq!(value.to_redacted_json(), json!("<computed #4.arn>"));
    }
}
