//! Ordered userscript metadata record.
//!
//! Userscript headers are order-sensitive for readers, so the record keeps the
//! insertion order of its keys. Replacing a value keeps the key in its
//! original slot and new keys are appended, which gives overrides the same
//! layering semantics as a shallow object merge.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value stored for a single metadata field.
///
/// # Examples
///
/// ```
/// use userscript_bundler::MetadataValue;
///
/// let value: MetadataValue = serde_yaml::from_str("[a, b]",).expect("valid value",);
/// assert_eq!(value, MetadataValue::List(vec!["a".to_owned(), "b".to_owned()]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize,)]
#[serde(untagged)]
pub enum MetadataValue
{
    /// Explicitly unset. Never rendered, but still replaces a default when
    /// used as an override.
    #[default]
    Absent,
    /// Single value rendered on one line.
    Scalar(String,),
    /// Repeatable field rendered as one line per element.
    List(Vec<String,>,),
    /// Directive written without a value, such as `@noframes`. Produced by
    /// header parsing only.
    #[serde(skip)]
    Flag,
}

impl MetadataValue
{
    /// Builds a scalar value from an optional string, mapping `None` to
    /// [`MetadataValue::Absent`].
    pub fn from_option(value: Option<String,>,) -> Self
    {
        value.map_or(Self::Absent, Self::Scalar,)
    }

    /// Returns the first non-blank value, trimmed.
    pub fn first(&self,) -> Option<&str,>
    {
        self.values().next()
    }

    /// Iterates over the non-blank values, trimmed, in order.
    pub fn values(&self,) -> impl Iterator<Item = &str,>
    {
        let slice: &[String] = match self {
            Self::Absent | Self::Flag => &[],
            Self::Scalar(value,) => std::slice::from_ref(value,),
            Self::List(values,) => values,
        };
        slice.iter().map(|value| value.trim(),).filter(|value| !value.is_empty(),)
    }

    /// Reports whether at least one non-blank value is present.
    pub fn is_set(&self,) -> bool
    {
        self.first().is_some()
    }

    /// Reports whether the value produces at least one header line.
    pub fn emits(&self,) -> bool
    {
        matches!(self, Self::Flag) || self.is_set()
    }
}

impl From<&str,> for MetadataValue
{
    fn from(value: &str,) -> Self
    {
        Self::Scalar(value.to_owned(),)
    }
}

impl From<String,> for MetadataValue
{
    fn from(value: String,) -> Self
    {
        Self::Scalar(value,)
    }
}

impl From<Vec<String,>,> for MetadataValue
{
    fn from(values: Vec<String,>,) -> Self
    {
        Self::List(values,)
    }
}

/// Ordered mapping from field name to [`MetadataValue`].
///
/// # Examples
///
/// ```
/// use userscript_bundler::{MetadataRecord, MetadataValue};
///
/// let mut record = MetadataRecord::new();
/// record.insert("name", "Demo",);
/// record.insert("version", "1.0.0",);
/// record.insert("name", "Renamed",);
///
/// let keys: Vec<&str,> = record.keys().collect();
/// assert_eq!(keys, ["name", "version"]);
/// assert_eq!(record.get("name"), Some(&MetadataValue::from("Renamed")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize,)]
#[serde(transparent)]
pub struct MetadataRecord
{
    fields: IndexMap<String, MetadataValue,>,
}

impl MetadataRecord
{
    /// Creates an empty record.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Inserts or replaces a field, keeping the position of existing keys.
    pub fn insert<K, V,>(&mut self, key: K, value: V,)
    where
        K: Into<String,>,
        V: Into<MetadataValue,>,
    {
        self.fields.insert(key.into(), value.into(),);
    }

    /// Returns the value stored for `key`, if any.
    pub fn get(&self, key: &str,) -> Option<&MetadataValue,>
    {
        self.fields.get(key,)
    }

    /// Returns a mutable reference to the value stored for `key`, if any.
    pub fn get_mut(&mut self, key: &str,) -> Option<&mut MetadataValue,>
    {
        self.fields.get_mut(key,)
    }

    /// Reports whether `key` carries at least one non-blank value.
    pub fn is_set(&self, key: &str,) -> bool
    {
        self.get(key,).is_some_and(MetadataValue::is_set,)
    }

    /// Layers `overrides` on top of this record, key by key.
    ///
    /// Override values replace the existing value wholesale; list values are
    /// never merged element-wise.
    pub fn merge(&mut self, overrides: &MetadataRecord,)
    {
        for (key, value,) in overrides.iter() {
            self.fields.insert(key.to_owned(), value.clone(),);
        }
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self,) -> impl Iterator<Item = (&str, &MetadataValue,),>
    {
        self.fields.iter().map(|(key, value,)| (key.as_str(), value,),)
    }

    /// Iterates over field names in insertion order.
    pub fn keys(&self,) -> impl Iterator<Item = &str,>
    {
        self.fields.keys().map(String::as_str,)
    }

    /// Number of fields, including absent ones.
    pub fn len(&self,) -> usize
    {
        self.fields.len()
    }

    /// Reports whether the record has no fields at all.
    pub fn is_empty(&self,) -> bool
    {
        self.fields.is_empty()
    }
}
