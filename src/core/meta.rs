//! # Metadata Store
//!
//! Ordered, typed key/value entries carried in a packet header for cross-cutting
//! routing and tracing data.
//!
//! Values are always stored as text; the entry's [`MetaType`] tells readers how
//! to reinterpret them. Entries keep insertion order and duplicate keys are
//! allowed: [`Metadata::get`] returns the first match and [`Metadata::delete`]
//! removes every match.
//!
//! ## Coercion
//! [`Metadata::get`] is lenient: an `int`/`float` entry whose text does not
//! parse decodes to `0` / `0.0`. The failure is logged and counted, never raised.
//! [`Metadata::get_strict`] surfaces the same failure as
//! [`ProtocolError::MetadataCoercion`].
//!
//! ## Wire Tags
//! ```text
//! 0 = string, 1 = int, 2 = float, anything else = preserved, read as string
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ProtocolError, Result};
use crate::utils::metrics::global_metrics;

/// Type tag of a metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum MetaType {
    #[default]
    String,
    Int,
    Float,
    /// Tag outside the known set, kept verbatim so re-encoding is lossless.
    Other(i32),
}

impl From<i32> for MetaType {
    fn from(tag: i32) -> Self {
        match tag {
            0 => MetaType::String,
            1 => MetaType::Int,
            2 => MetaType::Float,
            other => MetaType::Other(other),
        }
    }
}

impl From<MetaType> for i32 {
    fn from(kind: MetaType) -> Self {
        match kind {
            MetaType::String => 0,
            MetaType::Int => 1,
            MetaType::Float => 2,
            MetaType::Other(tag) => tag,
        }
    }
}

impl MetaType {
    fn name(self) -> &'static str {
        match self {
            MetaType::Int => "int",
            MetaType::Float => "float",
            MetaType::String | MetaType::Other(_) => "string",
        }
    }
}

/// A single key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: MetaType,
}

impl MetaEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, kind: MetaType) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            kind,
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, value, MetaType::String)
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, value.to_string(), MetaType::Int)
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, value.to_string(), MetaType::Float)
    }

    /// Decode the value per its tag, surfacing parse failures.
    pub fn decode(&self) -> Result<MetaValue> {
        let coercion = |expected| ProtocolError::MetadataCoercion {
            key: self.key.clone(),
            value: self.value.clone(),
            expected,
        };

        match self.kind {
            MetaType::Int => self
                .value
                .parse::<i64>()
                .map(MetaValue::Int)
                .map_err(|_| coercion("int")),
            MetaType::Float => self
                .value
                .parse::<f64>()
                .map(MetaValue::Float)
                .map_err(|_| coercion("float")),
            MetaType::String | MetaType::Other(_) => Ok(MetaValue::Str(self.value.clone())),
        }
    }

    /// Decode the value per its tag, degrading parse failures to zero.
    pub fn decode_lenient(&self) -> MetaValue {
        match self.decode() {
            Ok(value) => value,
            Err(err) => {
                global_metrics().meta_coercion_failure();
                warn!(key = %self.key, kind = self.kind.name(), error = %err, "Metadata coercion failed, using zero value");
                match self.kind {
                    MetaType::Float => MetaValue::Float(0.0),
                    _ => MetaValue::Int(0),
                }
            }
        }
    }
}

/// A decoded metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            MetaValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// Ordered metadata entries of a header.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Vec<MetaEntry>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries, keeping insertion order.
    pub fn add<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = MetaEntry>,
    {
        self.0.extend(entries);
    }

    pub fn add_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push(MetaEntry::string(key, value));
    }

    pub fn add_int(&mut self, key: impl Into<String>, value: i64) {
        self.0.push(MetaEntry::int(key, value));
    }

    pub fn add_float(&mut self, key: impl Into<String>, value: f64) {
        self.0.push(MetaEntry::float(key, value));
    }

    /// First entry with `key`, decoded leniently. `None` means no entry matched.
    pub fn get(&self, key: &str) -> Option<MetaValue> {
        self.entry(key).map(MetaEntry::decode_lenient)
    }

    /// First entry with `key`, failing if its text does not match its tag.
    pub fn get_strict(&self, key: &str) -> Result<Option<MetaValue>> {
        self.entry(key).map(MetaEntry::decode).transpose()
    }

    /// Undecoded text of the first entry with `key`.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|m| m.value.as_str())
    }

    pub fn entry(&self, key: &str) -> Option<&MetaEntry> {
        self.0.iter().find(|m| m.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// Remove every entry with `key`; the rest keep their relative order.
    pub fn delete(&mut self, key: &str) {
        self.0.retain(|m| m.key != key);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetaEntry> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[MetaEntry] {
        &self.0
    }
}

impl From<Vec<MetaEntry>> for Metadata {
    fn from(entries: Vec<MetaEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<MetaEntry> for Metadata {
    fn from_iter<I: IntoIterator<Item = MetaEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = &'a MetaEntry;
    type IntoIter = std::slice::Iter<'a, MetaEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
