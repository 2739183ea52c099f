//! Field whitelists
//!
//! A [`FieldSpec`] names, in order, the fields of a record that go into a
//! response. Nothing outside the list is ever serialized.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::SerializationError;
use crate::record::Record;

/// Ordered, non-empty, duplicate-free list of field names
///
/// # Example
///
/// ```rust
/// use acton_envelope::FieldSpec;
/// use serde_json::json;
///
/// let fields = FieldSpec::new(["id", "name"]).unwrap();
/// let record = json!({"id": 5, "name": "x", "password_hash": "..."});
///
/// let data = fields.extract(&record).unwrap();
/// assert_eq!(serde_json::Value::Object(data), json!({"id": 5, "name": "x"}));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    names: Vec<String>,
}

impl FieldSpec {
    /// Build a whitelist, rejecting empty and duplicated lists
    pub fn new<I, S>(names: I) -> Result<Self, SerializationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(SerializationError::EmptyFieldSpec);
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(SerializationError::DuplicateField(name.clone()));
            }
        }

        Ok(Self { names })
    }

    /// Field names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over the field names
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `name` is whitelisted
    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|field| field == name)
    }

    /// Extract the whitelisted fields of `record`, keys in list order
    ///
    /// Fails on the first field that is missing or not representable as JSON;
    /// no partial mapping is returned.
    pub fn extract<R: Record + ?Sized>(
        &self,
        record: &R,
    ) -> Result<Map<String, Value>, SerializationError> {
        let mut data = Map::with_capacity(self.names.len());
        for name in &self.names {
            let value = record
                .read_field(name)
                .ok_or_else(|| SerializationError::MissingField(name.clone()))?
                .map_err(|source| SerializationError::InvalidValue {
                    field: name.clone(),
                    source,
                })?;
            data.insert(name.clone(), value);
        }
        Ok(data)
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(","))
    }
}

impl TryFrom<&[&str]> for FieldSpec {
    type Error = SerializationError;

    fn try_from(names: &[&str]) -> Result<Self, Self::Error> {
        Self::new(names.iter().copied())
    }
}

impl TryFrom<Vec<String>> for FieldSpec {
    type Error = SerializationError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl<'a> IntoIterator for &'a FieldSpec {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
