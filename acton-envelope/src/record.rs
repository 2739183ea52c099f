//! Name-addressable records
//!
//! A [`Record`] is anything that can hand out a JSON value for a field name.
//! Plain structs get a [`FieldTable`]: an accessor function per field,
//! built once and looked up by name, so serialization never reflects over
//! the type and can only reach fields that were registered.
//!
//! # Example
//!
//! ```rust
//! use acton_envelope::{impl_record, FieldSpec, Record};
//!
//! struct Task {
//!     id: u64,
//!     title: String,
//!     owner_token: String,
//! }
//!
//! // `owner_token` is never registered, so it can never be serialized.
//! impl_record!(Task { id, title });
//!
//! let task = Task { id: 5, title: "x".into(), owner_token: "secret".into() };
//! let fields = FieldSpec::new(["id", "title"]).unwrap();
//! let data = fields.extract(&task).unwrap();
//! assert_eq!(data["id"], 5);
//! assert!(task.read_field("owner_token").is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{self, Error as _, Serialize};
use serde_json::{Map, Value};

/// A value with readable named fields
pub trait Record {
    /// Read a field by name
    ///
    /// Returns `None` when the record has no such field, and `Some(Err(..))`
    /// when the field exists but its value cannot be converted to JSON.
    fn read_field(&self, name: &str) -> Option<serde_json::Result<Value>>;
}

impl<R: Record + ?Sized> Record for &R {
    fn read_field(&self, name: &str) -> Option<serde_json::Result<Value>> {
        (**self).read_field(name)
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn read_field(&self, name: &str) -> Option<serde_json::Result<Value>> {
        (**self).read_field(name)
    }
}

impl<R: Record + ?Sized> Record for Arc<R> {
    fn read_field(&self, name: &str) -> Option<serde_json::Result<Value>> {
        (**self).read_field(name)
    }
}

impl Record for Map<String, Value> {
    fn read_field(&self, name: &str) -> Option<serde_json::Result<Value>> {
        self.get(name).cloned().map(Ok)
    }
}

/// Only JSON objects have fields
impl Record for Value {
    fn read_field(&self, name: &str) -> Option<serde_json::Result<Value>> {
        self.as_object().and_then(|object| object.read_field(name))
    }
}

type Accessor<R> = Box<dyn Fn(&R) -> serde_json::Result<Value> + Send + Sync>;

/// Accessor table for a record type, indexed by field name
///
/// Usually stored in a lazily initialised static and consulted from a
/// [`Record`] implementation. [`impl_record!`](crate::impl_record) writes
/// both for you.
///
/// # Example
///
/// ```rust
/// use acton_envelope::{FieldTable, Record};
/// use once_cell::sync::Lazy;
///
/// struct User {
///     id: u64,
///     first: String,
///     last: String,
/// }
///
/// static USER_FIELDS: Lazy<FieldTable<User>> = Lazy::new(|| {
///     FieldTable::new()
///         .field("id", |u: &User| u.id)
///         .field_ref("first", |u: &User| &u.first)
///         .field("full_name", |u: &User| format!("{} {}", u.first, u.last))
/// });
///
/// impl Record for User {
///     fn read_field(&self, name: &str) -> Option<serde_json::Result<serde_json::Value>> {
///         USER_FIELDS.read(self, name)
///     }
/// }
///
/// let user = User { id: 1, first: "Ada".into(), last: "Lovelace".into() };
/// let name = user.read_field("full_name").unwrap().unwrap();
/// assert_eq!(name, "Ada Lovelace");
/// ```
pub struct FieldTable<R> {
    entries: Vec<(&'static str, Accessor<R>)>,
    index: HashMap<&'static str, usize>,
}

impl<R: 'static> FieldTable<R> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a field computed from the record
    ///
    /// Registering a name twice replaces the earlier accessor.
    #[must_use]
    pub fn field<T, F>(self, name: &'static str, accessor: F) -> Self
    where
        T: Serialize + 'static,
        F: Fn(&R) -> T + Send + Sync + 'static,
    {
        self.insert(
            name,
            Box::new(move |record: &R| to_json(&accessor(record))),
        )
    }

    /// Register a field borrowed from the record
    #[must_use]
    pub fn field_ref<T, F>(self, name: &'static str, accessor: F) -> Self
    where
        T: Serialize + ?Sized + 'static,
        F: Fn(&R) -> &T + Send + Sync + 'static,
    {
        self.insert(
            name,
            Box::new(move |record: &R| to_json(accessor(record))),
        )
    }

    fn insert(mut self, name: &'static str, accessor: Accessor<R>) -> Self {
        match self.index.get(name) {
            Some(&position) => self.entries[position].1 = accessor,
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push((name, accessor));
            }
        }
        self
    }
}

impl<R> FieldTable<R> {
    /// Read `name` off `record` through its registered accessor
    pub fn read(&self, record: &R, name: &str) -> Option<serde_json::Result<Value>> {
        let position = *self.index.get(name)?;
        self.entries
            .get(position)
            .map(|(_, accessor)| accessor(record))
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Number of registered fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: 'static> Default for FieldTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for FieldTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTable")
            .field("fields", &self.entries.iter().map(|(name, _)| *name).collect::<Vec<_>>())
            .finish()
    }
}

/// Convert a value to JSON, rejecting NaN and infinite floats
///
/// `serde_json::to_value` writes non-finite floats as `null`; here they are
/// an error, wherever they sit in the value.
pub(crate) fn to_json<T>(value: &T) -> serde_json::Result<Value>
where
    T: Serialize + ?Sized,
{
    value.serialize(FiniteCheck)?;
    serde_json::to_value(value)
}

/// Walks a value and fails on the first non-finite float
struct FiniteCheck;

type CheckResult = std::result::Result<(), serde_json::Error>;

fn check_float(value: f64) -> CheckResult {
    if value.is_finite() {
        Ok(())
    } else {
        Err(serde_json::Error::custom(format!(
            "{} is not representable as a JSON number",
            value
        )))
    }
}

impl ser::Serializer for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> CheckResult {
        Ok(())
    }

    fn serialize_i8(self, _: i8) -> CheckResult {
        Ok(())
    }

    fn serialize_i16(self, _: i16) -> CheckResult {
        Ok(())
    }

    fn serialize_i32(self, _: i32) -> CheckResult {
        Ok(())
    }

    fn serialize_i64(self, _: i64) -> CheckResult {
        Ok(())
    }

    fn serialize_i128(self, _: i128) -> CheckResult {
        Ok(())
    }

    fn serialize_u8(self, _: u8) -> CheckResult {
        Ok(())
    }

    fn serialize_u16(self, _: u16) -> CheckResult {
        Ok(())
    }

    fn serialize_u32(self, _: u32) -> CheckResult {
        Ok(())
    }

    fn serialize_u64(self, _: u64) -> CheckResult {
        Ok(())
    }

    fn serialize_u128(self, _: u128) -> CheckResult {
        Ok(())
    }

    fn serialize_f32(self, value: f32) -> CheckResult {
        check_float(f64::from(value))
    }

    fn serialize_f64(self, value: f64) -> CheckResult {
        check_float(value)
    }

    fn serialize_char(self, _: char) -> CheckResult {
        Ok(())
    }

    fn serialize_str(self, _: &str) -> CheckResult {
        Ok(())
    }

    fn serialize_bytes(self, _: &[u8]) -> CheckResult {
        Ok(())
    }

    fn serialize_none(self) -> CheckResult {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_unit(self) -> CheckResult {
        Ok(())
    }

    fn serialize_unit_struct(self, _: &'static str) -> CheckResult {
        Ok(())
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> CheckResult {
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> serde_json::Result<Self> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> serde_json::Result<Self> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> serde_json::Result<Self> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> serde_json::Result<Self> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> serde_json::Result<Self> {
        Ok(self)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> serde_json::Result<Self> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> serde_json::Result<Self> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> CheckResult {
        key.serialize(FiniteCheck)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, _: &'static str, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, _: &'static str, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

/// Implement [`Record`] for a struct by listing its readable fields
///
/// Each listed field is registered under its own name in a static
/// [`FieldTable`]. Fields that are not listed cannot be serialized.
///
/// ```rust
/// use acton_envelope::{impl_record, Record};
///
/// struct Tag {
///     id: i32,
///     label: String,
/// }
///
/// impl_record!(Tag { id, label });
///
/// let tag = Tag { id: 3, label: "urgent".into() };
/// assert_eq!(tag.read_field("label").unwrap().unwrap(), "urgent");
/// assert!(tag.read_field("color").is_none());
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::Record for $ty {
            fn read_field(
                &self,
                name: &str,
            ) -> ::std::option::Option<
                $crate::__private::serde_json::Result<$crate::__private::serde_json::Value>,
            > {
                static FIELDS: $crate::__private::Lazy<$crate::FieldTable<$ty>> =
                    $crate::__private::Lazy::new(|| {
                        $crate::FieldTable::new()
                            $(.field_ref(::std::stringify!($field), |record: &$ty| &record.$field))+
                    });
                FIELDS.read(self, name)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    struct Task {
        id: u64,
        title: String,
        done: bool,
        tags: Vec<String>,
        #[allow(dead_code)]
        secret: String,
    }

    crate::impl_record!(Task { id, title, done, tags });

    struct BadKeys {
        scores: BTreeMap<(u8, u8), u32>,
    }

    crate::impl_record!(BadKeys { scores });

    fn task() -> Task {
        Task {
            id: 5,
            title: "x".to_string(),
            done: false,
            tags: vec!["a".to_string(), "b".to_string()],
            secret: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_impl_record_reads_registered_fields() {
        let task = task();
        assert_eq!(task.read_field("id").unwrap().unwrap(), json!(5));
        assert_eq!(task.read_field("title").unwrap().unwrap(), json!("x"));
        assert_eq!(task.read_field("done").unwrap().unwrap(), json!(false));
        assert_eq!(task.read_field("tags").unwrap().unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_impl_record_hides_unlisted_fields() {
        assert!(task().read_field("secret").is_none());
        assert!(task().read_field("missing").is_none());
    }

    #[test]
    fn test_non_string_map_keys_are_rejected() {
        let mut scores = BTreeMap::new();
        scores.insert((1, 2), 3);
        let record = BadKeys { scores };
        assert!(record.read_field("scores").unwrap().is_err());
    }

    #[test]
    fn test_non_finite_floats_are_rejected() {
        let table: FieldTable<Task> = FieldTable::new()
            .field("nan", |_: &Task| f64::NAN)
            .field("ratio", |_: &Task| f32::INFINITY)
            .field("samples", |_: &Task| vec![Some(1.5), Some(f64::NEG_INFINITY)])
            .field("finite", |_: &Task| vec![0.25f64, -3.0]);

        let task = task();
        assert!(table.read(&task, "nan").unwrap().is_err());
        assert!(table.read(&task, "ratio").unwrap().is_err());
        assert!(table.read(&task, "samples").unwrap().is_err());
        assert_eq!(table.read(&task, "finite").unwrap().unwrap(), json!([0.25, -3.0]));
    }

    #[test]
    fn test_to_json_checks_nested_structures() {
        let mut readings = BTreeMap::new();
        readings.insert("a", (1u8, f64::NAN));
        assert!(to_json(&readings).is_err());

        let mut fine = BTreeMap::new();
        fine.insert("a", (1u8, 2.0f64));
        assert_eq!(to_json(&fine).unwrap(), json!({"a": [1, 2.0]}));
    }

    #[test]
    fn test_field_table_order_and_lookup() {
        let table: FieldTable<Task> = FieldTable::new()
            .field("id", |t: &Task| t.id)
            .field_ref("title", |t: &Task| t.title.as_str())
            .field("tag_count", |t: &Task| t.tags.len());

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["id", "title", "tag_count"]);
        assert_eq!(table.len(), 3);
        assert!(table.contains("tag_count"));
        assert!(!table.contains("done"));
        assert_eq!(table.read(&task(), "tag_count").unwrap().unwrap(), json!(2));
    }

    #[test]
    fn test_field_table_replaces_duplicate_name() {
        let table: FieldTable<Task> = FieldTable::new()
            .field("id", |t: &Task| t.id)
            .field("id", |t: &Task| t.id * 10);

        assert_eq!(table.len(), 1);
        assert_eq!(table.read(&task(), "id").unwrap().unwrap(), json!(50));
    }

    #[test]
    fn test_empty_table() {
        let table: FieldTable<Task> = FieldTable::default();
        assert!(table.is_empty());
        assert!(table.read(&task(), "id").is_none());
    }

    #[test]
    fn test_map_record() {
        let value = json!({"id": 1, "name": "Ada"});
        let map = value.as_object().unwrap().clone();
        assert_eq!(map.read_field("name").unwrap().unwrap(), json!("Ada"));
        assert!(map.read_field("email").is_none());
    }

    #[test]
    fn test_value_record_only_objects() {
        assert_eq!(json!({"id": 1}).read_field("id").unwrap().unwrap(), json!(1));
        assert!(json!([1, 2]).read_field("id").is_none());
        assert!(json!("id").read_field("id").is_none());
    }

    #[test]
    fn test_smart_pointer_records() {
        let boxed = Box::new(task());
        assert_eq!(boxed.read_field("id").unwrap().unwrap(), json!(5));

        let shared = Arc::new(task());
        let by_ref = &shared;
        assert_eq!(by_ref.read_field("title").unwrap().unwrap(), json!("x"));
    }

    #[test]
    fn test_debug_lists_names() {
        let table: FieldTable<Task> = FieldTable::new().field("id", |t: &Task| t.id);
        assert_eq!(format!("{:?}", table), r#"FieldTable { fields: ["id"] }"#);
    }
}
