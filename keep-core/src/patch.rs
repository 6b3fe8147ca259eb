//! Partial updates.
//!
//! A [`Patch<T>`] says what should happen to one field: leave it, set it,
//! or clear it. Patch types collect their fields into an [`UpdateMap`]
//! which a [`Repository`](crate::Repository) merges into the stored record.
//!
//! ```rust
//! use keep_core::{Patch, UpdateMap};
//!
//! let mut address = UpdateMap::new();
//! address.apply("city", &Patch::Set("Leeds".to_string())).unwrap();
//!
//! let mut update = UpdateMap::new();
//! update.apply("phone", &Patch::<String>::Unchanged).unwrap();
//! update.nest("address", address);
//! update.server_timestamp("updated_at");
//!
//! let flat: Vec<String> = update.flatten().into_iter().map(|(k, _)| k).collect();
//! assert_eq!(flat, vec!["address.city", "updated_at"]);
//! ```

use std::collections::btree_map::{self, BTreeMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::errors::KeepResult;

/// Intent for one field of a partial update.
///
/// With serde, an absent field is `Unchanged` (use `#[serde(default)]`),
/// `null` is `Clear` and any other value is `Set`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Set(T),
    /// Reset the field to its type's empty value.
    Clear,
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Patch<U> {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Set(value) => Patch::Set(f(value)),
            Patch::Clear => Patch::Clear,
        }
    }
}

impl<T: Default + PartialEq> Patch<T> {
    /// Zero value means "not provided".
    ///
    /// For callers holding a sparsely populated record where an empty field
    /// was never meant to overwrite anything.
    pub fn from_sparse(value: T) -> Self {
        if value == T::default() {
            Patch::Unchanged
        } else {
            Patch::Set(value)
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Patch::Set(value),
            None => Patch::Unchanged,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Set(value) => value.serialize(serializer),
            Patch::Unchanged | Patch::Clear => serializer.serialize_none(),
        }
    }
}

/// A value in an [`UpdateMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    /// Filled in by the store with its own clock at write time.
    ServerTimestamp,
    /// Merged field by field into the stored nested object.
    Nested(UpdateMap),
}

/// Field name → new value, in field-name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateMap {
    fields: BTreeMap<String, FieldValue>,
}

impl UpdateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, field: K, value: V) -> &mut Self {
        self.fields.insert(field.into(), FieldValue::Value(value.into()));
        self
    }

    /// Add `field` unless the patch leaves it unchanged.
    pub fn apply<K, T>(&mut self, field: K, patch: &Patch<T>) -> KeepResult<&mut Self>
    where
        K: Into<String>,
        T: Serialize + Default,
    {
        let value = match patch {
            Patch::Unchanged => return Ok(self),
            Patch::Set(value) => serde_json::to_value(value)?,
            Patch::Clear => serde_json::to_value(T::default())?,
        };
        self.fields.insert(field.into(), FieldValue::Value(value));
        Ok(self)
    }

    /// Add a nested map, skipped when it carries no fields.
    pub fn nest<K: Into<String>>(&mut self, field: K, nested: UpdateMap) -> &mut Self {
        if !nested.is_empty() {
            self.fields.insert(field.into(), FieldValue::Nested(nested));
        }
        self
    }

    pub fn server_timestamp<K: Into<String>>(&mut self, field: K) -> &mut Self {
        self.fields.insert(field.into(), FieldValue::ServerTimestamp);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    /// Leaf fields as dotted paths. Never yields [`FieldValue::Nested`].
    pub fn flatten(&self) -> Vec<(String, FieldValue)> {
        let mut out = Vec::with_capacity(self.fields.len());
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, FieldValue)>) {
        for (field, value) in &self.fields {
            let path = if prefix.is_empty() {
                field.clone()
            } else {
                format!("{prefix}.{field}")
            };
            match value {
                FieldValue::Nested(nested) => nested.flatten_into(&path, out),
                leaf => out.push((path, leaf.clone())),
            }
        }
    }

    /// Dotted paths with server timestamps replaced by `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> KeepResult<Vec<(String, Value)>> {
        let stamp = serde_json::to_value(now)?;
        Ok(self
            .flatten()
            .into_iter()
            .map(|(path, value)| match value {
                FieldValue::Value(value) => (path, value),
                _ => (path, stamp.clone()),
            })
            .collect())
    }
}

impl<'a> IntoIterator for &'a UpdateMap {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// A patch type that knows its persisted field names.
pub trait IntoUpdateMap {
    fn to_update_map(&self) -> KeepResult<UpdateMap>;
}
