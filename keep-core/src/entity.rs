use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record type a [`Repository`](crate::Repository) can hold.
///
/// The persisted shape is the entity's serde form. Field names in
/// [`QueryConstraint`](crate::QueryConstraint)s and update maps refer to
/// the serialized names, not the Rust field names.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    /// Field stamped by the store when the record is created.
    const CREATED_AT: Option<&'static str> = None;

    /// Field stamped by the store on create and whenever an update asks for it.
    const UPDATED_AT: Option<&'static str> = None;

    /// The record identifier. Immutable once assigned.
    fn id(&self) -> &str;
}
