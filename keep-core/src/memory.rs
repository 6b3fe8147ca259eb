//! In-process [`Repository`] backend.
//!
//! Records are held in their serde JSON form, one ordered map per
//! collection, so identifier order and dotted-path merges behave the same
//! as the document store.

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::context::RequestContext;
use crate::entity::Entity;
use crate::errors::{KeepError, KeepResult};
use crate::page::{Page, PageRequest};
use crate::patch::UpdateMap;
use crate::query::{matches_all, QueryConstraint};
use crate::repository::Repository;

type Collection = BTreeMap<String, Map<String, Value>>;

/// Shared storage for any number of [`MemoryRepository`] handles.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON of one stored record.
    pub async fn raw(&self, collection: &str, id: &str) -> Option<Value> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|records| records.get(id))
            .map(|record| Value::Object(record.clone()))
    }

    /// Store raw JSON, bypassing entity encoding.
    pub async fn insert_raw(&self, collection: &str, id: &str, record: Map<String, Value>) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), record);
    }

    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, BTreeMap::len)
    }
}

/// A typed view of one collection in a [`MemoryStore`].
pub struct MemoryRepository<T> {
    store: MemoryStore,
    collection: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new<S: Into<String>>(store: MemoryStore, collection: S) -> Self {
        Self {
            store,
            collection: collection.into(),
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    fn decode(&self, id: &str, record: &Map<String, Value>) -> KeepResult<T> {
        serde_json::from_value(Value::Object(record.clone())).map_err(|err| {
            KeepError::from(err).wrap(format!(
                "failed to decode {} record {id}",
                self.collection
            ))
        })
    }

    fn not_found(&self, id: &str) -> KeepError {
        KeepError::not_found(format!("{} record with id {id} not found", self.collection))
    }

    fn collect_page<'a, I>(&self, records: I, page: &PageRequest) -> KeepResult<Page<T>>
    where
        I: Iterator<Item = (&'a String, &'a Map<String, Value>)>,
    {
        let limit = if page.is_limited() { page.size } else { usize::MAX };
        let keyed = records
            .take(limit)
            .map(|(id, record)| Ok((id.clone(), self.decode(id, record)?)))
            .collect::<KeepResult<Vec<(String, T)>>>()?;
        // The cursor walks storage keys, so the token must be one too.
        Ok(page.finish(keyed, |(id, _)| id.as_str()).map(|(_, item)| item))
    }
}

fn after(token: Option<&str>) -> (Bound<&str>, Bound<&str>) {
    match token {
        Some(token) => (Bound::Excluded(token), Bound::Unbounded),
        None => (Bound::Unbounded, Bound::Unbounded),
    }
}

/// Write `value` at a dotted path, creating intermediate objects.
fn set_path(record: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            record.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = record
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                set_path(child, rest, value);
            }
        }
    }
}

impl<T: Entity> MemoryRepository<T> {
    async fn read_all(&self, page: &PageRequest) -> KeepResult<Page<T>> {
        let collections = self.store.collections.read().await;
        let Some(records) = collections.get(&self.collection) else {
            return Ok(Page::empty());
        };
        let range = records.range::<str, _>(after(page.token.as_deref()));
        self.collect_page(range, page)
    }

    async fn read_one(&self, id: &str) -> KeepResult<T> {
        let collections = self.store.collections.read().await;
        let record = collections
            .get(&self.collection)
            .and_then(|records| records.get(id))
            .ok_or_else(|| self.not_found(id))?;
        self.decode(id, record)
    }

    async fn read_matching(
        &self,
        constraints: &[QueryConstraint],
        page: &PageRequest,
    ) -> KeepResult<Page<T>> {
        for constraint in constraints {
            constraint.validate()?;
        }
        let collections = self.store.collections.read().await;
        let empty = Collection::new();
        let records = collections.get(&self.collection).unwrap_or(&empty);

        if let Some(token) = page.token.as_deref() {
            if !records.contains_key(token) {
                return Err(KeepError::not_found(format!(
                    "page token {token} does not name a {} record",
                    self.collection
                )));
            }
        }

        let matching = records
            .range::<str, _>(after(page.token.as_deref()))
            .filter(|(_, record)| matches_all(constraints, &Value::Object((*record).clone())));
        self.collect_page(matching, page)
    }

    async fn write_new(&self, id: &str, entity: &T) -> KeepResult<T> {
        let Value::Object(mut record) = serde_json::to_value(entity)? else {
            return Err(KeepError::data_shape(format!(
                "{} records must serialize to an object",
                self.collection
            )));
        };
        let now = serde_json::to_value(Utc::now())?;
        for field in [T::CREATED_AT, T::UPDATED_AT].into_iter().flatten() {
            record.insert(field.to_string(), now.clone());
        }

        let created = self.decode(id, &record)?;
        let mut collections = self.store.collections.write().await;
        collections
            .entry(self.collection.clone())
            .or_default()
            .insert(id.to_string(), record);
        debug!(id, "record stored");
        Ok(created)
    }

    async fn merge(&self, id: &str, update: &UpdateMap) -> KeepResult<T> {
        let resolved = update.resolve(Utc::now())?;
        let mut collections = self.store.collections.write().await;
        let record = collections
            .get_mut(&self.collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| self.not_found(id))?;
        for (path, value) in resolved {
            set_path(record, &path, value);
        }
        self.decode(id, record)
    }

    async fn remove(&self, id: &str) -> KeepResult<()> {
        let mut collections = self.store.collections.write().await;
        collections
            .get_mut(&self.collection)
            .and_then(|records| records.remove(id))
            .map(|_| ())
            .ok_or_else(|| self.not_found(id))
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    fn collection(&self) -> &str {
        &self.collection
    }

    #[instrument(skip(self, ctx), fields(collection = %self.collection, request_id = %ctx.request_id))]
    async fn get_all(&self, ctx: &RequestContext, page: PageRequest) -> KeepResult<Page<T>> {
        ctx.run("get_all", self.read_all(&page))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to list {}", self.collection)))
    }

    #[instrument(skip(self, ctx), fields(collection = %self.collection, request_id = %ctx.request_id))]
    async fn get_by_id(&self, ctx: &RequestContext, id: &str) -> KeepResult<T> {
        ctx.run("get_by_id", self.read_one(id))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to get {} by id", self.collection)))
    }

    #[instrument(skip(self, ctx, constraints), fields(collection = %self.collection, request_id = %ctx.request_id, constraints = constraints.len()))]
    async fn get_by_query(
        &self,
        ctx: &RequestContext,
        constraints: &[QueryConstraint],
        page: PageRequest,
    ) -> KeepResult<Page<T>> {
        ctx.run("get_by_query", self.read_matching(constraints, &page))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to query {}", self.collection)))
    }

    #[instrument(skip(self, ctx, entity), fields(collection = %self.collection, request_id = %ctx.request_id))]
    async fn create(&self, ctx: &RequestContext, id: &str, entity: &T) -> KeepResult<T> {
        ctx.run("create", self.write_new(id, entity))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to create {} record", self.collection)))
    }

    #[instrument(skip(self, ctx, update), fields(collection = %self.collection, request_id = %ctx.request_id, fields = update.len()))]
    async fn update(&self, ctx: &RequestContext, id: &str, update: UpdateMap) -> KeepResult<T> {
        ctx.run("update", self.merge(id, &update))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to update {} record", self.collection)))
    }

    #[instrument(skip(self, ctx), fields(collection = %self.collection, request_id = %ctx.request_id))]
    async fn delete(&self, ctx: &RequestContext, id: &str) -> KeepResult<()> {
        ctx.run("delete", self.remove(id))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to delete {} record", self.collection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_paths_merge_into_nested_objects() {
        let mut record = json!({"address": {"city": "Leeds", "street": "Park Row"}})
            .as_object()
            .cloned()
            .unwrap();
        set_path(&mut record, "address.city", json!("York"));
        set_path(&mut record, "phone", json!("+44"));

        assert_eq!(
            Value::Object(record),
            json!({"address": {"city": "York", "street": "Park Row"}, "phone": "+44"})
        );
    }

    #[test]
    fn dotted_paths_create_missing_parents() {
        let mut record = Map::new();
        set_path(&mut record, "address.zip_code", json!("LS1"));
        assert_eq!(Value::Object(record), json!({"address": {"zip_code": "LS1"}}));
    }
}
