use std::marker::PhantomData;

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use keep_core::{
    Entity, KeepError, KeepResult, Page, PageRequest, QueryConstraint, Repository, RequestContext,
    UpdateMap,
};
use mongodb::Collection;
use tracing::{debug, instrument};

use crate::filter::{id_order, query_filter, ID_FIELD};

fn driver_error(err: mongodb::error::Error) -> KeepError {
    KeepError::unavailable(err.to_string()).with_source(err)
}

fn encode_error(err: bson::ser::Error) -> KeepError {
    KeepError::data_shape(format!("failed to encode record: {err}")).with_source(err)
}

/// Timestamps are stored in their serde form, an RFC 3339 string, so that
/// records read back identically through either backend.
fn server_timestamp(now: DateTime<Utc>) -> KeepResult<Bson> {
    bson::to_bson(&now).map_err(encode_error)
}

/// [`Repository`] over one MongoDB collection.
pub struct MongoRepository<T> {
    collection: Collection<Document>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> MongoRepository<T> {
    pub fn new(collection: Collection<Document>) -> Self {
        Self {
            collection,
            _entity: PhantomData,
        }
    }

    fn name(&self) -> &str {
        self.collection.name()
    }

    fn not_found(&self, id: &str) -> KeepError {
        KeepError::not_found(format!("{} record with id {id} not found", self.name()))
    }

    fn decode(&self, document: Document) -> KeepResult<T> {
        self.decode_keyed(document).map(|(_, item)| item)
    }

    /// Decode a stored document, keeping its `_id` alongside.
    fn decode_keyed(&self, mut document: Document) -> KeepResult<(String, T)> {
        let id = document
            .remove(ID_FIELD)
            .and_then(|id| id.as_str().map(str::to_string))
            .unwrap_or_default();
        let item = bson::from_document(document).map_err(|err| {
            KeepError::data_shape(format!("failed to decode {} record {id}: {err}", self.name()))
                .with_source(err)
        })?;
        Ok((id, item))
    }

    async fn find_page(&self, filter: Document, page: &PageRequest) -> KeepResult<Page<T>> {
        let mut find = self.collection.find(filter).sort(id_order());
        if page.is_limited() {
            find = find.limit(i64::try_from(page.size).unwrap_or(i64::MAX));
        }
        let mut cursor = find.await.map_err(driver_error)?;

        let mut keyed = Vec::new();
        while let Some(document) = cursor.try_next().await.map_err(|err| {
            driver_error(err).wrap(format!("failed to iterate {} records", self.name()))
        })? {
            keyed.push(self.decode_keyed(document)?);
        }
        // The cursor filters on `_id`, so the token must be one too.
        Ok(page.finish(keyed, |(id, _)| id.as_str()).map(|(_, item)| item))
    }

    async fn find_one(&self, id: &str) -> KeepResult<T> {
        let document = self
            .collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(driver_error)?
            .ok_or_else(|| self.not_found(id))?;
        self.decode(document)
    }

    async fn read_all(&self, page: &PageRequest) -> KeepResult<Page<T>> {
        let filter = query_filter(&[], page.token.as_deref())?;
        self.find_page(filter, page).await
    }

    async fn read_matching(
        &self,
        constraints: &[QueryConstraint],
        page: &PageRequest,
    ) -> KeepResult<Page<T>> {
        let filter = query_filter(constraints, page.token.as_deref())?;
        if let Some(token) = page.token.as_deref() {
            let exists = self
                .collection
                .find_one(doc! { "_id": token })
                .projection(doc! { "_id": 1 })
                .await
                .map_err(driver_error)?;
            if exists.is_none() {
                return Err(KeepError::not_found(format!(
                    "page token {token} does not name a {} record",
                    self.name()
                )));
            }
        }
        self.find_page(filter, page).await
    }

    async fn write_new(&self, id: &str, entity: &T) -> KeepResult<T> {
        let mut document = bson::to_document(entity).map_err(encode_error)?;
        let now = server_timestamp(Utc::now())?;
        for field in [T::CREATED_AT, T::UPDATED_AT].into_iter().flatten() {
            document.insert(field, now.clone());
        }
        document.insert(ID_FIELD, id);

        self.collection
            .replace_one(doc! { "_id": id }, document)
            .upsert(true)
            .await
            .map_err(driver_error)?;
        debug!(id, "record stored");
        self.find_one(id).await
    }

    async fn merge(&self, id: &str, update: &UpdateMap) -> KeepResult<T> {
        if update.is_empty() {
            return self.find_one(id).await;
        }
        let mut set = Document::new();
        for (path, value) in update.resolve(Utc::now())? {
            let value: Bson = bson::to_bson(&value).map_err(encode_error)?;
            set.insert(path, value);
        }

        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await
            .map_err(driver_error)?;
        if result.matched_count == 0 {
            return Err(self.not_found(id));
        }
        self.find_one(id).await
    }

    async fn remove(&self, id: &str) -> KeepResult<()> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(driver_error)?;
        if result.deleted_count == 0 {
            return Err(self.not_found(id));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MongoRepository<T> {
    fn collection(&self) -> &str {
        self.name()
    }

    #[instrument(skip(self, ctx), fields(collection = %self.name(), request_id = %ctx.request_id))]
    async fn get_all(&self, ctx: &RequestContext, page: PageRequest) -> KeepResult<Page<T>> {
        ctx.run("get_all", self.read_all(&page))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to list {}", self.name())))
    }

    #[instrument(skip(self, ctx), fields(collection = %self.name(), request_id = %ctx.request_id))]
    async fn get_by_id(&self, ctx: &RequestContext, id: &str) -> KeepResult<T> {
        ctx.run("get_by_id", self.find_one(id))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to get {} by id", self.name())))
    }

    #[instrument(skip(self, ctx, constraints), fields(collection = %self.name(), request_id = %ctx.request_id, constraints = constraints.len()))]
    async fn get_by_query(
        &self,
        ctx: &RequestContext,
        constraints: &[QueryConstraint],
        page: PageRequest,
    ) -> KeepResult<Page<T>> {
        ctx.run("get_by_query", self.read_matching(constraints, &page))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to query {}", self.name())))
    }

    #[instrument(skip(self, ctx, entity), fields(collection = %self.name(), request_id = %ctx.request_id))]
    async fn create(&self, ctx: &RequestContext, id: &str, entity: &T) -> KeepResult<T> {
        ctx.run("create", self.write_new(id, entity))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to create {} record", self.name())))
    }

    #[instrument(skip(self, ctx, update), fields(collection = %self.name(), request_id = %ctx.request_id, fields = update.len()))]
    async fn update(&self, ctx: &RequestContext, id: &str, update: UpdateMap) -> KeepResult<T> {
        ctx.run("update", self.merge(id, &update))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to update {} record", self.name())))
    }

    #[instrument(skip(self, ctx), fields(collection = %self.name(), request_id = %ctx.request_id))]
    async fn delete(&self, ctx: &RequestContext, id: &str) -> KeepResult<()> {
        ctx.run("delete", self.remove(id))
            .await
            .map_err(|err: KeepError| err.wrap(format!("failed to delete {} record", self.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_stored_as_rfc3339_strings() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let Bson::String(stored) = server_timestamp(now).unwrap() else {
            panic!("timestamp was not stored as a string");
        };
        let parsed: DateTime<Utc> = DateTime::parse_from_rfc3339(&stored).unwrap().into();
        assert_eq!(parsed, now);
    }
}
