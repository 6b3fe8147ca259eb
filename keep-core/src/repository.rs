use async_trait::async_trait;

use crate::context::RequestContext;
use crate::entity::Entity;
use crate::errors::KeepResult;
use crate::page::{Page, PageRequest};
use crate::patch::UpdateMap;
use crate::query::QueryConstraint;

/// Typed access to one collection of `T` records.
///
/// - `get_all`      → every record, identifier ascending, paged
/// - `get_by_id`    → one record, `NotFound` if absent
/// - `get_by_query` → AND of constraints, identifier ascending, paged
/// - `create`       → store `T` under `id` (replaces an existing record)
/// - `update`       → merge an [`UpdateMap`] into an existing record
/// - `delete`       → remove one record, `NotFound` if absent
///
/// Records that do not decode as `T` fail with `DataShape`; transport
/// failures surface as `Unavailable`. Every call honours the deadline in
/// the [`RequestContext`].
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Collection name, used in error context.
    fn collection(&self) -> &str;

    async fn get_all(&self, ctx: &RequestContext, page: PageRequest) -> KeepResult<Page<T>>;

    async fn get_by_id(&self, ctx: &RequestContext, id: &str) -> KeepResult<T>;

    /// A page token is resolved by reading that record first; if it no
    /// longer exists the call fails with `NotFound`.
    async fn get_by_query(
        &self,
        ctx: &RequestContext,
        constraints: &[QueryConstraint],
        page: PageRequest,
    ) -> KeepResult<Page<T>>;

    /// Writes `entity` under `id` and returns what the store now holds,
    /// including the server-stamped `CREATED_AT`/`UPDATED_AT` fields.
    async fn create(&self, ctx: &RequestContext, id: &str, entity: &T) -> KeepResult<T>;

    /// Fields not in `update` are left alone; nested maps merge field-wise.
    async fn update(&self, ctx: &RequestContext, id: &str, update: UpdateMap) -> KeepResult<T>;

    async fn delete(&self, ctx: &RequestContext, id: &str) -> KeepResult<()>;
}
