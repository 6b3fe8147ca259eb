use std::sync::Arc;

use keep_core::{
    IntoUpdateMap, KeepError, KeepResult, Page, PageRequest, QueryConstraint, Repository,
    RequestContext,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::users_shared::{NewUser, User, UserPatch, EXTERNAL_ID_FIELD};

/// Account records.
#[derive(Clone)]
pub struct UsersService {
    repo: Arc<dyn Repository<User>>,
}

impl UsersService {
    pub fn new(repo: Arc<dyn Repository<User>>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id))]
    pub async fn get_by_id(&self, ctx: &RequestContext, id: &str) -> KeepResult<User> {
        self.repo
            .get_by_id(ctx, id)
            .await
            .map_err(|err| err.wrap("failed to get user by ID"))
    }

    /// The user linked to a federated identity.
    ///
    /// At most one record is assumed to carry a given identity; the first
    /// in identifier order wins if that ever stops being true. A blank
    /// identity is rejected, since unlinked users store it empty.
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id))]
    pub async fn get_by_external_id(
        &self,
        ctx: &RequestContext,
        external_id: &str,
    ) -> KeepResult<User> {
        if external_id.trim().is_empty() {
            return Err(KeepError::invalid_argument("external ID must not be blank"));
        }
        let constraints = [QueryConstraint::equal(EXTERNAL_ID_FIELD, external_id)];
        let page = self
            .repo
            .get_by_query(ctx, &constraints, PageRequest::first(1))
            .await
            .map_err(|err| err.wrap("failed to get user by external ID"))?;

        page.items
            .into_iter()
            .next()
            .ok_or_else(|| KeepError::not_found("user not found"))
    }

    pub async fn list(&self, ctx: &RequestContext, page: PageRequest) -> KeepResult<Page<User>> {
        self.repo
            .get_all(ctx, page)
            .await
            .map_err(|err| err.wrap("failed to list users"))
    }

    #[instrument(skip(self, ctx, user), fields(request_id = %ctx.request_id))]
    pub async fn create(&self, ctx: &RequestContext, user: NewUser) -> KeepResult<User> {
        let id = Uuid::new_v4().to_string();
        let created = self
            .repo
            .create(ctx, &id, &user.into_user(id.clone()))
            .await
            .map_err(|err| err.wrap("failed to create user"))?;
        info!(user_id = %created.id, "user created");
        Ok(created)
    }

    /// Apply `patch` to an existing user.
    ///
    /// A patch that changes nothing returns the stored record without a write.
    #[instrument(skip(self, ctx, patch), fields(request_id = %ctx.request_id))]
    pub async fn update(&self, ctx: &RequestContext, id: &str, patch: &UserPatch) -> KeepResult<User> {
        let current = self.get_by_id(ctx, id).await?;

        let mut update = patch.to_update_map()?;
        if update.is_empty() {
            return Ok(current);
        }
        update.server_timestamp("updated_at");

        self.repo
            .update(ctx, id, update)
            .await
            .map_err(|err| err.wrap("failed to update user"))
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id))]
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> KeepResult<()> {
        self.repo
            .delete(ctx, id)
            .await
            .map_err(|err| err.wrap("failed to delete user"))?;
        info!(user_id = id, "user deleted");
        Ok(())
    }
}
