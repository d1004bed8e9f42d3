//! User client - user records, entity links and feature access grants.
//!
//! Grants are plain facts keyed by (entity, product, feature). Recording one that
//! already exists is a no-op, and nothing in this crate revokes them.

use crate::{
    entities::{
        FeatureAccess, FeatureAccessColumn, LinkRole, Organization, User, UserEntity,
        UserEntityColumn, feature_access, user, user_entity,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument};

/// Client for user records and the facts attached to them
#[derive(Clone, Copy, Debug)]
pub struct UserClient<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserClient<'a> {
    pub(crate) const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetches a user record, `None` if it does not exist.
    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> Result<Option<user::Model>> {
        User::find_by_id(user_id.to_string())
            .one(self.db)
            .await
            .map_err(Into::into)
    }

    /// Ids of every entity the user owns or references, oldest link first.
    #[instrument(skip(self))]
    pub async fn get_user_entity_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let links = UserEntity::find()
            .filter(UserEntityColumn::UserId.eq(user_id))
            .order_by_asc(UserEntityColumn::LinkedAt)
            .order_by_asc(UserEntityColumn::EntityId)
            .all(self.db)
            .await?;
        debug!("User {} is linked to {} entities.", user_id, links.len());
        Ok(links.into_iter().map(|link| link.entity_id).collect())
    }

    /// Adds an entity to the user's list. Returns `false` if it was already there.
    ///
    /// # Errors
    /// `NotFound` if either the user or the entity does not exist.
    #[instrument(skip(self))]
    pub async fn link_entity(
        &self,
        user_id: &str,
        entity_id: &str,
        role: LinkRole,
    ) -> Result<bool> {
        link_entity_in(self.db, user_id, entity_id, role).await
    }

    /// Records that `entity_id` may use `feature_id` of `product_id`.
    ///
    /// Returns `true` when the grant is new, `false` when it already existed.
    #[instrument(skip(self))]
    pub async fn grant_feature_access(
        &self,
        entity_id: &str,
        product_id: &str,
        feature_id: &str,
    ) -> Result<bool> {
        if self.find_grant(entity_id, product_id, feature_id).await?.is_some() {
            debug!("Grant already present, nothing to record.");
            return Ok(false);
        }

        feature_access::ActiveModel {
            entity_id: Set(entity_id.to_string()),
            product_id: Set(product_id.to_string()),
            feature_id: Set(feature_id.to_string()),
            granted_at: Set(Utc::now()),
        }
        .insert(self.db)
        .await?;

        info!(
            "Granted {}/{} to entity {}.",
            product_id, feature_id, entity_id
        );
        Ok(true)
    }

    /// Whether the entity holds the grant.
    #[instrument(skip(self))]
    pub async fn has_feature_access(
        &self,
        entity_id: &str,
        product_id: &str,
        feature_id: &str,
    ) -> Result<bool> {
        Ok(self
            .find_grant(entity_id, product_id, feature_id)
            .await?
            .is_some())
    }

    /// Every grant the entity holds, oldest first.
    pub async fn list_feature_access(&self, entity_id: &str) -> Result<Vec<feature_access::Model>> {
        FeatureAccess::find()
            .filter(FeatureAccessColumn::EntityId.eq(entity_id))
            .order_by_asc(FeatureAccessColumn::GrantedAt)
            .order_by_asc(FeatureAccessColumn::ProductId)
            .order_by_asc(FeatureAccessColumn::FeatureId)
            .all(self.db)
            .await
            .map_err(Into::into)
    }

    async fn find_grant(
        &self,
        entity_id: &str,
        product_id: &str,
        feature_id: &str,
    ) -> Result<Option<feature_access::Model>> {
        FeatureAccess::find_by_id((
            entity_id.to_string(),
            product_id.to_string(),
            feature_id.to_string(),
        ))
        .one(self.db)
        .await
        .map_err(Into::into)
    }
}

/// Links a user to an entity on any connection or transaction.
pub(crate) async fn link_entity_in<C>(
    db: &C,
    user_id: &str,
    entity_id: &str,
    role: LinkRole,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let user = User::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;
    Organization::find_by_id(entity_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("entity", entity_id))?;

    let existing = UserEntity::find_by_id((user_id.to_string(), entity_id.to_string()))
        .one(db)
        .await?;
    if existing.is_some() {
        debug!("User {} already linked to entity {}.", user_id, entity_id);
        return Ok(false);
    }

    let now = Utc::now();
    user_entity::ActiveModel {
        user_id: Set(user_id.to_string()),
        entity_id: Set(entity_id.to_string()),
        role: Set(role),
        linked_at: Set(now),
    }
    .insert(db)
    .await?;

    let mut user: user::ActiveModel = user.into();
    user.updated_at = Set(now);
    user.update(db).await?;

    info!("Linked user {} to entity {} as {:?}.", user_id, entity_id, role);
    Ok(true)
}
