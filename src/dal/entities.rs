//! Entity client - venture and catalyzor records.
//!
//! Creating an entity also links it to its owner, in one transaction.

use crate::{
    dal::users::link_entity_in,
    entities::{
        EntityKind, LinkRole, Organization, TeamMember, TeamMembers, User, UserEntity,
        UserEntityColumn, organization,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};
use uuid::Uuid;

/// Fields supplied during onboarding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntity {
    pub name: String,
    pub kind: EntityKind,
    pub narrative: String,
    pub team: Vec<TeamMember>,
}

/// Client for organization records
#[derive(Clone, Copy, Debug)]
pub struct EntityClient<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EntityClient<'a> {
    pub(crate) const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an entity owned by `owner_user_id`.
    ///
    /// # Errors
    /// - `Validation` if the name or a team member's name is blank
    /// - `NotFound` if the owner has no user record
    #[instrument(skip(self, new_entity), fields(name = %new_entity.name))]
    pub async fn create_entity(
        &self,
        owner_user_id: &str,
        new_entity: NewEntity,
    ) -> Result<organization::Model> {
        let name = new_entity.name.trim();
        if name.is_empty() {
            return Err(Error::validation("Entity name cannot be empty"));
        }
        validate_team(&new_entity.team)?;

        User::find_by_id(owner_user_id.to_string())
            .one(self.db)
            .await?
            .ok_or_else(|| Error::not_found("user", owner_user_id))?;

        let now = Utc::now();
        let record = organization::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            kind: Set(new_entity.kind),
            narrative: Set(new_entity.narrative),
            team: Set(TeamMembers(new_entity.team)),
            created_by: Set(owner_user_id.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let txn = self.db.begin().await?;
        let created = record.insert(&txn).await?;
        link_entity_in(&txn, owner_user_id, &created.id, LinkRole::Owner).await?;
        txn.commit().await?;

        info!("Created {:?} entity {} ({}).", created.kind, created.id, created.name);
        Ok(created)
    }

    /// Fetches an entity, `None` if it does not exist.
    pub async fn get_entity(&self, entity_id: &str) -> Result<Option<organization::Model>> {
        Organization::find_by_id(entity_id.to_string())
            .one(self.db)
            .await
            .map_err(Into::into)
    }

    /// Entities the user owns or references, in link order.
    #[instrument(skip(self))]
    pub async fn get_user_entities(&self, user_id: &str) -> Result<Vec<organization::Model>> {
        Organization::find()
            .inner_join(UserEntity)
            .filter(UserEntityColumn::UserId.eq(user_id))
            .order_by_asc(UserEntityColumn::LinkedAt)
            .order_by_asc(organization::Column::Id)
            .all(self.db)
            .await
            .map_err(Into::into)
    }

    /// Replaces the entity's narrative.
    pub async fn update_narrative(
        &self,
        entity_id: &str,
        narrative: &str,
    ) -> Result<organization::Model> {
        let mut record: organization::ActiveModel = self.require(entity_id).await?.into();
        record.narrative = Set(narrative.to_string());
        record.updated_at = Set(Utc::now());
        record.update(self.db).await.map_err(Into::into)
    }

    /// Replaces the team list, keeping the given order.
    #[instrument(skip(self, team), fields(members = team.len()))]
    pub async fn set_team_members(
        &self,
        entity_id: &str,
        team: Vec<TeamMember>,
    ) -> Result<organization::Model> {
        validate_team(&team)?;
        let mut record: organization::ActiveModel = self.require(entity_id).await?.into();
        record.team = Set(TeamMembers(team));
        record.updated_at = Set(Utc::now());
        let updated = record.update(self.db).await?;
        info!("Updated team of entity {}.", entity_id);
        Ok(updated)
    }

    async fn require(&self, entity_id: &str) -> Result<organization::Model> {
        self.get_entity(entity_id)
            .await?
            .ok_or_else(|| Error::not_found("entity", entity_id))
    }
}

fn validate_team(team: &[TeamMember]) -> Result<()> {
    if team.iter().any(|member| member.name.trim().is_empty()) {
        return Err(Error::validation("Team member name cannot be empty"));
    }
    Ok(())
}
