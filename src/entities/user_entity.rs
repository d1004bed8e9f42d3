//! Link between a user and an entity they own or were given access to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether the user created the entity or only references it
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum LinkRole {
    /// Created the entity during onboarding
    #[sea_orm(string_value = "owner")]
    Owner,
    /// Gained access later
    #[sea_orm(string_value = "member")]
    Member,
}

/// User to entity link model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_entities")]
pub struct Model {
    /// Linked user
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Linked entity
    #[sea_orm(primary_key, auto_increment = false)]
    pub entity_id: String,
    /// Ownership kind
    pub role: LinkRole,
    /// Link creation time, used to keep the user's list ordered
    pub linked_at: DateTimeUtc,
}

/// Each link belongs to one user and one entity
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning side user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Linked entity
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::EntityId",
        to = "super::organization::Column::Id"
    )]
    Organization,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
