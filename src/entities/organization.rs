//! Organization entity - A venture or catalyzor record created during onboarding.
//!
//! Stored in the `entities` table. The creating user owns it; other users may
//! later be linked to it through `user_entities` without owning it.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed set of organization kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A startup looking for grants
    #[sea_orm(string_value = "venture")]
    Venture,
    /// An accelerator, fund or other catalyst organization
    #[sea_orm(string_value = "catalyzor")]
    Catalyzor,
}

/// One person on an organization's team
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Full name
    pub name: String,
    /// Role or title, e.g. "CTO"
    pub role: String,
    /// Optional contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Ordered team list, persisted as a JSON array
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct TeamMembers(pub Vec<TeamMember>);

/// Organization database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entities")]
pub struct Model {
    /// Generated identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Organization name
    pub name: String,
    /// Venture or catalyzor
    pub kind: EntityKind,
    /// Free-text pitch or description
    pub narrative: String,
    /// Team members in display order
    pub team: TeamMembers,
    /// User who created the record
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between organizations and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One organization has many submissions
    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
    /// One organization has many feature grants
    #[sea_orm(has_many = "super::feature_access::Entity")]
    FeatureAccess,
    /// One organization is linked to many users
    #[sea_orm(has_many = "super::user_entity::Entity")]
    UserEntities,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::feature_access::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeatureAccess.def()
    }
}

impl Related<super::user_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserEntities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
