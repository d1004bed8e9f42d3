//! User entity - A person who signed up or signed in at least once.
//!
//! The list of entities a user owns or references lives in `user_entities`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Same identifier as the user's identity record
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Contact email, lowercased
    pub email: String,
    /// Name shown in the product
    pub display_name: String,
    /// When the record was created (first sign-in or sign-up)
    pub created_at: DateTimeUtc,
    /// Last time entities or profile data changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many entity links
    #[sea_orm(has_many = "super::user_entity::Entity")]
    UserEntities,
}

impl Related<super::user_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserEntities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
