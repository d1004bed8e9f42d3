//! Waitlist entity - Pre-launch registrations sharing the main store.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Waitlist registration model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "waitlist")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Lowercased email, unique across the list
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    /// What the registrant is interested in, free text
    pub note: Option<String>,
    pub registered_at: DateTimeUtc,
}

/// `Waitlist` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
