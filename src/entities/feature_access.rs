//! Feature access entity - A fact that an entity may use a product feature.
//!
//! The composite primary key makes a grant a set membership: recording the same
//! (entity, product, feature) twice leaves a single row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Feature access grant model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feature_access")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entity_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub feature_id: String,
    /// When the grant was first recorded
    pub granted_at: DateTimeUtc,
}

/// Each grant belongs to one organization
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::EntityId",
        to = "super::organization::Column::Id"
    )]
    Organization,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
