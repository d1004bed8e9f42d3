//! Submission entity - One user's run through a specific form for a specific entity.
//!
//! Step payloads are kept in a single JSON object keyed `step_{n}_data`, each value
//! an opaque field-to-value mapping supplied by the form.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Created, steps may still be written
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Finalized by the applicant
    #[sea_orm(string_value = "submitted")]
    Submitted,
    /// Accepted by a reviewer
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Declined by a reviewer
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Submission database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    /// Generated identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Entity the submission is filed for
    pub entity_id: String,
    /// Form being filled, e.g. `"pitch_deck"`
    pub form_id: String,
    /// Index of the last step written
    pub current_step: i64,
    /// Step payloads keyed `step_{n}_data`
    pub data: Json,
    pub status: SubmissionStatus,
    /// User who started the submission
    pub submitted_by: String,
    /// User behind the most recent write
    pub last_updated_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Set when the status moves to submitted
    pub submitted_at: Option<DateTimeUtc>,
}

impl Model {
    /// Payload stored for `step`, if any.
    #[must_use]
    pub fn step_data(&self, step: u32) -> Option<&Json> {
        self.data.get(step_key(step))
    }
}

/// Payload key under which a step's fields are stored.
#[must_use]
pub fn step_key(step: u32) -> String {
    format!("step_{step}_data")
}

/// Defines relationships between Submission and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each submission belongs to one organization
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
