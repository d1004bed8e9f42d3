//! Forms client - submissions scoped under an entity.
//!
//! A submission's payload is a JSON object. Patches merge into it key by key, so
//! writing one step never disturbs another.

use crate::{
    entities::{
        Organization, Submission, SubmissionColumn, SubmissionStatus,
        submission::{self, step_key},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde_json::Map;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Fields needed to open a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub entity_id: String,
    pub form_id: String,
    /// User starting the submission
    pub submitted_by: String,
}

/// Partial update applied by [`FormsClient::update_submission`]
///
/// `None` fields are left as stored; `data` keys overwrite the stored keys of the
/// same name and leave the rest alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionPatch {
    pub current_step: Option<i64>,
    pub data: Map<String, Json>,
    pub status: Option<SubmissionStatus>,
    pub submitted_at: Option<DateTimeUtc>,
}

impl SubmissionPatch {
    /// Writes `fields` as step `step`'s payload and moves `current_step` to it.
    #[must_use]
    pub fn step(step: u32, fields: Json) -> Self {
        let mut data = Map::new();
        data.insert(step_key(step), fields);
        Self {
            current_step: Some(i64::from(step)),
            data,
            ..Self::default()
        }
    }

    /// Moves the submission to `status`.
    #[must_use]
    pub fn status(status: SubmissionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Client for form submissions
#[derive(Clone, Copy, Debug)]
pub struct FormsClient<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> FormsClient<'a> {
    pub(crate) const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens a pending submission at step 0 with an empty payload.
    ///
    /// # Errors
    /// `NotFound` if the entity does not exist.
    #[instrument(skip(self))]
    pub async fn create_submission(
        &self,
        new_submission: NewSubmission,
    ) -> Result<submission::Model> {
        Organization::find_by_id(new_submission.entity_id.clone())
            .one(self.db)
            .await?
            .ok_or_else(|| Error::not_found("entity", new_submission.entity_id.as_str()))?;

        let now = Utc::now();
        let created = submission::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            entity_id: Set(new_submission.entity_id),
            form_id: Set(new_submission.form_id),
            current_step: Set(0),
            data: Set(Json::Object(Map::new())),
            status: Set(SubmissionStatus::Pending),
            last_updated_by: Set(new_submission.submitted_by.clone()),
            submitted_by: Set(new_submission.submitted_by),
            created_at: Set(now),
            updated_at: Set(now),
            submitted_at: Set(None),
        }
        .insert(self.db)
        .await?;

        info!(
            "Created submission {} for form {} on entity {}.",
            created.id, created.form_id, created.entity_id
        );
        Ok(created)
    }

    /// All submissions of an entity, oldest first.
    #[instrument(skip(self))]
    pub async fn get_entity_submissions(&self, entity_id: &str) -> Result<Vec<submission::Model>> {
        let submissions = Submission::find()
            .filter(SubmissionColumn::EntityId.eq(entity_id))
            .order_by_asc(SubmissionColumn::CreatedAt)
            .order_by_asc(SubmissionColumn::Id)
            .all(self.db)
            .await?;
        debug!("Entity {} has {} submissions.", entity_id, submissions.len());
        Ok(submissions)
    }

    /// Fetches one submission of an entity, `None` if absent.
    pub async fn get_submission(
        &self,
        entity_id: &str,
        submission_id: &str,
    ) -> Result<Option<submission::Model>> {
        Submission::find_by_id(submission_id.to_string())
            .filter(SubmissionColumn::EntityId.eq(entity_id))
            .one(self.db)
            .await
            .map_err(Into::into)
    }

    /// Merges `patch` into a stored submission and stamps the acting user.
    ///
    /// # Errors
    /// `NotFound` if the entity has no submission with that id.
    #[instrument(skip(self, patch))]
    pub async fn update_submission(
        &self,
        entity_id: &str,
        submission_id: &str,
        patch: SubmissionPatch,
        acting_user_id: &str,
    ) -> Result<submission::Model> {
        let mut existing = self
            .get_submission(entity_id, submission_id)
            .await?
            .ok_or_else(|| Error::not_found("submission", submission_id))?;

        let mut data = match std::mem::take(&mut existing.data) {
            Json::Object(map) => map,
            _ => Map::new(),
        };
        data.extend(patch.data);

        let mut record: submission::ActiveModel = existing.into();
        record.data = Set(Json::Object(data));
        if let Some(step) = patch.current_step {
            record.current_step = Set(step);
        }
        if let Some(status) = patch.status {
            record.status = Set(status);
        }
        if let Some(at) = patch.submitted_at {
            record.submitted_at = Set(Some(at));
        }
        record.last_updated_by = Set(acting_user_id.to_string());
        record.updated_at = Set(Utc::now());

        let updated = record.update(self.db).await?;
        debug!(
            "Updated submission {} (step {}, {:?}).",
            updated.id, updated.current_step, updated.status
        );
        Ok(updated)
    }
}
