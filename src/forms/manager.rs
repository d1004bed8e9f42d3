//! Form workflow manager - sequences the store calls behind each form action.
//!
//! Calls within one action are awaited one after another; nothing here is
//! transactional. In particular:
//!
//! - `initialize_form` always opens a submission, even when it reports that the
//!   entity may not use the form. Denied attempts therefore leave a record.
//! - The duplicate check in `initialize_form` is best effort. Two concurrent
//!   calls can both see no earlier submission and both create one.
//! - `handle_submit` marks the submission submitted before recording the grant.
//!   If the grant fails the submission stays submitted.
//! - `handle_submit` only accepts a pending submission, but the status check
//!   and the write are separate calls.
//!
//! Every failure is logged here and returned unchanged.

use crate::{
    config::{FeatureRef, FormAccessMap},
    dal::{Dal, NewSubmission, SubmissionPatch},
    entities::{SubmissionStatus, submission},
    errors::{Error, Result},
    forms::routes::{DEFAULT_ROUTE, redirect_path},
};
use chrono::Utc;
use sea_orm::prelude::Json;
use serde::Serialize;
use serde_json::Map;
use tracing::{error, info, instrument, warn};

/// Outcome of [`FormManager::initialize_form`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormInit {
    /// The submission opened by this call
    pub submission: submission::Model,
    /// Whether the UI should let the user continue
    pub can_access: bool,
    /// The entity holds every feature the form requires
    pub has_form_access: bool,
    /// The entity already holds the feature the form grants
    pub has_access: bool,
    /// The entity had a submission for this form before this call
    pub existing_submission: bool,
}

/// Outcome of [`FormManager::handle_submit`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSubmitted {
    pub submission: submission::Model,
    /// Grant recorded for the entity, `None` if the form grants nothing
    pub grant: Option<FeatureRef>,
    /// Route to send the user to next
    pub redirect_to: &'static str,
}

/// Runs form actions against the store
#[derive(Clone, Debug)]
pub struct FormManager {
    dal: Dal,
    access: FormAccessMap,
}

impl FormManager {
    /// Creates a manager over `dal` using `access` to decide grants.
    #[must_use]
    pub const fn new(dal: Dal, access: FormAccessMap) -> Self {
        Self { dal, access }
    }

    /// The access map in use.
    #[must_use]
    pub const fn access_map(&self) -> &FormAccessMap {
        &self.access
    }

    /// Opens a submission of `form_id` for `entity_id` and reports whether the
    /// entity may proceed.
    ///
    /// Access is allowed only when the entity meets the form's prerequisites,
    /// does not yet hold the feature the form grants, and had no earlier
    /// submission of the form. The submission is created either way.
    ///
    /// # Errors
    /// `NotFound` if the entity does not exist; `DataAccess` on store failure.
    #[instrument(skip(self))]
    pub async fn initialize_form(
        &self,
        form_id: &str,
        entity_id: &str,
        acting_user_id: &str,
    ) -> Result<FormInit> {
        let existing_submission = self
            .dal
            .forms()
            .get_entity_submissions(entity_id)
            .await
            .inspect_err(|e| error!("Failed to list submissions of entity {entity_id}: {e}"))?
            .iter()
            .any(|existing| existing.form_id == form_id);

        let has_access = self
            .has_access(form_id, entity_id)
            .await
            .inspect_err(|e| error!("Failed to check feature access for {form_id}: {e}"))?;

        let has_form_access = self
            .has_form_access(form_id, entity_id)
            .await
            .inspect_err(|e| error!("Failed to check prerequisites of {form_id}: {e}"))?;

        let submission = self
            .dal
            .forms()
            .create_submission(NewSubmission {
                entity_id: entity_id.to_string(),
                form_id: form_id.to_string(),
                submitted_by: acting_user_id.to_string(),
            })
            .await
            .inspect_err(|e| error!("Failed to open {form_id} for entity {entity_id}: {e}"))?;

        let can_access = has_form_access && !has_access && !existing_submission;
        if can_access {
            info!("Opened {} as submission {}.", form_id, submission.id);
        } else {
            warn!(
                has_form_access,
                has_access,
                existing_submission,
                "Entity {} may not continue {}; submission {} recorded anyway.",
                entity_id,
                form_id,
                submission.id
            );
        }

        Ok(FormInit {
            submission,
            can_access,
            has_form_access,
            has_access,
            existing_submission,
        })
    }

    /// Stores `fields` as the payload of `step` and makes it the current step.
    ///
    /// The payload replaces any earlier payload of the same step.
    ///
    /// # Errors
    /// `NotFound` if the submission does not exist on the entity; `DataAccess` on
    /// store failure.
    #[instrument(skip(self, fields))]
    pub async fn update_form_step(
        &self,
        entity_id: &str,
        submission_id: &str,
        step: u32,
        fields: Map<String, Json>,
        acting_user_id: &str,
    ) -> Result<submission::Model> {
        self.dal
            .forms()
            .update_submission(
                entity_id,
                submission_id,
                SubmissionPatch::step(step, Json::Object(fields)),
                acting_user_id,
            )
            .await
            .inspect_err(|e| error!("Failed to save step {step} of {submission_id}: {e}"))
    }

    /// Marks the submission submitted, then grants the form's feature.
    ///
    /// The grant is looked up by the form the submission was opened for, which
    /// must match `form_id`. The grant's product falls back to `pitch-to-grant`
    /// when the form's entry names none. A form without an entry is submitted
    /// without a grant.
    ///
    /// # Errors
    /// - `NotFound` if the submission does not exist on the entity
    /// - `Validation` if the submission belongs to another form or is no longer
    ///   pending; nothing is written or granted
    /// - `DataAccess` on store failure, including a failed grant after the
    ///   submission was already marked submitted
    #[instrument(skip(self))]
    pub async fn handle_submit(
        &self,
        form_id: &str,
        entity_id: &str,
        submission_id: &str,
        acting_user_id: &str,
    ) -> Result<FormSubmitted> {
        let current = self
            .dal
            .forms()
            .get_submission(entity_id, submission_id)
            .await
            .inspect_err(|e| error!("Failed to load {submission_id} for submit: {e}"))?
            .ok_or_else(|| Error::not_found("submission", submission_id))
            .inspect_err(|e| error!("Cannot submit: {e}"))?;

        if current.form_id != form_id {
            warn!(
                "Submission {} belongs to {}, not {}; refusing to submit.",
                submission_id, current.form_id, form_id
            );
            return Err(Error::validation(format!(
                "Submission {submission_id} belongs to form {}, not {form_id}",
                current.form_id
            )));
        }
        if current.status != SubmissionStatus::Pending {
            warn!(
                "Submission {} is already {:?}; refusing to submit again.",
                submission_id, current.status
            );
            return Err(Error::validation(format!(
                "Submission {submission_id} is no longer pending"
            )));
        }

        let patch = SubmissionPatch {
            status: Some(SubmissionStatus::Submitted),
            submitted_at: Some(Utc::now()),
            ..SubmissionPatch::default()
        };
        let submission = self
            .dal
            .forms()
            .update_submission(entity_id, submission_id, patch, acting_user_id)
            .await
            .inspect_err(|e| error!("Failed to submit {submission_id}: {e}"))?;

        let Some(entry) = self.access.get(&submission.form_id) else {
            warn!(
                "Form {} grants no feature; submitted without a grant.",
                submission.form_id
            );
            return Ok(FormSubmitted {
                submission,
                grant: None,
                redirect_to: DEFAULT_ROUTE,
            });
        };

        let grant = entry.grant();
        self.dal
            .user()
            .grant_feature_access(entity_id, &grant.product_id, &grant.feature_id)
            .await
            .inspect_err(|e| {
                error!(
                    "Submission {submission_id} is submitted but granting {}/{} failed: {e}",
                    grant.product_id, grant.feature_id
                );
            })?;

        let redirect_to = redirect_path(&grant.feature_id);
        info!(
            "Submitted {} for entity {}; redirecting to {}.",
            submission_id, entity_id, redirect_to
        );
        Ok(FormSubmitted {
            submission,
            grant: Some(grant),
            redirect_to,
        })
    }

    /// Route for a feature; see [`redirect_path`].
    #[must_use]
    pub fn get_redirect_path(&self, feature_id: &str) -> &'static str {
        redirect_path(feature_id)
    }

    async fn has_access(&self, form_id: &str, entity_id: &str) -> Result<bool> {
        match self.access.get(form_id) {
            Some(entry) => {
                let grant = entry.grant();
                self.dal
                    .user()
                    .has_feature_access(entity_id, &grant.product_id, &grant.feature_id)
                    .await
            }
            None => Ok(false),
        }
    }

    async fn has_form_access(&self, form_id: &str, entity_id: &str) -> Result<bool> {
        let Some(entry) = self.access.get(form_id) else {
            return Ok(true);
        };
        for required in &entry.requires {
            let held = self
                .dal
                .user()
                .has_feature_access(entity_id, &required.product_id, &required.feature_id)
                .await?;
            if !held {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::FormAccess;
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;
    use serde_json::json;

    fn fields(value: Json) -> Map<String, Json> {
        match value {
            Json::Object(map) => map,
            _ => Map::new(),
        }
    }

    async fn setup_manager() -> Result<(FormManager, Dal, String, String)> {
        let (dal, user, entity) = setup_with_entity().await?;
        let manager = FormManager::new(dal.clone(), FormAccessMap::default());
        Ok((manager, dal, user.user_id, entity.id))
    }

    #[tokio::test]
    async fn test_initialize_form_first_time() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;

        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;
        assert!(init.has_form_access);
        assert!(!init.has_access);
        assert!(!init.existing_submission);
        assert!(init.can_access);
        assert_eq!(init.submission.form_id, "pitch_deck");
        assert_eq!(init.submission.submitted_by, user_id);

        let stored = dal.forms().get_entity_submissions(&entity_id).await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, init.submission.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_form_with_existing_submission_still_creates() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;

        let second = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;
        assert!(second.existing_submission);
        assert!(!second.can_access);

        let stored = dal.forms().get_entity_submissions(&entity_id).await?;
        assert_eq!(stored.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_other_forms_do_not_count_as_existing() -> Result<()> {
        let (manager, _dal, user_id, entity_id) = setup_manager().await?;
        manager
            .initialize_form("catalyzor_onboarding", &entity_id, &user_id)
            .await?;

        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;
        assert!(!init.existing_submission);
        assert!(init.can_access);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_form_when_feature_already_held() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        dal.user()
            .grant_feature_access(&entity_id, "pitch-to-grant", "pitch-to-grant")
            .await?;

        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;
        assert!(init.has_access);
        assert!(!init.can_access);
        assert_eq!(dal.forms().get_entity_submissions(&entity_id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_form_requires_prerequisites() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;

        let blocked = manager
            .initialize_form("grant_application", &entity_id, &user_id)
            .await?;
        assert!(!blocked.has_form_access);
        assert!(!blocked.can_access);

        dal.user()
            .grant_feature_access(&entity_id, "pitch-to-grant", "pitch-to-grant")
            .await?;
        let open = manager
            .initialize_form("grant_application", &entity_id, &user_id)
            .await?;
        assert!(open.has_form_access);
        // The blocked attempt above left a submission behind.
        assert!(open.existing_submission);
        assert!(!open.can_access);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_form_missing_entity() -> Result<()> {
        let (manager, _dal, user_id, _entity_id) = setup_manager().await?;
        let result = manager.initialize_form("pitch_deck", "ghost", &user_id).await;
        assert!(matches!(result, Err(Error::NotFound { kind: "entity", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_initialization_creates_both() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;

        let (a, b) = tokio::join!(
            manager.initialize_form("pitch_deck", &entity_id, &user_id),
            manager.initialize_form("pitch_deck", &entity_id, &user_id),
        );
        assert_ne!(a?.submission.id, b?.submission.id);
        assert_eq!(dal.forms().get_entity_submissions(&entity_id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_form_step_round_trip() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;
        let payload = json!({
            "company_name": "Solar Sprout",
            "funding_ask": 250000,
            "sectors": ["energy", "agriculture"],
            "deck": {"url": "https://example.com/deck.pdf", "pages": 12}
        });

        let id = &init.submission.id;
        manager
            .update_form_step(&entity_id, id, 0, fields(json!({"intro": true})), &user_id)
            .await?;
        let updated = manager
            .update_form_step(&entity_id, id, 2, fields(payload.clone()), &user_id)
            .await?;
        assert_eq!(updated.current_step, 2);

        let reread = dal.forms().get_entity_submissions(&entity_id).await?;
        assert_eq!(reread[0].data.get("step_2_data"), Some(&payload));
        assert_eq!(reread[0].data.get("step_0_data"), Some(&json!({"intro": true})));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_form_step_overwrites_same_step() -> Result<()> {
        let (manager, _dal, user_id, entity_id) = setup_manager().await?;
        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;

        let id = &init.submission.id;
        manager
            .update_form_step(&entity_id, id, 1, fields(json!({"a": 1, "b": 2})), &user_id)
            .await?;
        let updated = manager
            .update_form_step(&entity_id, id, 1, fields(json!({"a": 3})), &user_id)
            .await?;
        assert_eq!(updated.step_data(1), Some(&json!({"a": 3})));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_form_step_missing_submission() -> Result<()> {
        let (manager, _dal, user_id, entity_id) = setup_manager().await?;
        let result = manager
            .update_form_step(&entity_id, "ghost", 1, Map::new(), &user_id)
            .await;
        assert!(matches!(result, Err(Error::NotFound { kind: "submission", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_submit_grants_pitch_to_grant() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;

        let outcome = manager
            .handle_submit("pitch_deck", &entity_id, &init.submission.id, &user_id)
            .await?;
        assert_eq!(outcome.submission.status, SubmissionStatus::Submitted);
        assert!(outcome.submission.submitted_at.is_some());
        assert_eq!(outcome.grant, Some(FeatureRef::new("pitch-to-grant", "pitch-to-grant")));
        assert_eq!(outcome.redirect_to, "/pitch-to-grant");

        assert!(
            dal.user()
                .has_feature_access(&entity_id, "pitch-to-grant", "pitch-to-grant")
                .await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_submit_defaults_product_id() -> Result<()> {
        let (dal, user, entity) = setup_with_entity().await?;
        let mut access = FormAccessMap::default();
        access.forms.insert(
            "market_sizing".to_string(),
            FormAccess {
                product_id: None,
                feature_id: "market-insights".to_string(),
                requires: Vec::new(),
            },
        );
        let manager = FormManager::new(dal.clone(), access);

        let init = manager
            .initialize_form("market_sizing", &entity.id, &user.user_id)
            .await?;
        let outcome = manager
            .handle_submit("market_sizing", &entity.id, &init.submission.id, &user.user_id)
            .await?;
        assert_eq!(outcome.redirect_to, "/");

        let grants = dal.user().list_feature_access(&entity.id).await?;
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].product_id, "pitch-to-grant");
        assert_eq!(grants[0].feature_id, "market-insights");
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_submit_explicit_product() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        let init = manager
            .initialize_form("catalyzor_onboarding", &entity_id, &user_id)
            .await?;

        let outcome = manager
            .handle_submit("catalyzor_onboarding", &entity_id, &init.submission.id, &user_id)
            .await?;
        assert_eq!(outcome.redirect_to, "/catalyzor/deal-flow");
        assert!(dal.user().has_feature_access(&entity_id, "catalyzor-hub", "deal-flow").await?);
        assert!(!dal.user().has_feature_access(&entity_id, "pitch-to-grant", "deal-flow").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_submit_without_access_entry() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        let init = manager.initialize_form("newsletter", &entity_id, &user_id).await?;
        assert!(init.can_access);

        let outcome = manager
            .handle_submit("newsletter", &entity_id, &init.submission.id, &user_id)
            .await?;
        assert_eq!(outcome.submission.status, SubmissionStatus::Submitted);
        assert!(outcome.grant.is_none());
        assert_eq!(outcome.redirect_to, "/");
        assert!(dal.user().list_feature_access(&entity_id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_submit_keeps_submission_when_grant_fails() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;
        dal.connection()
            .execute_unprepared("DROP TABLE feature_access")
            .await?;

        let result = manager
            .handle_submit("pitch_deck", &entity_id, &init.submission.id, &user_id)
            .await;
        assert!(matches!(result, Err(Error::DataAccess(_))));

        let stored = dal
            .forms()
            .get_submission(&entity_id, &init.submission.id)
            .await?
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Submitted);
        assert!(stored.submitted_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_submit_missing_submission_grants_nothing() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;

        let result = manager
            .handle_submit("pitch_deck", &entity_id, "ghost", &user_id)
            .await;
        assert!(matches!(result, Err(Error::NotFound { kind: "submission", .. })));
        assert!(
            !dal.user()
                .has_feature_access(&entity_id, "pitch-to-grant", "pitch-to-grant")
                .await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_submit_rejects_form_mismatch() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;

        let result = manager
            .handle_submit("catalyzor_onboarding", &entity_id, &init.submission.id, &user_id)
            .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        assert!(dal.user().list_feature_access(&entity_id).await?.is_empty());
        let stored = dal
            .forms()
            .get_submission(&entity_id, &init.submission.id)
            .await?
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Pending);
        assert!(stored.submitted_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_submit_twice_is_rejected() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;
        let first = manager
            .handle_submit("pitch_deck", &entity_id, &init.submission.id, &user_id)
            .await?;

        let again = manager
            .handle_submit("pitch_deck", &entity_id, &init.submission.id, &user_id)
            .await;
        assert!(matches!(again, Err(Error::Validation { .. })));

        let stored = dal
            .forms()
            .get_submission(&entity_id, &init.submission.id)
            .await?
            .unwrap();
        assert_eq!(stored.submitted_at, first.submission.submitted_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_submit_does_not_reopen_reviewed_submission() -> Result<()> {
        let (manager, dal, user_id, entity_id) = setup_manager().await?;
        let init = manager.initialize_form("pitch_deck", &entity_id, &user_id).await?;
        let submitted = manager
            .handle_submit("pitch_deck", &entity_id, &init.submission.id, &user_id)
            .await?;
        dal.forms()
            .update_submission(
                &entity_id,
                &init.submission.id,
                SubmissionPatch::status(SubmissionStatus::Approved),
                "reviewer",
            )
            .await?;

        let result = manager
            .handle_submit("pitch_deck", &entity_id, &init.submission.id, &user_id)
            .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let stored = dal
            .forms()
            .get_submission(&entity_id, &init.submission.id)
            .await?
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Approved);
        assert_eq!(stored.submitted_at, submitted.submission.submitted_at);
        assert_eq!(stored.last_updated_by, "reviewer");
        Ok(())
    }

    #[tokio::test]
    async fn test_get_redirect_path_delegates() -> Result<()> {
        let (manager, _dal, _user_id, _entity_id) = setup_manager().await?;
        assert_eq!(manager.get_redirect_path("pitch-to-grant"), "/pitch-to-grant");
        assert_eq!(manager.get_redirect_path("unmapped"), "/");
        Ok(())
    }
}
