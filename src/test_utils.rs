//! Shared test utilities for the grant portal.
//!
//! This module provides helpers for setting up an in-memory store and creating
//! users, entities and submissions with sensible defaults.

use crate::{
    dal::{AuthIdentity, Dal, NewEntity, NewSubmission},
    entities::{EntityKind, organization, submission},
    errors::Result,
};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` store with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_dal() -> Result<Dal> {
    init_test_tracing();
    let dal = Dal::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(dal.connection()).await?;
    Ok(dal)
}

/// Signs up a password user named after the email's local part.
///
/// # Defaults
/// * password: `"password123"`
pub async fn create_test_user(dal: &Dal, email: &str) -> Result<AuthIdentity> {
    let display_name = email.split('@').next().unwrap_or(email);
    dal.auth().sign_up(email, "password123", display_name).await
}

/// Creates a venture owned by `owner_user_id` with no team.
pub async fn create_test_entity(
    dal: &Dal,
    owner_user_id: &str,
    name: &str,
) -> Result<organization::Model> {
    dal.entities()
        .create_entity(
            owner_user_id,
            NewEntity {
                name: name.to_string(),
                kind: EntityKind::Venture,
                narrative: "Test narrative".to_string(),
                team: Vec::new(),
            },
        )
        .await
}

/// Opens a submission directly through the DAL, bypassing the workflow.
pub async fn create_test_submission(
    dal: &Dal,
    entity_id: &str,
    form_id: &str,
    user_id: &str,
) -> Result<submission::Model> {
    dal.forms()
        .create_submission(NewSubmission {
            entity_id: entity_id.to_string(),
            form_id: form_id.to_string(),
            submitted_by: user_id.to_string(),
        })
        .await
}

/// Sets up a store with one user owning one venture.
/// Returns (dal, user, entity) for common test scenarios.
pub async fn setup_with_entity() -> Result<(Dal, AuthIdentity, organization::Model)> {
    let dal = setup_test_dal().await?;
    let user = create_test_user(&dal, "founder@example.com").await?;
    let entity = create_test_entity(&dal, &user.user_id, "Solar Sprout").await?;
    Ok((dal, user, entity))
}
