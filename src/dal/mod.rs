//! Data access layer - typed clients over the store.
//!
//! [`Dal`] is built once by the caller and passed to whatever needs it. It holds
//! only the connection handle, so clones are cheap and may be used from
//! concurrent tasks. Each accessor returns a short-lived client borrowing that
//! handle.

/// Email/password and Google sign-in
pub mod auth;
/// Organization records and team data
pub mod entities;
/// Form submissions scoped under an entity
pub mod submissions;
/// User records, entity links and feature grants
pub mod users;
/// Pre-launch waitlist
pub mod waitlist;

pub use auth::{AuthClient, AuthIdentity, GoogleProfile};
pub use entities::{EntityClient, NewEntity};
pub use submissions::{FormsClient, NewSubmission, SubmissionPatch};
pub use users::UserClient;
pub use waitlist::{NewWaitlistEntry, WaitlistClient};

use crate::errors::{Error, Result};
use sea_orm::{Database, DatabaseConnection, DbErr, SqlErr};
use tracing::info;

/// Entry point to every store operation
#[derive(Clone, Debug)]
pub struct Dal {
    db: DatabaseConnection,
}

impl Dal {
    /// Wraps an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens a connection to `url` and wraps it.
    pub async fn connect(url: &str) -> Result<Self> {
        let db = Database::connect(url).await?;
        info!("Data access layer connected.");
        Ok(Self::new(db))
    }

    /// The underlying connection, for schema setup and ad-hoc queries.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Authentication client.
    #[must_use]
    pub const fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(&self.db)
    }

    /// User record and feature access client.
    #[must_use]
    pub const fn user(&self) -> UserClient<'_> {
        UserClient::new(&self.db)
    }

    /// Organization record client.
    #[must_use]
    pub const fn entities(&self) -> EntityClient<'_> {
        EntityClient::new(&self.db)
    }

    /// Form submission client.
    #[must_use]
    pub const fn forms(&self) -> FormsClient<'_> {
        FormsClient::new(&self.db)
    }

    /// Waitlist client.
    #[must_use]
    pub const fn waitlist(&self) -> WaitlistClient<'_> {
        WaitlistClient::new(&self.db)
    }
}

/// Trims and lowercases an email, rejecting anything without a local part and a domain.
pub(crate) fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::validation(format!("'{email}' is not a valid email address"))),
    }
}

/// Whether the store rejected a write because of a unique index or primary key.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
