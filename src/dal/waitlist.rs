//! Waitlist client - pre-launch registrations.
//!
//! A second registration for the same email is reported as
//! [`Error::AlreadyRegistered`] so callers can show a friendly message instead of
//! a failure.

use crate::{
    dal::{is_unique_violation, normalize_email},
    entities::{Waitlist, WaitlistColumn, waitlist},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A registration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWaitlistEntry {
    pub email: String,
    pub name: String,
    pub note: Option<String>,
}

/// Client for the waitlist collection
#[derive(Clone, Copy, Debug)]
pub struct WaitlistClient<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> WaitlistClient<'a> {
    pub(crate) const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds an email to the waitlist.
    ///
    /// # Errors
    /// - `Validation` for a malformed email or blank name
    /// - `AlreadyRegistered` if the email is already on the list
    #[instrument(skip(self))]
    pub async fn join(&self, entry: NewWaitlistEntry) -> Result<waitlist::Model> {
        let email = normalize_email(&entry.email)?;
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(Error::validation("Name is required to join the waitlist"));
        }

        if self.find(&email).await?.is_some() {
            warn!("{} tried to join the waitlist twice.", email);
            return Err(Error::AlreadyRegistered { email });
        }

        let created = self
            .insert(
                waitlist::ActiveModel {
                    id: Set(Uuid::new_v4().to_string()),
                    email: Set(email.clone()),
                    name: Set(name.to_string()),
                    note: Set(entry.note.filter(|note| !note.trim().is_empty())),
                    registered_at: Set(Utc::now()),
                },
                email,
            )
            .await?;

        info!("{} joined the waitlist.", created.email);
        Ok(created)
    }

    /// Whether the email is on the list. Malformed emails never are.
    pub async fn is_registered(&self, email: &str) -> Result<bool> {
        match normalize_email(email) {
            Ok(email) => Ok(self.find(&email).await?.is_some()),
            Err(_) => Ok(false),
        }
    }

    /// A concurrent join that wins the unique email index after our `find`
    /// surfaces as `AlreadyRegistered`, same as the pre-check.
    async fn insert(
        &self,
        record: waitlist::ActiveModel,
        email: String,
    ) -> Result<waitlist::Model> {
        record.insert(self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                warn!("{} joined the waitlist concurrently.", email);
                Error::AlreadyRegistered { email }
            } else {
                e.into()
            }
        })
    }

    async fn find(&self, email: &str) -> Result<Option<waitlist::Model>> {
        Waitlist::find()
            .filter(WaitlistColumn::Email.eq(email))
            .one(self.db)
            .await
            .map_err(Into::into)
    }
}
