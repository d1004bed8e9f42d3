//! Authentication client - email/password accounts and Google sign-in.
//!
//! Identity verification for federated providers happens outside this crate;
//! callers pass the verified claims. Every successful sign-in guarantees a
//! matching user record exists, creating it on the first one.

use crate::{
    dal::{is_unique_violation, normalize_email},
    entities::{AuthProvider, Identity, IdentityColumn, User, identity, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Result of a successful sign-up or sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthIdentity {
    /// User (and identity) id
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub provider: AuthProvider,
    /// True when this call created the user record
    pub is_new_user: bool,
}

/// Claims taken from a verified Google ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    /// Stable `sub` claim
    pub subject: String,
    pub email: String,
    pub display_name: String,
}

/// Client for account creation and sign-in
#[derive(Clone, Copy, Debug)]
pub struct AuthClient<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AuthClient<'a> {
    pub(crate) const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers an email/password account and its user record.
    ///
    /// # Errors
    /// - `Validation` for an empty display name, malformed email or short password
    /// - `Authentication` if the email already has an account
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthIdentity> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(Error::validation("Display name is required"));
        }
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.find_by_email(&email).await?.is_some() {
            warn!("Sign-up rejected, {} already has an account.", email);
            return Err(Error::authentication(format!(
                "An account already exists for {email}"
            )));
        }

        let record = identity::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            email: Set(email.clone()),
            provider: Set(AuthProvider::Password),
            password_hash: Set(Some(hash_password(password)?)),
            provider_subject: Set(None),
            display_name: Set(display_name.to_string()),
            created_at: Set(Utc::now()),
        };

        let txn = self.db.begin().await?;
        let record = insert_identity(&txn, record, &email).await?;
        let (user, is_new_user) = ensure_user(&txn, &record).await?;
        txn.commit().await?;

        info!("Registered password account {} for {}.", user.id, user.email);
        Ok(to_auth_identity(&record, user, is_new_user))
    }

    /// Signs in with email and password.
    ///
    /// Unknown emails and wrong passwords produce the same error.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity> {
        let email = email.trim().to_lowercase();
        let record = self
            .find_by_email(&email)
            .await?
            .ok_or_else(|| Error::authentication("Invalid email or password"))?;

        if record.provider != AuthProvider::Password {
            return Err(Error::authentication(
                "This account signs in with Google",
            ));
        }

        let matches = record
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(hash, password));
        if !matches {
            warn!("Failed sign-in for {}.", email);
            return Err(Error::authentication("Invalid email or password"));
        }

        let (user, is_new_user) = ensure_user(self.db, &record).await?;
        info!("Signed in {}.", user.id);
        Ok(to_auth_identity(&record, user, is_new_user))
    }

    /// Signs in with verified Google claims, registering on first use.
    ///
    /// # Errors
    /// - `Validation` for an empty subject or malformed email
    /// - `Authentication` if the email is bound to a password account
    #[instrument(skip(self))]
    pub async fn sign_in_with_google(&self, profile: &GoogleProfile) -> Result<AuthIdentity> {
        if profile.subject.trim().is_empty() {
            return Err(Error::validation("Google subject is required"));
        }
        let email = normalize_email(&profile.email)?;

        let existing = Identity::find()
            .filter(IdentityColumn::Provider.eq(AuthProvider::Google))
            .filter(IdentityColumn::ProviderSubject.eq(profile.subject.as_str()))
            .one(self.db)
            .await?;
        if let Some(record) = existing {
            let (user, is_new_user) = ensure_user(self.db, &record).await?;
            info!("Signed in {} with Google.", user.id);
            return Ok(to_auth_identity(&record, user, is_new_user));
        }

        if self.find_by_email(&email).await?.is_some() {
            warn!("Google sign-in for {} collides with another credential.", email);
            return Err(Error::authentication(format!(
                "{email} is registered with a different sign-in method"
            )));
        }

        let display_name = match profile.display_name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };
        let record = identity::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            email: Set(email.clone()),
            provider: Set(AuthProvider::Google),
            password_hash: Set(None),
            provider_subject: Set(Some(profile.subject.clone())),
            display_name: Set(display_name),
            created_at: Set(Utc::now()),
        };

        let txn = self.db.begin().await?;
        let record = insert_identity(&txn, record, &email).await?;
        let (user, is_new_user) = ensure_user(&txn, &record).await?;
        txn.commit().await?;

        info!("Registered Google account {} for {}.", user.id, user.email);
        Ok(to_auth_identity(&record, user, is_new_user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<identity::Model>> {
        Identity::find()
            .filter(IdentityColumn::Email.eq(email))
            .one(self.db)
            .await
            .map_err(Into::into)
    }
}

/// Returns the identity's user record, creating it if this is the first sign-in.
async fn ensure_user<C>(db: &C, record: &identity::Model) -> Result<(user::Model, bool)>
where
    C: ConnectionTrait,
{
    if let Some(existing) = User::find_by_id(record.id.clone()).one(db).await? {
        return Ok((existing, false));
    }

    let now = Utc::now();
    let created = user::ActiveModel {
        id: Set(record.id.clone()),
        email: Set(record.email.clone()),
        display_name: Set(record.display_name.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!("Created user record {} on first sign-in.", created.id);
    Ok((created, true))
}

/// Inserts a new identity. Losing a race on the unique email is reported the
/// same way as the pre-insert duplicate check.
async fn insert_identity<C>(
    db: &C,
    record: identity::ActiveModel,
    email: &str,
) -> Result<identity::Model>
where
    C: ConnectionTrait,
{
    record.insert(db).await.map_err(|e| {
        if is_unique_violation(&e) {
            warn!("Concurrent registration for {} lost the race.", email);
            Error::authentication(format!("An account already exists for {email}"))
        } else {
            e.into()
        }
    })
}

fn to_auth_identity(
    record: &identity::Model,
    user: user::Model,
    is_new_user: bool,
) -> AuthIdentity {
    AuthIdentity {
        user_id: user.id,
        email: user.email,
        display_name: user.display_name,
        provider: record.provider,
        is_new_user,
    }
}

/// Argon2id with a fresh random salt, encoded as a PHC string.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::authentication(format!("Could not hash password: {e}")))
}

/// A stored hash that fails to parse never matches.
fn verify_password(stored: &str, password: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
