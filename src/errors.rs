//! Unified error type for the data access layer and the form workflow.
//!
//! Every DAL call returns [`Result`]; the workflow manager logs failures and
//! hands them back unchanged.

use thiserror::Error;

/// All failures surfaced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad credentials, unknown account, or a provider-level rejection.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Human-readable reason
        message: String,
    },

    /// Any transport or permission failure reported by the store.
    #[error("Data access error: {0}")]
    DataAccess(#[from] sea_orm::DbErr),

    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind, e.g. `"submission"`
        kind: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Caller input rejected before touching the store.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Waitlist registration for an email that is already on the list.
    #[error("{email} is already registered on the waitlist")]
    AlreadyRegistered {
        /// The normalized email
        email: String,
    },

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
