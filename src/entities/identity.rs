//! Identity entity - Credentials backing a user account.
//!
//! Password identities carry an Argon2 PHC string; federated identities carry the
//! provider's stable subject instead.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How the identity authenticates
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email and password
    #[sea_orm(string_value = "password")]
    Password,
    /// Google federated sign-in
    #[sea_orm(string_value = "google")]
    Google,
}

/// Identity database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "identities")]
pub struct Model {
    /// Identity id, reused as the user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Lowercased email; one identity per email
    #[sea_orm(unique)]
    pub email: String,
    /// Credential kind
    pub provider: AuthProvider,
    /// Argon2id PHC string (salt and parameters embedded), password identities only
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Stable subject claim from the federated provider
    pub provider_subject: Option<String>,
    /// Display name captured at registration
    pub display_name: String,
    /// When the identity was registered
    pub created_at: DateTimeUtc,
}

/// Identities have no modelled relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
