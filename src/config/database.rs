//! Database configuration module for the grant portal store.
//!
//! This module resolves the store URL and creates every table from the entity
//! definitions; [`crate::Dal::connect`] opens the connection itself. Tables are generated with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. Parents are created before children so the
//! foreign keys derived from `belongs_to` relations resolve.

use crate::entities::{
    FeatureAccess, Identity, Organization, Submission, User, UserEntity, Waitlist,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};
use tracing::{info, instrument};

/// Store used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/grant_portal.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Creates all tables that do not exist yet.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Identity),
        schema.create_table_from_entity(Organization),
        schema.create_table_from_entity(UserEntity),
        schema.create_table_from_entity(Submission),
        schema.create_table_from_entity(FeatureAccess),
        schema.create_table_from_entity(Waitlist),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    info!("Store tables ensured ({} tables).", statements.len());
    Ok(())
}
