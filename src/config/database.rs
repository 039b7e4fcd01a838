//! Database configuration module for the laptop store.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so foreign keys (including the cascade
//! from orders to their lines) and the unique username constraint come straight
//! from the entity attributes.

use crate::entities::{Account, ImportReceipt, Laptop, Order, OrderItem, WarrantyRequest};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

/// Default location of the store database when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/laptop_store.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to [`DEFAULT_DATABASE_URL`]. Connection failures are surfaced as
/// [`crate::errors::Error::Database`] and never retried.
#[instrument]
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet, parents before children.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, Account).await?;
    create_table(db, Laptop).await?;
    create_table(db, Order).await?;
    create_table(db, OrderItem).await?;
    create_table(db, WarrantyRequest).await?;
    create_table(db, ImportReceipt).await?;
    info!("Database tables ensured");
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    db.execute(builder.build(statement.if_not_exists())).await?;
    Ok(())
}
