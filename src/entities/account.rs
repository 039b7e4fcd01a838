//! Account entity - A customer or administrator login.
//!
//! Credentials are never stored in clear: `password_hash` holds a hex SHA-256
//! digest of `password_salt` followed by the password.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::Role;

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across all accounts
    #[sea_orm(unique)]
    pub username: String,
    /// Hex-encoded salted digest of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Hex-encoded random salt
    #[serde(skip_serializing)]
    pub password_salt: String,
    /// `ADMIN` or `USER`
    pub role: Role,
    /// Display name
    pub full_name: String,
    /// Contact e-mail
    pub email: String,
    /// Contact phone number
    pub phone: String,
    /// Default shipping address
    pub address: String,
    /// When the account was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account places many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    /// One account files many warranty requests
    #[sea_orm(has_many = "super::warranty_request::Entity")]
    WarrantyRequests,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::warranty_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WarrantyRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this account may run administrator operations.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
