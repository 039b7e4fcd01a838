//! Laptop entity - A catalog item together with its stock count.
//!
//! The price is kept in integer cents so the database never holds a binary
//! float; [`Model::price`] exposes it as a two-place decimal.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::money;

/// Laptop database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "laptops")]
pub struct Model {
    /// Unique identifier for the laptop
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Model name (e.g., "ThinkPad X1 Carbon")
    pub name: String,
    /// Manufacturer (e.g., "Lenovo")
    pub brand: String,
    /// CPU descriptor (e.g., "Intel Core i7-1365U")
    pub cpu: String,
    /// Memory in GB
    pub ram: i32,
    /// Preinstalled operating system
    pub os: String,
    /// Chassis color
    pub color: String,
    /// Unit price in cents
    pub price_cents: i64,
    /// Units on hand, never negative
    pub stock_quantity: i32,
}

/// Defines relationships between Laptop and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One laptop appears in many order lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    /// One laptop is restocked by many import receipts
    #[sea_orm(has_many = "super::import_receipt::Entity")]
    ImportReceipts,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::import_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImportReceipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unit price as a decimal with two fractional digits.
    #[must_use]
    pub fn price(&self) -> Decimal {
        money::from_cents(self.price_cents)
    }
}
