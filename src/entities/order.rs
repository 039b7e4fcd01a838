//! Order entity - The header row of a customer order.
//!
//! Lines live in `order_items` and are removed together with the header.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{OrderStatus, PaymentMethod, PaymentStatus};
use crate::core::money;

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Account that placed the order
    pub user_id: i64,
    /// When the order was placed
    pub order_date: DateTimeUtc,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Sum of line subtotals in cents
    pub total_amount_cents: i64,
    /// How the customer pays
    pub payment_method: PaymentMethod,
    /// Whether payment was received
    pub payment_status: PaymentStatus,
    /// Where the order ships to
    pub shipping_address: String,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::UserId",
        to = "super::account::Column::Id"
    )]
    Account,
    /// One order owns many lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Order total as a decimal.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        money::from_cents(self.total_amount_cents)
    }
}
