//! Order item entity - One product line inside an order.
//!
//! `unit_price_cents` is a snapshot taken when the order was placed and does
//! not follow later catalog price changes.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::money;

/// Order item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning order
    pub order_id: i64,
    /// Laptop sold on this line
    pub laptop_id: i64,
    /// Units sold, always positive
    pub quantity: i32,
    /// Unit price in cents at order time
    pub unit_price_cents: i64,
    /// `quantity * unit_price_cents`
    pub subtotal_cents: i64,
}

/// Defines relationships between `OrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order and goes away with it
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
    /// Each line refers to one laptop
    #[sea_orm(
        belongs_to = "super::laptop::Entity",
        from = "Column::LaptopId",
        to = "super::laptop::Column::Id"
    )]
    Laptop,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::laptop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Laptop.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unit price as a decimal.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        money::from_cents(self.unit_price_cents)
    }

    /// Line subtotal as a decimal.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        money::from_cents(self.subtotal_cents)
    }
}
