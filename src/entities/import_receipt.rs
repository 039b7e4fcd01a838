//! Import receipt entity - A record of stock received from a supplier.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Import receipt database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "import_receipts")]
pub struct Model {
    /// Unique identifier for the receipt
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Laptop that was restocked
    pub laptop_id: i64,
    /// Units received, always positive
    pub quantity: i32,
    /// When the stock arrived
    pub import_date: DateTimeUtc,
    /// Supplier company
    pub supplier_name: String,
    /// Supplier phone or e-mail
    pub supplier_contact: String,
    /// Free-form remarks
    pub notes: Option<String>,
}

/// Defines relationships between `ImportReceipt` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each receipt restocks one laptop
    #[sea_orm(
        belongs_to = "super::laptop::Entity",
        from = "Column::LaptopId",
        to = "super::laptop::Column::Id"
    )]
    Laptop,
}

impl Related<super::laptop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Laptop.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
