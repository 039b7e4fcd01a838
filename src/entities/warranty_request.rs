//! Warranty request entity - A customer's warranty or return claim.
//!
//! `admin_notes` and `processed_date` stay empty until an administrator
//! approves or rejects the request.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::WarrantyStatus;

/// Warranty request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "warranty_requests")]
pub struct Model {
    /// Unique identifier for the request
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order the laptop was bought in
    pub order_id: i64,
    /// Laptop the claim is about
    pub laptop_id: i64,
    /// Account filing the claim
    pub user_id: i64,
    /// When the claim was filed
    pub request_date: DateTimeUtc,
    /// Decision state
    pub status: WarrantyStatus,
    /// Customer's description of the problem
    pub reason: String,
    /// Administrator's comment, set on decision
    pub admin_notes: Option<String>,
    /// When the decision was made
    pub processed_date: Option<DateTimeUtc>,
}

/// Defines relationships between `WarrantyRequest` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The order the claim refers to
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    /// The laptop the claim refers to
    #[sea_orm(
        belongs_to = "super::laptop::Entity",
        from = "Column::LaptopId",
        to = "super::laptop::Column::Id"
    )]
    Laptop,
    /// The account that filed the claim
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::UserId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
