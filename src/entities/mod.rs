//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod enums;
pub mod import_receipt;
pub mod laptop;
pub mod order;
pub mod order_item;
pub mod warranty_request;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use enums::{OrderStatus, PaymentMethod, PaymentStatus, Role, WarrantyStatus};
pub use import_receipt::{
    Column as ImportReceiptColumn, Entity as ImportReceipt, Model as ImportReceiptModel,
};
pub use laptop::{Column as LaptopColumn, Entity as Laptop, Model as LaptopModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use warranty_request::{
    Column as WarrantyRequestColumn, Entity as WarrantyRequest, Model as WarrantyRequestModel,
};
