//! Shared test utilities for the laptop store.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        account::{self, Profile, Session},
        catalog::{self, LaptopSpec},
        order::{self, LineItem, OrderDraft, OrderWithLines},
    },
    entities::{self, OrderStatus, PaymentMethod, PaymentStatus, Role},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Laptop fields with sensible defaults.
///
/// # Defaults
/// * brand: "Dell"
/// * cpu: "Intel Core i7"
/// * ram: 16
/// * os: "Windows 11"
/// * color: "Silver"
/// * price: 1299.99
#[must_use]
pub fn laptop_spec(name: &str, stock_quantity: i32) -> LaptopSpec {
    LaptopSpec {
        name: name.to_string(),
        brand: "Dell".to_string(),
        cpu: "Intel Core i7".to_string(),
        ram: 16,
        os: "Windows 11".to_string(),
        color: "Silver".to_string(),
        price: Decimal::new(129_999, 2),
        stock_quantity,
    }
}

/// Creates a test laptop from [`laptop_spec`].
pub async fn create_test_laptop(
    db: &DatabaseConnection,
    name: &str,
    stock_quantity: i32,
) -> Result<entities::laptop::Model> {
    catalog::create_laptop(db, laptop_spec(name, stock_quantity)).await
}

/// Contact details used for test customers.
#[must_use]
pub fn test_profile() -> Profile {
    Profile {
        full_name: "Test Customer".to_string(),
        email: "customer@example.com".to_string(),
        phone: "555-0100".to_string(),
        address: "1 Test Street".to_string(),
    }
}

/// Registers a customer with password `"password"` and [`test_profile`].
pub async fn create_test_account(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::account::Model> {
    account::register(db, username, "password", test_profile()).await
}

/// Creates an administrator named `"admin"` and returns its session.
pub async fn test_admin_session(db: &DatabaseConnection) -> Result<Session> {
    let admin =
        account::create_account(db, "admin", "admin-password", Role::Admin, Profile::default())
            .await?;
    Ok(Session::for_account(&admin))
}

/// Writes a PENDING, UNPAID order directly, at current catalog prices.
///
/// Stock is not touched; use the checkout workflow when stock matters.
///
/// # Arguments
/// * `lines` - `(laptop_id, quantity)` pairs
pub async fn create_test_order(
    db: &DatabaseConnection,
    account_id: i64,
    lines: &[(i64, i32)],
) -> Result<OrderWithLines> {
    let mut items = Vec::with_capacity(lines.len());
    for &(laptop_id, quantity) in lines {
        let laptop = catalog::get_laptop_by_id(db, laptop_id)
            .await?
            .ok_or_else(|| Error::not_found("laptop", laptop_id))?;
        items.push(LineItem::new(laptop_id, quantity, laptop.price_cents)?);
    }
    let draft = OrderDraft {
        user_id: account_id,
        status: OrderStatus::Pending,
        payment_method: PaymentMethod::CreditCard,
        payment_status: PaymentStatus::Unpaid,
        shipping_address: "1 Test Street".to_string(),
        lines: items,
    };
    let header = order::create_order(db, &draft).await?;
    for line in &draft.lines {
        order::add_line(db, header.id, line).await?;
    }
    order::get_order_by_id(db, header.id)
        .await?
        .ok_or_else(|| Error::not_found("order", header.id))
}

/// Sets up a test environment with one laptop.
/// Returns (db, laptop).
pub async fn setup_with_laptop(
    stock_quantity: i32,
) -> Result<(DatabaseConnection, entities::laptop::Model)> {
    let db = setup_test_db().await?;
    let laptop = create_test_laptop(&db, "XPS 13", stock_quantity).await?;
    Ok((db, laptop))
}

/// Sets up a test environment with a customer named `"customer"` and one laptop.
/// Returns (db, account, laptop).
pub async fn setup_with_account_and_laptop(
    stock_quantity: i32,
) -> Result<(
    DatabaseConnection,
    entities::account::Model,
    entities::laptop::Model,
)> {
    let (db, laptop) = setup_with_laptop(stock_quantity).await?;
    let account = create_test_account(&db, "customer").await?;
    Ok((db, account, laptop))
}

/// Sets up a customer with one DELIVERED single-laptop order.
/// Returns (db, customer session, order id, laptop id).
pub async fn setup_delivered_order() -> Result<(DatabaseConnection, Session, i64, i64)> {
    let (db, account, laptop) = setup_with_account_and_laptop(5).await?;
    let placed = create_test_order(&db, account.id, &[(laptop.id, 1)]).await?;
    order::update_order_status(&db, placed.order.id, OrderStatus::Delivered).await?;
    Ok((db, Session::for_account(&account), placed.order.id, laptop.id))
}
