//! Order store - order headers and their lines.
//!
//! Reads always come back as [`OrderWithLines`] so callers never see a header
//! without its lines. Writes that belong to a larger unit of work are generic
//! over [`ConnectionTrait`] and run on the caller's transaction.

use crate::{
    core::money,
    entities::{
        Order, OrderColumn, OrderItem, OrderItemColumn, OrderStatus, PaymentMethod, PaymentStatus,
        order, order_item,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};
use tracing::{info, instrument};

/// A priced line that has not been persisted yet.
///
/// The subtotal is recomputed every time the quantity or the unit price
/// changes, so it always equals `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    laptop_id: i64,
    quantity: i32,
    unit_price_cents: i64,
    subtotal_cents: i64,
}

impl LineItem {
    /// Creates a line for `quantity` units at `unit_price_cents` each.
    ///
    /// # Errors
    /// Returns a validation error for a non-positive quantity or a negative
    /// price, and [`Error::InvalidAmount`] if the subtotal overflows.
    pub fn new(laptop_id: i64, quantity: i32, unit_price_cents: i64) -> Result<Self> {
        let mut line = Self {
            laptop_id,
            quantity: 1,
            unit_price_cents: 0,
            subtotal_cents: 0,
        };
        line.set_unit_price_cents(unit_price_cents)?;
        line.set_quantity(quantity)?;
        Ok(line)
    }

    /// Laptop this line refers to.
    #[must_use]
    pub const fn laptop_id(&self) -> i64 {
        self.laptop_id
    }

    /// Units on this line.
    #[must_use]
    pub const fn quantity(&self) -> i32 {
        self.quantity
    }

    /// Unit price in cents.
    #[must_use]
    pub const fn unit_price_cents(&self) -> i64 {
        self.unit_price_cents
    }

    /// `quantity * unit_price` in cents.
    #[must_use]
    pub const fn subtotal_cents(&self) -> i64 {
        self.subtotal_cents
    }

    /// Unit price as a decimal.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        money::from_cents(self.unit_price_cents)
    }

    /// Subtotal as a decimal.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        money::from_cents(self.subtotal_cents)
    }

    /// Changes the quantity and recomputes the subtotal.
    pub fn set_quantity(&mut self, quantity: i32) -> Result<()> {
        if quantity <= 0 {
            return Err(Error::validation("quantity must be positive"));
        }
        self.subtotal_cents = money::line_subtotal_cents(self.unit_price_cents, quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    /// Changes the unit price and recomputes the subtotal.
    pub fn set_unit_price_cents(&mut self, unit_price_cents: i64) -> Result<()> {
        if unit_price_cents < 0 {
            return Err(Error::InvalidAmount {
                amount: money::from_cents(unit_price_cents).to_string(),
            });
        }
        self.subtotal_cents = money::line_subtotal_cents(unit_price_cents, self.quantity)?;
        self.unit_price_cents = unit_price_cents;
        Ok(())
    }
}

/// An order that exists only in memory, built from a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    /// Customer placing the order
    pub user_id: i64,
    /// Always [`OrderStatus::Pending`] for a fresh draft
    pub status: OrderStatus,
    /// Chosen payment method
    pub payment_method: PaymentMethod,
    /// Always [`PaymentStatus::Unpaid`] for a fresh draft
    pub payment_status: PaymentStatus,
    /// Delivery address
    pub shipping_address: String,
    /// Lines copied from the cart
    pub lines: Vec<LineItem>,
}

impl OrderDraft {
    /// Sum of line subtotals in cents.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAmount`] on overflow.
    pub fn total_cents(&self) -> Result<i64> {
        self.lines.iter().try_fold(0_i64, |acc, line| {
            acc.checked_add(line.subtotal_cents())
                .ok_or_else(|| Error::InvalidAmount {
                    amount: "order total".to_string(),
                })
        })
    }
}

/// A persisted order header together with all of its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithLines {
    /// Header row
    pub order: order::Model,
    /// Line rows, in insertion order
    pub lines: Vec<order_item::Model>,
}

impl OrderWithLines {
    /// Stored order total.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.order.total_amount()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }
}

/// Inserts an order header and returns it with its generated ID.
///
/// The stored total is the sum of the draft's line subtotals.
#[instrument(skip(db, draft), fields(user_id = draft.user_id))]
pub async fn create_order<C>(db: &C, draft: &OrderDraft) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    if draft.shipping_address.trim().is_empty() {
        return Err(Error::validation("shipping address cannot be empty"));
    }
    order::ActiveModel {
        user_id: Set(draft.user_id),
        order_date: Set(Utc::now()),
        status: Set(draft.status),
        total_amount_cents: Set(draft.total_cents()?),
        payment_method: Set(draft.payment_method),
        payment_status: Set(draft.payment_status),
        shipping_address: Set(draft.shipping_address.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts one line for an existing order.
pub async fn add_line<C>(db: &C, order_id: i64, line: &LineItem) -> Result<order_item::Model>
where
    C: ConnectionTrait,
{
    order_item::ActiveModel {
        order_id: Set(order_id),
        laptop_id: Set(line.laptop_id()),
        quantity: Set(line.quantity()),
        unit_price_cents: Set(line.unit_price_cents()),
        subtotal_cents: Set(line.subtotal_cents()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Retrieves an order with its lines attached.
pub async fn get_order_by_id<C>(db: &C, order_id: i64) -> Result<Option<OrderWithLines>>
where
    C: ConnectionTrait,
{
    let Some(order) = Order::find_by_id(order_id).one(db).await? else {
        return Ok(None);
    };
    let lines = order
        .find_related(OrderItem)
        .order_by_asc(OrderItemColumn::Id)
        .all(db)
        .await?;
    Ok(Some(OrderWithLines { order, lines }))
}

async fn load_with_lines<C>(db: &C, query: Select<Order>) -> Result<Vec<OrderWithLines>>
where
    C: ConnectionTrait,
{
    let rows = query
        .order_by_asc(OrderColumn::OrderDate)
        .order_by_asc(OrderColumn::Id)
        .find_with_related(OrderItem)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(order, lines)| OrderWithLines { order, lines })
        .collect())
}

/// Every order, oldest first.
pub async fn get_all_orders(db: &DatabaseConnection) -> Result<Vec<OrderWithLines>> {
    load_with_lines(db, Order::find()).await
}

/// Orders placed by one account, oldest first.
pub async fn get_orders_by_account(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<Vec<OrderWithLines>> {
    load_with_lines(db, Order::find().filter(OrderColumn::UserId.eq(account_id))).await
}

/// Orders currently in `status`, oldest first.
pub async fn get_orders_by_status(
    db: &DatabaseConnection,
    status: OrderStatus,
) -> Result<Vec<OrderWithLines>> {
    load_with_lines(db, Order::find().filter(OrderColumn::Status.eq(status))).await
}

/// Orders placed in `[start, end)`, oldest first.
pub async fn get_orders_between(
    db: &DatabaseConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<OrderWithLines>> {
    load_with_lines(
        db,
        Order::find()
            .filter(OrderColumn::OrderDate.gte(start))
            .filter(OrderColumn::OrderDate.lt(end)),
    )
    .await
}

/// Sets an order's status. Administrators may move between any two statuses;
/// stock is not touched (use [`crate::core::checkout::cancel_order`] to
/// cancel with a stock refund).
#[instrument(skip(db))]
pub async fn update_order_status<C>(
    db: &C,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;
    let previous = order.status;
    let mut active: order::ActiveModel = order.into();
    active.status = Set(status);
    let updated = active.update(db).await?;
    info!(order_id, %previous, %status, "Order status updated");
    Ok(updated)
}

/// Marks an order as paid or unpaid.
#[instrument(skip(db))]
pub async fn update_payment_status(
    db: &DatabaseConnection,
    order_id: i64,
    payment_status: PaymentStatus,
) -> Result<order::Model> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;
    let mut active: order::ActiveModel = order.into();
    active.payment_status = Set(payment_status);
    let updated = active.update(db).await?;
    info!(order_id, %payment_status, "Payment status updated");
    Ok(updated)
}

/// Deletes an order, removing its lines before the header.
#[instrument(skip(db))]
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    OrderItem::delete_many()
        .filter(OrderItemColumn::OrderId.eq(order_id))
        .exec(&txn)
        .await?;
    let result = Order::delete_by_id(order_id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("order", order_id));
    }
    txn.commit().await?;
    info!(order_id, "Order deleted");
    Ok(())
}
