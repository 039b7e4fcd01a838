//! Order placement workflow - turning a cart into an order and undoing it.
//!
//! Placement and cancellation each run as one database transaction behind an
//! in-process write gate. Every step goes through the transaction handle; if
//! any step fails the transaction is dropped uncommitted and rolled back, so
//! no order row, line, or stock change survives. Locks are always taken in
//! the same order: the account's cart, then the write gate, then the
//! transaction.

use crate::{
    core::{
        account::{self, Session},
        cart::CartRegistry,
        catalog,
        order::{self, OrderWithLines},
    },
    entities::{Order, OrderColumn, OrderStatus, PaymentMethod},
    errors::{Error, Result},
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait, sea_query::Expr,
};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Serializes multi-statement writes within this process.
pub type WriteGate = Mutex<()>;

/// Places an order for everything in the account's cart.
///
/// The order is stored as PENDING and UNPAID with one line per cart line at
/// the captured unit price; each line's quantity is taken from stock with a
/// conditional update. An empty `shipping_address` falls back to the
/// account's address. On success the cart is cleared and the stored order is
/// returned with its lines.
///
/// # Errors
/// * Validation error if the cart is empty or no address is available
/// * [`Error::NotFound`] if the account or a laptop no longer exists
/// * [`Error::InsufficientStock`] if any line exceeds current stock
///
/// On any error nothing is persisted and the cart is left as it was.
#[instrument(skip(db, carts, gate, shipping_address))]
pub async fn place_order(
    db: &DatabaseConnection,
    carts: &CartRegistry,
    gate: &WriteGate,
    account_id: i64,
    payment_method: PaymentMethod,
    shipping_address: &str,
) -> Result<OrderWithLines> {
    let handle = carts.cart(account_id).await;
    let mut cart = handle.lock().await;
    if cart.is_empty() {
        return Err(Error::validation("cart is empty"));
    }

    let _guard = gate.lock().await;
    let txn = db.begin().await?;

    let account = account::get_account_by_id(&txn, account_id)
        .await?
        .ok_or_else(|| Error::not_found("account", account_id))?;
    let address = if shipping_address.trim().is_empty() {
        account.address.as_str()
    } else {
        shipping_address
    };
    let draft = cart.snapshot(account_id, payment_method, address);

    let header = order::create_order(&txn, &draft).await?;
    for line in &draft.lines {
        order::add_line(&txn, header.id, line).await?;
        catalog::adjust_stock(&txn, line.laptop_id(), -line.quantity()).await?;
    }
    let placed = order::get_order_by_id(&txn, header.id)
        .await?
        .ok_or_else(|| Error::not_found("order", header.id))?;
    txn.commit().await?;

    cart.clear();
    info!(
        order_id = placed.order.id,
        lines = placed.lines.len(),
        total = %placed.total(),
        "Order placed"
    );
    Ok(placed)
}

/// Cancels a PENDING order and returns its units to stock.
///
/// Customers may only cancel their own orders; administrators may cancel any.
///
/// # Errors
/// * [`Error::NotFound`] for an unknown order
/// * [`Error::PermissionDenied`] if the order belongs to someone else
/// * [`Error::InvalidTransition`] if the order is not PENDING; nothing changes
#[instrument(skip(db, gate, session), fields(account_id = session.account_id))]
pub async fn cancel_order(
    db: &DatabaseConnection,
    gate: &WriteGate,
    session: &Session,
    order_id: i64,
) -> Result<OrderWithLines> {
    let _guard = gate.lock().await;
    let txn = db.begin().await?;

    let existing = order::get_order_by_id(&txn, order_id)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;
    if existing.order.user_id != session.account_id && !session.is_admin() {
        return Err(Error::PermissionDenied {
            message: format!("order {order_id} belongs to another account"),
        });
    }

    let result = Order::update_many()
        .col_expr(OrderColumn::Status, Expr::value(OrderStatus::Cancelled))
        .filter(OrderColumn::Id.eq(order_id))
        .filter(OrderColumn::Status.eq(OrderStatus::Pending))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        warn!(order_id, status = %existing.order.status, "Cancellation refused");
        return Err(Error::InvalidTransition {
            entity: "order",
            from: existing.order.status.to_string(),
            to: OrderStatus::Cancelled.to_string(),
        });
    }

    for line in &existing.lines {
        catalog::adjust_stock(&txn, line.laptop_id, line.quantity).await?;
    }
    let cancelled = order::get_order_by_id(&txn, order_id)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;
    txn.commit().await?;

    info!(order_id, "Order cancelled and stock restored");
    Ok(cancelled)
}
