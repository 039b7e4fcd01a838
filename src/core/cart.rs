//! Cart holder - per-account shopping carts kept in memory.
//!
//! Each account gets its own [`Cart`] behind its own async mutex, so
//! concurrent requests for one account are serialized while different
//! accounts never contend. Catalog lookups happen before the cart lock is
//! taken. Carts are never persisted.

use crate::{
    core::{
        catalog,
        order::{LineItem, OrderDraft},
    },
    entities::{OrderStatus, PaymentMethod, PaymentStatus},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// One laptop in a cart, priced at the moment it was first added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Laptop name captured at add time, for display
    pub name: String,
    /// Laptop, quantity and captured price
    pub item: LineItem,
}

/// The lines of one account's cart, in the order they were first added.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|line| line.item.subtotal()).sum()
    }

    /// Units of `laptop_id` already in the cart.
    #[must_use]
    pub fn quantity_of(&self, laptop_id: i64) -> i32 {
        self.line(laptop_id).map_or(0, |line| line.item.quantity())
    }

    fn line(&self, laptop_id: i64) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.item.laptop_id() == laptop_id)
    }

    fn line_mut(&mut self, laptop_id: i64) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.item.laptop_id() == laptop_id)
    }

    fn remove(&mut self, laptop_id: i64) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.item.laptop_id() != laptop_id);
        self.lines.len() != before
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Builds a pending, unpaid order draft from the current lines.
    #[must_use]
    pub fn snapshot(
        &self,
        user_id: i64,
        payment_method: PaymentMethod,
        shipping_address: &str,
    ) -> OrderDraft {
        OrderDraft {
            user_id,
            status: OrderStatus::Pending,
            payment_method,
            payment_status: PaymentStatus::Unpaid,
            shipping_address: shipping_address.trim().to_string(),
            lines: self.lines.iter().map(|line| line.item.clone()).collect(),
        }
    }
}

/// Every live cart, keyed by account ID.
#[derive(Debug, Default)]
pub struct CartRegistry {
    carts: Mutex<HashMap<i64, Arc<Mutex<Cart>>>>,
}

impl CartRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cart for `account_id`, created empty on first use.
    ///
    /// Lock the returned handle to read or change the cart.
    pub async fn cart(&self, account_id: i64) -> Arc<Mutex<Cart>> {
        let mut carts = self.carts.lock().await;
        Arc::clone(carts.entry(account_id).or_default())
    }

    /// Adds `quantity` units of a laptop to the account's cart.
    ///
    /// A new line captures the laptop's current price and name. Adding a
    /// laptop that is already in the cart increments its quantity, and the
    /// combined quantity is checked against stock again.
    ///
    /// # Errors
    /// * Validation error for a non-positive quantity
    /// * [`Error::NotFound`] for an unknown laptop
    /// * [`Error::InsufficientStock`] if stock cannot cover the cart quantity
    #[instrument(skip(self, db))]
    pub async fn add<C>(
        &self,
        db: &C,
        account_id: i64,
        laptop_id: i64,
        quantity: i32,
    ) -> Result<CartLine>
    where
        C: ConnectionTrait,
    {
        if quantity <= 0 {
            return Err(Error::validation("quantity must be positive"));
        }
        let laptop = catalog::get_laptop_by_id(db, laptop_id)
            .await?
            .ok_or_else(|| Error::not_found("laptop", laptop_id))?;

        let handle = self.cart(account_id).await;
        let mut cart = handle.lock().await;

        let wanted = cart
            .quantity_of(laptop_id)
            .checked_add(quantity)
            .ok_or_else(|| Error::validation("quantity is too large"))?;
        if wanted > laptop.stock_quantity {
            return Err(Error::InsufficientStock {
                laptop_id,
                available: laptop.stock_quantity,
                requested: wanted,
            });
        }

        let line = if let Some(line) = cart.line_mut(laptop_id) {
            line.item.set_quantity(wanted)?;
            line.clone()
        } else {
            let line = CartLine {
                name: laptop.name.clone(),
                item: LineItem::new(laptop_id, quantity, laptop.price_cents)?,
            };
            cart.lines.push(line.clone());
            line
        };
        debug!(account_id, laptop_id, quantity = wanted, "Cart line updated");
        Ok(line)
    }

    /// Replaces the quantity of a line already in the cart. A quantity of zero
    /// removes the line.
    ///
    /// # Errors
    /// * Validation error for a negative quantity
    /// * [`Error::NotFound`] if the laptop is not in the cart or no longer exists
    /// * [`Error::InsufficientStock`] if current stock cannot cover `quantity`
    #[instrument(skip(self, db))]
    pub async fn set_quantity<C>(
        &self,
        db: &C,
        account_id: i64,
        laptop_id: i64,
        quantity: i32,
    ) -> Result<Option<CartLine>>
    where
        C: ConnectionTrait,
    {
        if quantity < 0 {
            return Err(Error::validation("quantity cannot be negative"));
        }
        if quantity == 0 {
            self.remove(account_id, laptop_id).await?;
            return Ok(None);
        }
        let laptop = catalog::get_laptop_by_id(db, laptop_id)
            .await?
            .ok_or_else(|| Error::not_found("laptop", laptop_id))?;
        if quantity > laptop.stock_quantity {
            return Err(Error::InsufficientStock {
                laptop_id,
                available: laptop.stock_quantity,
                requested: quantity,
            });
        }

        let handle = self.cart(account_id).await;
        let mut cart = handle.lock().await;
        let line = cart
            .line_mut(laptop_id)
            .ok_or_else(|| Error::not_found("cart line for laptop", laptop_id))?;
        line.item.set_quantity(quantity)?;
        Ok(Some(line.clone()))
    }

    /// Removes a laptop from the account's cart.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if the laptop is not in the cart.
    pub async fn remove(&self, account_id: i64, laptop_id: i64) -> Result<()> {
        let handle = self.cart(account_id).await;
        let mut cart = handle.lock().await;
        if cart.remove(laptop_id) {
            Ok(())
        } else {
            Err(Error::not_found("cart line for laptop", laptop_id))
        }
    }

    /// Empties the account's cart.
    pub async fn clear(&self, account_id: i64) {
        let handle = self.cart(account_id).await;
        handle.lock().await.clear();
    }

    /// Copy of the account's cart lines.
    pub async fn lines(&self, account_id: i64) -> Vec<CartLine> {
        let handle = self.cart(account_id).await;
        let cart = handle.lock().await;
        cart.lines().to_vec()
    }

    /// Sum of the account's line subtotals.
    pub async fn total(&self, account_id: i64) -> Decimal {
        let handle = self.cart(account_id).await;
        let cart = handle.lock().await;
        cart.total()
    }

    /// Pending, unpaid order draft built from the account's cart.
    pub async fn snapshot(
        &self,
        account_id: i64,
        payment_method: PaymentMethod,
        shipping_address: &str,
    ) -> OrderDraft {
        let handle = self.cart(account_id).await;
        let cart = handle.lock().await;
        cart.snapshot(account_id, payment_method, shipping_address)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog::update_laptop;
    use crate::errors::ErrorKind;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_add_captures_price_and_name() -> Result<()> {
        let (db, laptop) = setup_with_laptop(3).await?;
        let carts = CartRegistry::new();

        let line = carts.add(&db, 1, laptop.id, 2).await?;
        assert_eq!(line.name, laptop.name);
        assert_eq!(line.item.unit_price_cents(), laptop.price_cents);
        assert_eq!(line.item.subtotal_cents(), 2 * laptop.price_cents);
        assert_eq!(carts.total(1).await, laptop.price() * Decimal::from(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_repeat_add_merges_and_revalidates() -> Result<()> {
        let (db, laptop) = setup_with_laptop(3).await?;
        let carts = CartRegistry::new();

        carts.add(&db, 1, laptop.id, 2).await?;
        let merged = carts.add(&db, 1, laptop.id, 1).await?;
        assert_eq!(merged.item.quantity(), 3);
        assert_eq!(carts.lines(1).await.len(), 1);

        let err = carts.add(&db, 1, laptop.id, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(carts.lines(1).await[0].item.quantity(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_validates_input() -> Result<()> {
        let (db, laptop) = setup_with_laptop(3).await?;
        let carts = CartRegistry::new();

        let zero = carts.add(&db, 1, laptop.id, 0).await;
        assert!(matches!(zero, Err(Error::Validation { .. })));

        let missing = carts.add(&db, 1, 9999, 1).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        let too_many = carts.add(&db, 1, laptop.id, 4).await;
        assert!(matches!(too_many, Err(Error::InsufficientStock { .. })));
        assert!(carts.lines(1).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_captured_price_ignores_catalog_changes() -> Result<()> {
        let (db, laptop) = setup_with_laptop(3).await?;
        let carts = CartRegistry::new();
        carts.add(&db, 1, laptop.id, 1).await?;

        let mut spec = laptop_spec(&laptop.name, 3);
        spec.price = Decimal::from(1);
        update_laptop(&db, laptop.id, spec).await?;

        let merged = carts.add(&db, 1, laptop.id, 1).await?;
        assert_eq!(merged.item.unit_price_cents(), laptop.price_cents);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_quantity_and_remove() -> Result<()> {
        let (db, laptop) = setup_with_laptop(5).await?;
        let carts = CartRegistry::new();
        carts.add(&db, 1, laptop.id, 1).await?;

        let line = carts.set_quantity(&db, 1, laptop.id, 4).await?.unwrap();
        assert_eq!(line.item.quantity(), 4);
        assert_eq!(line.item.subtotal_cents(), 4 * laptop.price_cents);

        let over = carts.set_quantity(&db, 1, laptop.id, 6).await;
        assert!(matches!(over, Err(Error::InsufficientStock { .. })));

        assert!(carts.set_quantity(&db, 1, laptop.id, 0).await?.is_none());
        assert!(carts.lines(1).await.is_empty());

        let gone = carts.remove(1, laptop.id).await;
        assert!(matches!(gone, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_carts_are_per_account() -> Result<()> {
        let (db, laptop) = setup_with_laptop(5).await?;
        let carts = CartRegistry::new();
        carts.add(&db, 1, laptop.id, 2).await?;
        carts.add(&db, 2, laptop.id, 1).await?;

        carts.clear(1).await;
        assert!(carts.lines(1).await.is_empty());
        assert_eq!(carts.lines(2).await[0].item.quantity(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_is_pending_unpaid() -> Result<()> {
        let (db, laptop) = setup_with_laptop(5).await?;
        let carts = CartRegistry::new();
        carts.add(&db, 7, laptop.id, 2).await?;

        let draft = carts
            .snapshot(7, PaymentMethod::BankTransfer, " 12 High St ")
            .await;
        assert_eq!(draft.user_id, 7);
        assert_eq!(draft.status, OrderStatus::Pending);
        assert_eq!(draft.payment_status, PaymentStatus::Unpaid);
        assert_eq!(draft.shipping_address, "12 High St");
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.total_cents()?, 2 * laptop.price_cents);
        Ok(())
    }
}
