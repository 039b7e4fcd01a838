//! Catalog business logic - laptop records and their stock counts.
//!
//! Stock is only ever changed through [`adjust_stock`] and [`set_stock`].
//! `adjust_stock` is a single conditional `UPDATE`, so concurrent sales can
//! never drive a laptop below zero units.

use crate::{
    core::money,
    entities::{Laptop, LaptopColumn, laptop},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
    sea_query::{Expr, Func},
};
use tracing::{debug, info, instrument};

/// Editable fields of a laptop. Used for both creation and full replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaptopSpec {
    /// Model name
    pub name: String,
    /// Manufacturer
    pub brand: String,
    /// CPU descriptor
    pub cpu: String,
    /// Memory in GB
    pub ram: i32,
    /// Operating system
    pub os: String,
    /// Chassis color
    pub color: String,
    /// Unit price, at most two fractional digits
    pub price: Decimal,
    /// Units on hand
    pub stock_quantity: i32,
}

impl LaptopSpec {
    fn validate(&self) -> Result<i64> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("laptop name cannot be empty"));
        }
        if self.brand.trim().is_empty() {
            return Err(Error::validation("brand cannot be empty"));
        }
        if self.ram <= 0 {
            return Err(Error::validation("RAM must be a positive number of GB"));
        }
        if self.stock_quantity < 0 {
            return Err(Error::validation("stock quantity cannot be negative"));
        }
        if self.price.is_sign_negative() {
            return Err(Error::InvalidAmount {
                amount: self.price.to_string(),
            });
        }
        money::to_cents(self.price)
    }
}

/// Retrieves a laptop by its ID.
pub async fn get_laptop_by_id<C>(db: &C, laptop_id: i64) -> Result<Option<laptop::Model>>
where
    C: ConnectionTrait,
{
    Laptop::find_by_id(laptop_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every laptop, ordered by ID.
pub async fn get_all_laptops(db: &DatabaseConnection) -> Result<Vec<laptop::Model>> {
    Laptop::find()
        .order_by_asc(LaptopColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds a laptop to the catalog.
///
/// # Errors
/// Returns a validation error for an empty name or brand, non-positive RAM,
/// negative stock, or a price with more than two fractional digits.
#[instrument(skip(db, spec), fields(name = %spec.name))]
pub async fn create_laptop(db: &DatabaseConnection, spec: LaptopSpec) -> Result<laptop::Model> {
    let price_cents = spec.validate()?;
    let laptop = laptop::ActiveModel {
        name: Set(spec.name.trim().to_string()),
        brand: Set(spec.brand.trim().to_string()),
        cpu: Set(spec.cpu.trim().to_string()),
        ram: Set(spec.ram),
        os: Set(spec.os.trim().to_string()),
        color: Set(spec.color.trim().to_string()),
        price_cents: Set(price_cents),
        stock_quantity: Set(spec.stock_quantity),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(laptop_id = laptop.id, "Laptop added to catalog");
    Ok(laptop)
}

/// Replaces every editable field of an existing laptop.
///
/// Prices already captured in carts and order lines are unaffected.
#[instrument(skip(db, spec))]
pub async fn update_laptop(
    db: &DatabaseConnection,
    laptop_id: i64,
    spec: LaptopSpec,
) -> Result<laptop::Model> {
    let price_cents = spec.validate()?;
    let existing = get_laptop_by_id(db, laptop_id)
        .await?
        .ok_or_else(|| Error::not_found("laptop", laptop_id))?;

    let mut active: laptop::ActiveModel = existing.into();
    active.name = Set(spec.name.trim().to_string());
    active.brand = Set(spec.brand.trim().to_string());
    active.cpu = Set(spec.cpu.trim().to_string());
    active.ram = Set(spec.ram);
    active.os = Set(spec.os.trim().to_string());
    active.color = Set(spec.color.trim().to_string());
    active.price_cents = Set(price_cents);
    active.stock_quantity = Set(spec.stock_quantity);
    active.update(db).await.map_err(Into::into)
}

/// Removes a laptop from the catalog.
///
/// # Errors
/// Returns [`Error::NotFound`] if no laptop has this ID. Laptops referenced by
/// orders cannot be deleted while foreign keys are enforced.
#[instrument(skip(db))]
pub async fn delete_laptop(db: &DatabaseConnection, laptop_id: i64) -> Result<()> {
    let result = Laptop::delete_by_id(laptop_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("laptop", laptop_id));
    }
    info!(laptop_id, "Laptop removed from catalog");
    Ok(())
}

/// Finds laptops whose name contains `term`, ignoring case.
pub async fn search_by_name(db: &DatabaseConnection, term: &str) -> Result<Vec<laptop::Model>> {
    let pattern = format!("%{}%", term.trim().to_lowercase());
    Laptop::find()
        .filter(Expr::expr(Func::lower(Expr::col(LaptopColumn::Name))).like(pattern))
        .order_by_asc(LaptopColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Laptops of exactly this brand.
pub async fn filter_by_brand(db: &DatabaseConnection, brand: &str) -> Result<Vec<laptop::Model>> {
    Laptop::find()
        .filter(LaptopColumn::Brand.eq(brand.trim()))
        .order_by_asc(LaptopColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Laptops with exactly this much RAM.
pub async fn filter_by_ram(db: &DatabaseConnection, ram: i32) -> Result<Vec<laptop::Model>> {
    Laptop::find()
        .filter(LaptopColumn::Ram.eq(ram))
        .order_by_asc(LaptopColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Laptops shipping with exactly this operating system.
pub async fn filter_by_os(db: &DatabaseConnection, os: &str) -> Result<Vec<laptop::Model>> {
    Laptop::find()
        .filter(LaptopColumn::Os.eq(os.trim()))
        .order_by_asc(LaptopColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `stock = stock + delta` as one conditional statement.
///
/// The update only matches when the result stays within `0..=i32::MAX`:
/// `UPDATE laptops SET stock_quantity = stock_quantity + ? WHERE id = ? AND stock_quantity >= -?`
/// for a sale, `... AND stock_quantity <= i32::MAX - ?` for a return or restock.
/// Runs on whatever connection or transaction it is given, so callers can
/// make it part of a larger unit of work.
///
/// # Returns
/// The laptop as it is after the update
///
/// # Errors
/// * [`Error::NotFound`] if the laptop does not exist
/// * [`Error::InsufficientStock`] if the delta would drive stock below zero;
///   stock is left unchanged
/// * Validation error if the delta would overflow the stock count
#[instrument(skip(db))]
pub async fn adjust_stock<C>(db: &C, laptop_id: i64, delta: i32) -> Result<laptop::Model>
where
    C: ConnectionTrait,
{
    let result = Laptop::update_many()
        .col_expr(
            LaptopColumn::StockQuantity,
            Expr::col(LaptopColumn::StockQuantity).add(delta),
        )
        .filter(LaptopColumn::Id.eq(laptop_id))
        .filter(if delta < 0 {
            LaptopColumn::StockQuantity.gte(delta.saturating_neg())
        } else {
            LaptopColumn::StockQuantity.lte(i32::MAX - delta)
        })
        .exec(db)
        .await?;

    let laptop = get_laptop_by_id(db, laptop_id)
        .await?
        .ok_or_else(|| Error::not_found("laptop", laptop_id))?;

    if result.rows_affected == 0 && delta > 0 {
        return Err(Error::validation(format!(
            "stock for laptop {laptop_id} cannot exceed {}",
            i32::MAX
        )));
    }
    if result.rows_affected == 0 {
        return Err(Error::InsufficientStock {
            laptop_id,
            available: laptop.stock_quantity,
            requested: delta.saturating_neg(),
        });
    }

    debug!(laptop_id, delta, stock = laptop.stock_quantity, "Stock adjusted");
    Ok(laptop)
}

/// Overwrites the stock count with an absolute value.
///
/// # Errors
/// Returns a validation error for a negative quantity and
/// [`Error::NotFound`] for an unknown laptop.
#[instrument(skip(db))]
pub async fn set_stock<C>(db: &C, laptop_id: i64, quantity: i32) -> Result<laptop::Model>
where
    C: ConnectionTrait,
{
    if quantity < 0 {
        return Err(Error::validation("stock quantity cannot be negative"));
    }
    let result = Laptop::update_many()
        .col_expr(LaptopColumn::StockQuantity, Expr::value(quantity))
        .filter(LaptopColumn::Id.eq(laptop_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("laptop", laptop_id));
    }
    info!(laptop_id, quantity, "Stock set");
    get_laptop_by_id(db, laptop_id)
        .await?
        .ok_or_else(|| Error::not_found("laptop", laptop_id))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_laptop_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut spec = laptop_spec("ThinkPad", 3);
        spec.name = "  ".to_string();
        let result = create_laptop(&db, spec).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let mut spec = laptop_spec("ThinkPad", 3);
        spec.stock_quantity = -1;
        let result = create_laptop(&db, spec).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let mut spec = laptop_spec("ThinkPad", 3);
        spec.price = Decimal::new(10_001, 3);
        let result = create_laptop(&db, spec).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_fetch_laptop() -> Result<()> {
        let db = setup_test_db().await?;
        let laptop = create_test_laptop(&db, "XPS 13", 4).await?;

        let fetched = get_laptop_by_id(&db, laptop.id).await?.unwrap();
        assert_eq!(fetched.name, "XPS 13");
        assert_eq!(fetched.price(), Decimal::new(129_999, 2));
        assert_eq!(fetched.stock_quantity, 4);

        assert!(get_laptop_by_id(&db, 9999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_laptop_replaces_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let laptop = create_test_laptop(&db, "XPS 13", 4).await?;

        let mut spec = laptop_spec("XPS 13 Plus", 6);
        spec.price = Decimal::new(149_900, 2);
        let updated = update_laptop(&db, laptop.id, spec).await?;
        assert_eq!(updated.name, "XPS 13 Plus");
        assert_eq!(updated.price_cents, 149_900);
        assert_eq!(updated.stock_quantity, 6);

        let missing = update_laptop(&db, 9999, laptop_spec("Ghost", 1)).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_laptop() -> Result<()> {
        let db = setup_test_db().await?;
        let laptop = create_test_laptop(&db, "Swift 3", 2).await?;

        delete_laptop(&db, laptop.id).await?;
        assert!(get_laptop_by_id(&db, laptop.id).await?.is_none());

        let again = delete_laptop(&db, laptop.id).await;
        assert_eq!(again.unwrap_err().kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_laptop(&db, "ThinkPad X1 Carbon", 2).await?;
        create_test_laptop(&db, "MacBook Air", 2).await?;

        let found = search_by_name(&db, "thinkpad").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ThinkPad X1 Carbon");

        let found = search_by_name(&db, "AIR").await?;
        assert_eq!(found.len(), 1);

        assert!(search_by_name(&db, "zenbook").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_filters_match_exactly() -> Result<()> {
        let db = setup_test_db().await?;
        let mut spec = laptop_spec("MacBook Pro", 2);
        spec.brand = "Apple".to_string();
        spec.ram = 32;
        spec.os = "macOS".to_string();
        create_laptop(&db, spec).await?;
        create_test_laptop(&db, "XPS 15", 2).await?;

        assert_eq!(filter_by_brand(&db, "Apple").await?.len(), 1);
        assert_eq!(filter_by_ram(&db, 32).await?.len(), 1);
        assert_eq!(filter_by_ram(&db, 16).await?.len(), 1);
        assert_eq!(filter_by_os(&db, "macOS").await?.len(), 1);
        assert!(filter_by_brand(&db, "Asus").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_stock_applies_delta() -> Result<()> {
        let db = setup_test_db().await?;
        let laptop = create_test_laptop(&db, "XPS 13", 3).await?;

        let after = adjust_stock(&db, laptop.id, -2).await?;
        assert_eq!(after.stock_quantity, 1);

        let after = adjust_stock(&db, laptop.id, 5).await?;
        assert_eq!(after.stock_quantity, 6);

        let after = adjust_stock(&db, laptop.id, -6).await?;
        assert_eq!(after.stock_quantity, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_stock_never_goes_negative() -> Result<()> {
        let db = setup_test_db().await?;
        let laptop = create_test_laptop(&db, "XPS 13", 1).await?;

        let result = adjust_stock(&db, laptop.id, -2).await;
        match result {
            Err(Error::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("expected insufficient stock, got {other:?}"),
        }

        let unchanged = get_laptop_by_id(&db, laptop.id).await?.unwrap();
        assert_eq!(unchanged.stock_quantity, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_stock_unknown_laptop() -> Result<()> {
        let db = setup_test_db().await?;
        let result = adjust_stock(&db, 42, 1).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_stock_cannot_overflow() -> Result<()> {
        let db = setup_test_db().await?;
        let laptop = create_test_laptop(&db, "XPS 13", 5).await?;

        let result = adjust_stock(&db, laptop.id, i32::MAX).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        let unchanged = get_laptop_by_id(&db, laptop.id).await?.unwrap();
        assert_eq!(unchanged.stock_quantity, 5);

        let full = adjust_stock(&db, laptop.id, i32::MAX - 5).await?;
        assert_eq!(full.stock_quantity, i32::MAX);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let laptop = create_test_laptop(&db, "XPS 13", 3).await?;

        assert_eq!(set_stock(&db, laptop.id, 12).await?.stock_quantity, 12);
        assert!(matches!(
            set_stock(&db, laptop.id, -1).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            set_stock(&db, 9999, 1).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
