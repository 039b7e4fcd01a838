//! Inventory business logic - stock levels, alerts and supplier receipts.

use crate::{
    core::{catalog, money},
    entities::{ImportReceipt, ImportReceiptColumn, Laptop, LaptopColumn, import_receipt, laptop},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::fmt;
use tracing::{info, instrument};

/// Stock at or above this is reported as good.
const MEDIUM_STOCK_CEILING: i32 = 10;

/// Coarse stock level of one laptop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    /// No units left
    OutOfStock,
    /// Below the low-stock threshold
    Low,
    /// Below ten units
    Medium,
    /// Ten units or more
    Good,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OutOfStock => "OUT OF STOCK",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::Good => "GOOD",
        })
    }
}

/// Classifies a stock count against the low-stock threshold.
#[must_use]
pub const fn stock_status(stock_quantity: i32, low_stock_threshold: i32) -> StockStatus {
    if stock_quantity <= 0 {
        StockStatus::OutOfStock
    } else if stock_quantity < low_stock_threshold {
        StockStatus::Low
    } else if stock_quantity < MEDIUM_STOCK_CEILING {
        StockStatus::Medium
    } else {
        StockStatus::Good
    }
}

/// Laptops with fewer units than `threshold`, lowest stock first.
pub async fn low_stock_alerts(db: &DatabaseConnection, threshold: i32) -> Result<Vec<laptop::Model>> {
    Laptop::find()
        .filter(LaptopColumn::StockQuantity.lt(threshold))
        .order_by_asc(LaptopColumn::StockQuantity)
        .order_by_asc(LaptopColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Snapshot of the whole catalog's stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryReport {
    /// Number of catalog entries
    pub product_count: usize,
    /// Units on hand across all laptops
    pub total_units: i64,
    /// Sum of price times stock
    pub total_value: Decimal,
    /// Laptops with no units
    pub out_of_stock: usize,
    /// Laptops below the low-stock threshold but not out of stock
    pub low_stock: usize,
    /// Units on hand per brand, sorted by brand
    pub units_by_brand: Vec<(String, i64)>,
}

/// Summarizes stock levels and inventory value.
#[instrument(skip(db))]
pub async fn inventory_report(db: &DatabaseConnection, low_stock_threshold: i32) -> Result<InventoryReport> {
    let laptops = catalog::get_all_laptops(db).await?;
    summarize(&laptops, low_stock_threshold)
}

fn summarize(laptops: &[laptop::Model], low_stock_threshold: i32) -> Result<InventoryReport> {
    let mut total_units = 0_i64;
    let mut value_cents = 0_i64;
    let mut out_of_stock = 0;
    let mut low_stock = 0;
    let mut units_by_brand: Vec<(String, i64)> = Vec::new();

    for laptop in laptops {
        let units = i64::from(laptop.stock_quantity);
        total_units += units;
        value_cents = laptop
            .price_cents
            .checked_mul(units)
            .and_then(|v| value_cents.checked_add(v))
            .ok_or_else(|| Error::InvalidAmount {
                amount: "inventory value".to_string(),
            })?;
        match stock_status(laptop.stock_quantity, low_stock_threshold) {
            StockStatus::OutOfStock => out_of_stock += 1,
            StockStatus::Low => low_stock += 1,
            StockStatus::Medium | StockStatus::Good => {}
        }
        match units_by_brand.iter_mut().find(|(brand, _)| *brand == laptop.brand) {
            Some((_, brand_units)) => *brand_units += units,
            None => units_by_brand.push((laptop.brand.clone(), units)),
        }
    }
    units_by_brand.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(InventoryReport {
        product_count: laptops.len(),
        total_units,
        total_value: money::from_cents(value_cents),
        out_of_stock,
        low_stock,
        units_by_brand,
    })
}

/// Supplier details recorded with a restock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Supplier {
    /// Supplier company
    pub name: String,
    /// Phone or e-mail
    pub contact: String,
    /// Free-form remarks
    pub notes: Option<String>,
}

/// Records a delivery from a supplier and adds the units to stock.
///
/// The stock increase and the receipt are written in one transaction.
///
/// # Errors
/// * Validation error for a non-positive quantity or empty supplier name
/// * [`Error::NotFound`] for an unknown laptop
#[instrument(skip(db, supplier), fields(supplier = %supplier.name))]
pub async fn receive_stock(
    db: &DatabaseConnection,
    laptop_id: i64,
    quantity: i32,
    supplier: Supplier,
) -> Result<(import_receipt::Model, laptop::Model)> {
    if quantity <= 0 {
        return Err(Error::validation("received quantity must be positive"));
    }
    if supplier.name.trim().is_empty() {
        return Err(Error::validation("supplier name cannot be empty"));
    }

    let txn = db.begin().await?;
    let laptop = catalog::adjust_stock(&txn, laptop_id, quantity).await?;
    let receipt = import_receipt::ActiveModel {
        laptop_id: Set(laptop_id),
        quantity: Set(quantity),
        import_date: Set(Utc::now()),
        supplier_name: Set(supplier.name.trim().to_string()),
        supplier_contact: Set(supplier.contact.trim().to_string()),
        notes: Set(supplier
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(
        laptop_id,
        quantity,
        stock = laptop.stock_quantity,
        "Stock received"
    );
    Ok((receipt, laptop))
}

/// Import receipts, newest first, optionally for one laptop only.
pub async fn list_receipts(
    db: &DatabaseConnection,
    laptop_id: Option<i64>,
) -> Result<Vec<import_receipt::Model>> {
    let mut query = ImportReceipt::find();
    if let Some(laptop_id) = laptop_id {
        query = query.filter(ImportReceiptColumn::LaptopId.eq(laptop_id));
    }
    query
        .order_by_desc(ImportReceiptColumn::ImportDate)
        .order_by_desc(ImportReceiptColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog::{create_laptop, get_laptop_by_id};
    use crate::test_utils::*;

    #[test]
    fn test_stock_status_boundaries() {
        assert_eq!(stock_status(0, 5), StockStatus::OutOfStock);
        assert_eq!(stock_status(-1, 5), StockStatus::OutOfStock);
        assert_eq!(stock_status(4, 5), StockStatus::Low);
        assert_eq!(stock_status(5, 5), StockStatus::Medium);
        assert_eq!(stock_status(9, 5), StockStatus::Medium);
        assert_eq!(stock_status(10, 5), StockStatus::Good);
        assert_eq!(stock_status(2, 3), StockStatus::Low);
        assert_eq!(stock_status(3, 3), StockStatus::Medium);
        assert_eq!(StockStatus::OutOfStock.to_string(), "OUT OF STOCK");
    }

    #[tokio::test]
    async fn test_low_stock_alerts() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_laptop(&db, "Plenty", 20).await?;
        let empty = create_test_laptop(&db, "Empty", 0).await?;
        let few = create_test_laptop(&db, "Few", 3).await?;

        let alerts = low_stock_alerts(&db, 5).await?;
        let ids: Vec<i64> = alerts.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![empty.id, few.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_inventory_report() -> Result<()> {
        let db = setup_test_db().await?;
        let mut spec = laptop_spec("MacBook Air", 2);
        spec.brand = "Apple".to_string();
        spec.price = Decimal::from(1000);
        create_laptop(&db, spec).await?;
        let mut spec = laptop_spec("XPS 13", 12);
        spec.price = Decimal::new(50_050, 2);
        create_laptop(&db, spec).await?;
        let mut spec = laptop_spec("XPS 15", 0);
        spec.price = Decimal::from(2000);
        create_laptop(&db, spec).await?;

        let report = inventory_report(&db, 5).await?;
        assert_eq!(report.product_count, 3);
        assert_eq!(report.total_units, 14);
        assert_eq!(report.total_value, Decimal::from(2000) + Decimal::new(600_600, 2));
        assert_eq!(report.out_of_stock, 1);
        assert_eq!(report.low_stock, 1);
        assert_eq!(
            report.units_by_brand,
            vec![("Apple".to_string(), 2), ("Dell".to_string(), 12)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_receive_stock_records_receipt() -> Result<()> {
        let (db, laptop) = setup_with_laptop(2).await?;
        let supplier = Supplier {
            name: "Acme Distribution".to_string(),
            contact: "sales@acme.test".to_string(),
            notes: Some("  ".to_string()),
        };

        let (receipt, updated) = receive_stock(&db, laptop.id, 8, supplier).await?;
        assert_eq!(updated.stock_quantity, 10);
        assert_eq!(receipt.quantity, 8);
        assert_eq!(receipt.supplier_name, "Acme Distribution");
        assert!(receipt.notes.is_none());

        assert_eq!(list_receipts(&db, Some(laptop.id)).await?.len(), 1);
        assert!(list_receipts(&db, Some(9999)).await?.is_empty());
        assert_eq!(list_receipts(&db, None).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_receive_stock_rejects_bad_input() -> Result<()> {
        let (db, laptop) = setup_with_laptop(2).await?;
        let supplier = Supplier {
            name: "Acme".to_string(),
            ..Supplier::default()
        };

        let zero = receive_stock(&db, laptop.id, 0, supplier.clone()).await;
        assert!(matches!(zero, Err(Error::Validation { .. })));

        let missing = receive_stock(&db, 9999, 3, supplier).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        assert!(list_receipts(&db, None).await?.is_empty());

        let nameless = receive_stock(&db, laptop.id, 3, Supplier::default()).await;
        assert!(matches!(nameless, Err(Error::Validation { .. })));
        assert_eq!(
            get_laptop_by_id(&db, laptop.id).await?.unwrap().stock_quantity,
            2
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_receive_stock_overflow_rolls_back() -> Result<()> {
        let (db, laptop) = setup_with_laptop(5).await?;
        let supplier = Supplier {
            name: "Acme".to_string(),
            ..Supplier::default()
        };

        let err = receive_stock(&db, laptop.id, i32::MAX, supplier)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Validation);
        assert_eq!(
            get_laptop_by_id(&db, laptop.id).await?.unwrap().stock_quantity,
            5
        );
        assert!(list_receipts(&db, None).await?.is_empty());
        Ok(())
    }
}
