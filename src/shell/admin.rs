//! Administrator commands.
//!
//! The dispatcher only calls these with an admin session; the core functions
//! check the role again where they take a session.

use super::{Shop, parse, tables};
use crate::{
    core::{
        account::{self, Profile, Session},
        catalog::{self, LaptopSpec},
        inventory::{self, Supplier},
        money::{self, format_money},
        order, report, warranty,
    },
    entities::{OrderStatus, PaymentStatus, Role, WarrantyStatus},
    errors::{Error, Result},
};
use chrono::{Datelike, Utc};

fn spec_from_args(args: &[String], start: usize) -> Result<LaptopSpec> {
    Ok(LaptopSpec {
        name: parse::required(args, start, "name")?.to_string(),
        brand: parse::required(args, start + 1, "brand")?.to_string(),
        cpu: parse::required(args, start + 2, "cpu")?.to_string(),
        ram: parse::required_value(args, start + 3, "ram")?,
        os: parse::required(args, start + 4, "os")?.to_string(),
        color: parse::required(args, start + 5, "color")?.to_string(),
        price: money::parse_price(parse::required(args, start + 6, "price")?)?,
        stock_quantity: parse::required_value(args, start + 7, "stock")?,
    })
}

/// `laptop-add <name> <brand> <cpu> <ram> <os> <color> <price> <stock>`
pub async fn laptop_add(shop: &Shop, _session: &Session, args: &[String]) -> Result<String> {
    let created = catalog::create_laptop(&shop.database, spec_from_args(args, 0)?).await?;
    Ok(format!(
        "Laptop #{} added.\n{}",
        created.id,
        tables::laptops(std::slice::from_ref(&created), shop.settings.inventory.low_stock_threshold)
    ))
}

/// `laptop-update <id> <name> <brand> <cpu> <ram> <os> <color> <price> <stock>`
pub async fn laptop_update(shop: &Shop, _session: &Session, args: &[String]) -> Result<String> {
    let laptop_id = parse::required_value(args, 0, "id")?;
    let updated =
        catalog::update_laptop(&shop.database, laptop_id, spec_from_args(args, 1)?).await?;
    Ok(format!(
        "Laptop #{} updated.\n{}",
        updated.id,
        tables::laptops(std::slice::from_ref(&updated), shop.settings.inventory.low_stock_threshold)
    ))
}

/// `laptop-delete <id>`
pub async fn laptop_delete(shop: &Shop, _session: &Session, args: &[String]) -> Result<String> {
    let laptop_id = parse::required_value(args, 0, "id")?;
    catalog::delete_laptop(&shop.database, laptop_id).await?;
    Ok(format!("Laptop #{laptop_id} deleted."))
}

/// `stock-set <id> <qty>`
pub async fn stock_set(shop: &Shop, _session: &Session, args: &[String]) -> Result<String> {
    let laptop_id = parse::required_value(args, 0, "id")?;
    let quantity = parse::required_value(args, 1, "qty")?;
    let updated = catalog::set_stock(&shop.database, laptop_id, quantity).await?;
    Ok(format!(
        "{} now has {} units in stock.",
        updated.name, updated.stock_quantity
    ))
}

/// `restock <laptop> <qty> <supplier> [contact] [notes]`
pub async fn restock(shop: &Shop, _session: &Session, args: &[String]) -> Result<String> {
    let laptop_id = parse::required_value(args, 0, "laptop")?;
    let quantity = parse::required_value(args, 1, "qty")?;
    let notes = parse::rest(args, 4);
    let supplier = Supplier {
        name: parse::required(args, 2, "supplier")?.to_string(),
        contact: parse::optional(args, 3).unwrap_or_default().to_string(),
        notes: (!notes.is_empty()).then_some(notes),
    };
    let (receipt, laptop) =
        inventory::receive_stock(&shop.database, laptop_id, quantity, supplier).await?;
    Ok(format!(
        "Receipt #{} recorded: {} units of {} from {}. Stock is now {}.",
        receipt.id, receipt.quantity, laptop.name, receipt.supplier_name, laptop.stock_quantity
    ))
}

/// `receipts [laptop]`
pub async fn receipts(shop: &Shop, _session: &Session, args: &[String]) -> Result<String> {
    let laptop_id = match parse::optional(args, 0) {
        Some(id) => Some(parse::value(id, "laptop")?),
        None => None,
    };
    let found = inventory::list_receipts(&shop.database, laptop_id).await?;
    Ok(tables::receipts(&found))
}

/// `alerts`
pub async fn alerts(shop: &Shop, _session: &Session) -> Result<String> {
    let threshold = shop.settings.inventory.low_stock_threshold;
    let low = inventory::low_stock_alerts(&shop.database, threshold).await?;
    if low.is_empty() {
        return Ok(format!("No laptops below {threshold} units."));
    }
    Ok(tables::laptops(&low, threshold))
}

/// `order-status <id> <STATUS>`
pub async fn order_status(shop: &Shop, _session: &Session, args: &[String]) -> Result<String> {
    let order_id = parse::required_value(args, 0, "id")?;
    let status: OrderStatus = parse::required(args, 1, "status")?.parse()?;
    let updated = order::update_order_status(&shop.database, order_id, status).await?;
    Ok(format!("Order #{} is now {}.", updated.id, updated.status))
}

/// `order-payment <id> <PAID|UNPAID>`
pub async fn order_payment(shop: &Shop, _session: &Session, args: &[String]) -> Result<String> {
    let order_id = parse::required_value(args, 0, "id")?;
    let status: PaymentStatus = parse::required(args, 1, "payment status")?.parse()?;
    let updated = order::update_payment_status(&shop.database, order_id, status).await?;
    Ok(format!(
        "Order #{} payment is now {}.",
        updated.id, updated.payment_status
    ))
}

/// `accounts [search]`
pub async fn accounts(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let term = parse::rest(args, 0);
    let found = if term.is_empty() {
        account::list_accounts(&shop.database, session).await?
    } else {
        account::search_accounts(&shop.database, session, &term).await?
    };
    Ok(tables::accounts(&found))
}

/// `account-add <user> <password> <ADMIN|USER> [name]`
pub async fn account_add(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    session.require_admin()?;
    let username = parse::required(args, 0, "user")?;
    let password = parse::required(args, 1, "password")?;
    let role: Role = parse::required(args, 2, "role")?.parse()?;
    let profile = Profile {
        full_name: parse::rest(args, 3),
        ..Profile::default()
    };
    let created = account::create_account(&shop.database, username, password, role, profile).await?;
    Ok(format!(
        "Account #{} '{}' created with role {}.",
        created.id, created.username, created.role
    ))
}

/// `account-role <id> <ADMIN|USER>`
pub async fn account_role(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let account_id = parse::required_value(args, 0, "id")?;
    let role: Role = parse::required(args, 1, "role")?.parse()?;
    let updated = account::update_role(&shop.database, session, account_id, role).await?;
    Ok(format!("{} is now {}.", updated.username, updated.role))
}

/// `account-reset <id> <password>`
pub async fn account_reset(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let account_id = parse::required_value(args, 0, "id")?;
    let password = parse::required(args, 1, "password")?;
    account::reset_password(&shop.database, session, account_id, password).await?;
    Ok(format!("Password reset for account #{account_id}."))
}

/// `account-delete <id>`
pub async fn account_delete(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let account_id = parse::required_value(args, 0, "id")?;
    account::delete_account(&shop.database, session, account_id).await?;
    shop.carts.clear(account_id).await;
    Ok(format!("Account #{account_id} deleted."))
}

/// `warranty-decide <id> <approve|reject> [notes]`
pub async fn warranty_decide(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let request_id = parse::required_value(args, 0, "id")?;
    let decision = match parse::required(args, 1, "approve|reject")?
        .to_ascii_lowercase()
        .as_str()
    {
        "approve" | "approved" => WarrantyStatus::Approved,
        "reject" | "rejected" => WarrantyStatus::Rejected,
        other => {
            return Err(Error::validation(format!(
                "decision must be approve or reject, got '{other}'"
            )));
        }
    };
    let notes = parse::rest(args, 2);
    let decided =
        warranty::decide_request(&shop.database, session, request_id, decision, &notes).await?;
    Ok(format!("Warranty request #{} {}.", decided.id, decided.status))
}

/// `report daily [YYYY-MM-DD]`, `report monthly [YYYY-MM]`, `report products`,
/// `report brands`, `report customers`, `report inventory`
pub async fn report(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let db = &shop.database;
    let today = Utc::now().date_naive();
    match parse::required(args, 0, "report")?.to_ascii_lowercase().as_str() {
        "daily" => {
            let date = match parse::optional(args, 1) {
                Some(input) => parse::date(input)?,
                None => today,
            };
            let daily = report::generate_daily_report(db, date).await?;
            Ok(tables::daily_report(&daily))
        }
        "monthly" => {
            let (year, month) = match parse::optional(args, 1) {
                Some(input) => parse::year_month(input)?,
                None => (today.year(), today.month()),
            };
            let monthly = report::generate_monthly_report(db, year, month).await?;
            Ok(tables::monthly_report(&monthly))
        }
        "products" => Ok(tables::product_report(
            &report::generate_product_report(db).await?,
        )),
        "brands" => Ok(tables::brand_report(
            &report::generate_brand_report(db).await?,
        )),
        "customers" => {
            let settings = &shop.settings.reports;
            let customers = report::generate_customer_report(db, session, settings).await?;
            Ok(tables::customer_report(&customers, settings.top_customers))
        }
        "inventory" => {
            let summary =
                inventory::inventory_report(db, shop.settings.inventory.low_stock_threshold)
                    .await?;
            Ok(format!(
                "Inventory value {}\n{}",
                format_money(summary.total_value),
                tables::inventory_report(&summary)
            ))
        }
        other => Err(Error::validation(format!("unknown report '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::settings::Settings;
    use crate::test_utils::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_spec_from_args() {
        let spec = spec_from_args(
            &args(&["Zenbook", "Asus", "i5", "8", "Windows 11", "Blue", "$899.50", "3"]),
            0,
        )
        .unwrap();
        assert_eq!(spec.ram, 8);
        assert_eq!(spec.price, rust_decimal::Decimal::new(89_950, 2));

        let bad = spec_from_args(&args(&["Zenbook", "Asus", "i5", "lots"]), 0);
        assert!(matches!(bad, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_order_admin_commands() -> Result<()> {
        let shop = Shop::new(setup_test_db().await?, Settings::default());
        let admin = test_admin_session(&shop.database).await?;
        let customer = create_test_account(&shop.database, "carol").await?;
        let laptop = create_test_laptop(&shop.database, "XPS 13", 5).await?;
        let placed = create_test_order(&shop.database, customer.id, &[(laptop.id, 1)]).await?;
        let id = placed.order.id.to_string();

        let out = order_status(&shop, &admin, &args(&[&id, "shipped"])).await?;
        assert!(out.contains("SHIPPED"));
        let out = order_payment(&shop, &admin, &args(&[&id, "paid"])).await?;
        assert!(out.contains("PAID"));

        let products = report(&shop, &admin, &args(&["products"])).await?;
        assert!(products.contains("XPS 13"));
        let customers = report(&shop, &admin, &args(&["customers"])).await?;
        assert!(customers.contains("Test Customer"));

        let unknown = report(&shop, &admin, &args(&["weekly"])).await;
        assert!(matches!(unknown, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_warranty_decide_command() -> Result<()> {
        let (db, customer, order_id, laptop_id) = setup_delivered_order().await?;
        let shop = Shop::new(db, Settings::default());
        let admin = test_admin_session(&shop.database).await?;
        let request =
            warranty::create_request(&shop.database, &customer, order_id, laptop_id, "Screen")
                .await?;
        let id = request.id.to_string();

        let bad = warranty_decide(&shop, &admin, &args(&[&id, "maybe"])).await;
        assert!(matches!(bad, Err(Error::Validation { .. })));

        let out =
            warranty_decide(&shop, &admin, &args(&[&id, "reject", "Physical", "damage"])).await?;
        assert!(out.contains("REJECTED"));
        let stored = warranty::get_request_by_id(&shop.database, request.id)
            .await?
            .unwrap();
        assert_eq!(stored.admin_notes.as_deref(), Some("Physical damage"));
        Ok(())
    }
}
