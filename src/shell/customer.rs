//! Customer and guest commands.
//!
//! Each function takes the parsed arguments after the command word and
//! returns the text to print.

use super::{Shop, parse, tables};
use crate::{
    core::{
        account::{self, Profile, Session},
        catalog, checkout,
        money::format_money,
        order::{self, OrderWithLines},
        warranty,
    },
    entities::{OrderStatus, PaymentMethod, WarrantyStatus},
    errors::{Error, Result},
};
use std::collections::HashMap;

fn profile_from(args: &[String], start: usize) -> Profile {
    let field = |i: usize| parse::optional(args, start + i).unwrap_or_default().to_string();
    Profile {
        full_name: field(0),
        email: field(1),
        phone: field(2),
        address: field(3),
    }
}

async fn laptop_names(shop: &Shop) -> Result<HashMap<i64, String>> {
    Ok(catalog::get_all_laptops(&shop.database)
        .await?
        .into_iter()
        .map(|l| (l.id, l.name))
        .collect())
}

async fn visible_order(shop: &Shop, session: &Session, order_id: i64) -> Result<OrderWithLines> {
    let found = order::get_order_by_id(&shop.database, order_id)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;
    if found.order.user_id != session.account_id && !session.is_admin() {
        // Other customers' orders are reported as missing.
        return Err(Error::not_found("order", order_id));
    }
    Ok(found)
}

/// `register <user> <password> [name] [email] [phone] [address]`
pub async fn register(shop: &Shop, args: &[String]) -> Result<String> {
    let username = parse::required(args, 0, "user")?;
    let password = parse::required(args, 1, "password")?;
    let created = account::register(&shop.database, username, password, profile_from(args, 2)).await?;
    Ok(format!(
        "Account '{}' created. You can now log in.",
        created.username
    ))
}

/// `login <user> <password>`
pub async fn login(shop: &Shop, args: &[String]) -> Result<Session> {
    let username = parse::required(args, 0, "user")?;
    let password = parse::required(args, 1, "password")?;
    account::authenticate(&shop.database, username, password).await
}

/// `whoami`
pub async fn whoami(shop: &Shop, session: &Session) -> Result<String> {
    let me = account::get_account_by_id(&shop.database, session.account_id)
        .await?
        .ok_or_else(|| Error::not_found("account", session.account_id))?;
    Ok(format!(
        "{} (#{}, {})\nName: {}\nEmail: {}\nPhone: {}\nAddress: {}",
        me.username, me.id, me.role, me.full_name, me.email, me.phone, me.address
    ))
}

/// `passwd <old> <new>`
pub async fn passwd(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let current = parse::required(args, 0, "old")?;
    let new = parse::required(args, 1, "new")?;
    account::change_password(&shop.database, session, current, new).await?;
    Ok("Password changed.".to_string())
}

/// `profile` shows, `profile <name> <email> <phone> <address>` replaces.
pub async fn profile(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    if args.is_empty() {
        return whoami(shop, session).await;
    }
    let updated = account::update_profile(&shop.database, session, profile_from(args, 0)).await?;
    Ok(format!("Profile updated for {}.", updated.username))
}

/// `laptops`
pub async fn laptops(shop: &Shop) -> Result<String> {
    let all = catalog::get_all_laptops(&shop.database).await?;
    Ok(tables::laptops(&all, shop.settings.inventory.low_stock_threshold))
}

/// `laptop <id>`
pub async fn laptop(shop: &Shop, args: &[String]) -> Result<String> {
    let laptop_id: i64 = parse::required_value(args, 0, "id")?;
    let found = catalog::get_laptop_by_id(&shop.database, laptop_id)
        .await?
        .ok_or_else(|| Error::not_found("laptop", laptop_id))?;
    Ok(tables::laptops(
        &[found],
        shop.settings.inventory.low_stock_threshold,
    ))
}

/// `search <text>`
pub async fn search(shop: &Shop, args: &[String]) -> Result<String> {
    let term = parse::rest(args, 0);
    if term.trim().is_empty() {
        return Err(Error::validation("missing <text>"));
    }
    let found = catalog::search_by_name(&shop.database, &term).await?;
    Ok(tables::laptops(&found, shop.settings.inventory.low_stock_threshold))
}

/// `filter brand|ram|os <value>`
pub async fn filter(shop: &Shop, args: &[String]) -> Result<String> {
    let field = parse::required(args, 0, "brand|ram|os")?;
    let value = parse::rest(args, 1);
    if value.trim().is_empty() {
        return Err(Error::validation("missing <value>"));
    }
    let db = &shop.database;
    let found = match field.to_ascii_lowercase().as_str() {
        "brand" => catalog::filter_by_brand(db, &value).await?,
        "ram" => catalog::filter_by_ram(db, parse::value(&value, "ram")?).await?,
        "os" => catalog::filter_by_os(db, &value).await?,
        other => return Err(Error::validation(format!("cannot filter by '{other}'"))),
    };
    Ok(tables::laptops(&found, shop.settings.inventory.low_stock_threshold))
}

/// `cart`, `cart add <laptop> [qty]`, `cart set <laptop> <qty>`,
/// `cart remove <laptop>`, `cart clear`
pub async fn cart(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let carts = &shop.carts;
    let account_id = session.account_id;
    match parse::optional(args, 0).map(str::to_ascii_lowercase).as_deref() {
        None | Some("show") => {}
        Some("add") => {
            let laptop_id = parse::required_value(args, 1, "laptop")?;
            let quantity = match parse::optional(args, 2) {
                Some(qty) => parse::value(qty, "qty")?,
                None => 1,
            };
            let line = carts
                .add(&shop.database, account_id, laptop_id, quantity)
                .await?;
            return Ok(format!(
                "{} x {} in cart ({}).",
                line.item.quantity(),
                line.name,
                format_money(line.item.subtotal())
            ));
        }
        Some("set") => {
            let laptop_id = parse::required_value(args, 1, "laptop")?;
            let quantity = parse::required_value(args, 2, "qty")?;
            carts
                .set_quantity(&shop.database, account_id, laptop_id, quantity)
                .await?;
        }
        Some("remove") => {
            let laptop_id = parse::required_value(args, 1, "laptop")?;
            carts.remove(account_id, laptop_id).await?;
        }
        Some("clear") => {
            carts.clear(account_id).await;
            return Ok("Cart cleared.".to_string());
        }
        Some(other) => return Err(Error::validation(format!("unknown cart action '{other}'"))),
    }
    let lines = carts.lines(account_id).await;
    Ok(tables::cart(&lines, carts.total(account_id).await))
}

/// `checkout <payment method> [address]`
pub async fn checkout(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let method: PaymentMethod = parse::required(args, 0, "payment method")?.parse()?;
    let address = parse::rest(args, 1);
    let placed = checkout::place_order(
        &shop.database,
        &shop.carts,
        &shop.write_gate,
        session.account_id,
        method,
        &address,
    )
    .await?;
    let names = laptop_names(shop).await?;
    Ok(format!(
        "Order placed.\n{}",
        tables::order_detail(&placed, &names)
    ))
}

/// `orders`; administrators may add `all` or a status.
pub async fn orders(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let db = &shop.database;
    let found = match parse::optional(args, 0) {
        None => order::get_orders_by_account(db, session.account_id).await?,
        Some(scope) => {
            session.require_admin()?;
            if scope.eq_ignore_ascii_case("all") {
                order::get_all_orders(db).await?
            } else {
                order::get_orders_by_status(db, scope.parse::<OrderStatus>()?).await?
            }
        }
    };
    Ok(tables::orders(&found))
}

/// `order <id>`
pub async fn order(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let order_id = parse::required_value(args, 0, "id")?;
    let found = visible_order(shop, session, order_id).await?;
    let names = laptop_names(shop).await?;
    Ok(tables::order_detail(&found, &names))
}

/// `cancel <id>`
pub async fn cancel(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let order_id = parse::required_value(args, 0, "id")?;
    let cancelled =
        checkout::cancel_order(&shop.database, &shop.write_gate, session, order_id).await?;
    Ok(format!(
        "Order #{} cancelled; {} units returned to stock.",
        cancelled.order.id,
        cancelled.unit_count()
    ))
}

/// `warranty`, `warranty request <order> <laptop> <reason>`, `warranty show <id>`;
/// administrators may add `all`, `pending` or a status.
pub async fn warranty(shop: &Shop, session: &Session, args: &[String]) -> Result<String> {
    let db = &shop.database;
    let requests = match parse::optional(args, 0).map(str::to_ascii_lowercase).as_deref() {
        None | Some("mine") => warranty::get_requests_by_account(db, session.account_id).await?,
        Some("request") => {
            let order_id = parse::required_value(args, 1, "order")?;
            let laptop_id = parse::required_value(args, 2, "laptop")?;
            let reason = parse::rest(args, 3);
            let filed = warranty::create_request(db, session, order_id, laptop_id, &reason).await?;
            return Ok(format!(
                "Warranty request #{} filed and awaiting review.",
                filed.id
            ));
        }
        Some("show") => {
            let request_id = parse::required_value(args, 1, "id")?;
            let found = warranty::get_request_by_id(db, request_id)
                .await?
                .filter(|r| r.user_id == session.account_id || session.is_admin())
                .ok_or_else(|| Error::not_found("warranty request", request_id))?;
            vec![found]
        }
        Some("all") => {
            session.require_admin()?;
            warranty::get_all_requests(db).await?
        }
        Some("pending") => {
            session.require_admin()?;
            warranty::get_pending_requests(db).await?
        }
        Some(status) => {
            session.require_admin()?;
            warranty::get_requests_by_status(db, status.parse::<WarrantyStatus>()?).await?
        }
    };
    Ok(tables::warranty_requests(&requests))
}
