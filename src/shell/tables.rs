//! Table rendering for shell output.
//!
//! Every function returns the finished text so commands can be tested without
//! a terminal.

use crate::{
    core::{
        cart::CartLine,
        inventory::{self, InventoryReport},
        money::format_money,
        order::OrderWithLines,
        report::{
            self, BrandRevenue, CustomerReport, DailySalesReport, MonthlySalesReport,
            ProductRevenue,
        },
    },
    entities::{account, import_receipt, laptop, warranty_request},
};
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Write;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Catalog listing with stock status.
#[must_use]
pub fn laptops(laptops: &[laptop::Model], low_stock_threshold: i32) -> String {
    if laptops.is_empty() {
        return "No laptops found.".to_string();
    }
    let mut table = table(&[
        "ID", "Name", "Brand", "CPU", "RAM", "OS", "Color", "Price", "Stock", "Status",
    ]);
    for l in laptops {
        let status = inventory::stock_status(l.stock_quantity, low_stock_threshold);
        let status_cell = match status {
            inventory::StockStatus::OutOfStock => Cell::new(status).fg(Color::Red),
            inventory::StockStatus::Low => Cell::new(status).fg(Color::Yellow),
            inventory::StockStatus::Medium | inventory::StockStatus::Good => Cell::new(status),
        };
        _ = table.add_row(vec![
            Cell::new(l.id),
            Cell::new(&l.name),
            Cell::new(&l.brand),
            Cell::new(&l.cpu),
            Cell::new(format!("{} GB", l.ram)),
            Cell::new(&l.os),
            Cell::new(&l.color),
            Cell::new(format_money(l.price())),
            Cell::new(l.stock_quantity),
            status_cell,
        ]);
    }
    table.to_string()
}

/// Cart contents with a total line.
#[must_use]
pub fn cart(lines: &[CartLine], total: Decimal) -> String {
    if lines.is_empty() {
        return "Your cart is empty.".to_string();
    }
    let mut table = table(&["Laptop", "Name", "Qty", "Unit price", "Subtotal"]);
    for line in lines {
        _ = table.add_row(vec![
            Cell::new(line.item.laptop_id()),
            Cell::new(&line.name),
            Cell::new(line.item.quantity()),
            Cell::new(format_money(line.item.unit_price())),
            Cell::new(format_money(line.item.subtotal())),
        ]);
    }
    format!("{table}\nTotal: {}", format_money(total))
}

/// One row per order.
#[must_use]
pub fn orders(orders: &[OrderWithLines]) -> String {
    if orders.is_empty() {
        return "No orders found.".to_string();
    }
    let mut table = table(&[
        "ID", "Customer", "Date", "Status", "Payment", "Paid", "Items", "Total",
    ]);
    for o in orders {
        _ = table.add_row(vec![
            Cell::new(o.order.id),
            Cell::new(o.order.user_id),
            Cell::new(timestamp(o.order.order_date)),
            Cell::new(o.order.status),
            Cell::new(o.order.payment_method),
            Cell::new(o.order.payment_status),
            Cell::new(o.unit_count()),
            Cell::new(format_money(o.total())),
        ]);
    }
    table.to_string()
}

/// Header details and lines of a single order.
#[must_use]
pub fn order_detail(order: &OrderWithLines, names: &HashMap<i64, String>) -> String {
    let mut out = String::new();
    let header = &order.order;
    _ = writeln!(out, "Order #{} placed {}", header.id, timestamp(header.order_date));
    _ = writeln!(out, "Status: {}", header.status);
    _ = writeln!(
        out,
        "Payment: {} ({})",
        header.payment_method, header.payment_status
    );
    _ = writeln!(out, "Ship to: {}", header.shipping_address);

    let mut table = table(&["Laptop", "Name", "Qty", "Unit price", "Subtotal"]);
    for line in &order.lines {
        let name = names
            .get(&line.laptop_id)
            .map_or("(removed)", String::as_str);
        _ = table.add_row(vec![
            Cell::new(line.laptop_id),
            Cell::new(name),
            Cell::new(line.quantity),
            Cell::new(format_money(line.unit_price())),
            Cell::new(format_money(line.subtotal())),
        ]);
    }
    _ = write!(out, "{table}\nTotal: {}", format_money(order.total()));
    out
}

/// Account listing without credentials.
#[must_use]
pub fn accounts(accounts: &[account::Model]) -> String {
    if accounts.is_empty() {
        return "No accounts found.".to_string();
    }
    let mut table = table(&["ID", "Username", "Role", "Name", "Email", "Phone", "Created"]);
    for a in accounts {
        _ = table.add_row(vec![
            Cell::new(a.id),
            Cell::new(&a.username),
            Cell::new(a.role),
            Cell::new(&a.full_name),
            Cell::new(&a.email),
            Cell::new(&a.phone),
            Cell::new(timestamp(a.created_at)),
        ]);
    }
    table.to_string()
}

/// Warranty request listing.
#[must_use]
pub fn warranty_requests(requests: &[warranty_request::Model]) -> String {
    if requests.is_empty() {
        return "No warranty requests found.".to_string();
    }
    let mut table = table(&[
        "ID", "Order", "Laptop", "Customer", "Requested", "Status", "Reason", "Notes",
    ]);
    for r in requests {
        _ = table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.order_id),
            Cell::new(r.laptop_id),
            Cell::new(r.user_id),
            Cell::new(timestamp(r.request_date)),
            Cell::new(r.status),
            Cell::new(&r.reason),
            Cell::new(r.admin_notes.as_deref().unwrap_or("")),
        ]);
    }
    table.to_string()
}

/// Import receipt listing.
#[must_use]
pub fn receipts(receipts: &[import_receipt::Model]) -> String {
    if receipts.is_empty() {
        return "No import receipts found.".to_string();
    }
    let mut table = table(&["ID", "Laptop", "Qty", "Date", "Supplier", "Contact", "Notes"]);
    for r in receipts {
        _ = table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.laptop_id),
            Cell::new(r.quantity),
            Cell::new(timestamp(r.import_date)),
            Cell::new(&r.supplier_name),
            Cell::new(&r.supplier_contact),
            Cell::new(r.notes.as_deref().unwrap_or("")),
        ]);
    }
    table.to_string()
}

/// Inventory summary followed by units per brand.
#[must_use]
pub fn inventory_report(report: &InventoryReport) -> String {
    let mut out = String::new();
    _ = writeln!(out, "Products: {}", report.product_count);
    _ = writeln!(out, "Units in stock: {}", report.total_units);
    _ = writeln!(out, "Inventory value: {}", format_money(report.total_value));
    _ = writeln!(out, "Out of stock: {}", report.out_of_stock);
    _ = writeln!(out, "Low stock: {}", report.low_stock);
    let mut table = table(&["Brand", "Units"]);
    for (brand, units) in &report.units_by_brand {
        _ = table.add_row(vec![Cell::new(brand), Cell::new(units)]);
    }
    _ = write!(out, "{table}");
    out
}

/// Daily sales summary.
#[must_use]
pub fn daily_report(report: &DailySalesReport) -> String {
    let mut out = String::new();
    _ = writeln!(out, "Daily sales for {}", report.date);
    _ = writeln!(out, "Orders: {}", report.order_count);
    _ = writeln!(out, "Revenue: {}", format_money(report.revenue));
    let mut table = table(&["Status", "Orders"]);
    for (status, count) in &report.status_counts {
        _ = table.add_row(vec![Cell::new(status), Cell::new(count)]);
    }
    _ = write!(out, "{table}");
    out
}

/// Monthly sales summary with a per-day breakdown.
#[must_use]
pub fn monthly_report(report: &MonthlySalesReport) -> String {
    let mut out = String::new();
    _ = writeln!(out, "Monthly sales for {}-{:02}", report.year, report.month);
    _ = writeln!(out, "Orders: {}", report.order_count);
    _ = writeln!(out, "Completed: {}", report.completed);
    _ = writeln!(out, "Cancelled: {}", report.cancelled);
    _ = writeln!(out, "Revenue: {}", format_money(report.revenue));
    _ = writeln!(
        out,
        "Average order value: {}",
        format_money(report.average_order_value)
    );
    let mut table = table(&["Day", "Orders", "Revenue"]);
    for day in &report.days {
        _ = table.add_row(vec![
            Cell::new(day.day),
            Cell::new(day.order_count),
            Cell::new(format_money(day.revenue)),
        ]);
    }
    _ = write!(out, "{table}");
    if let Some(best) = &report.best_day {
        _ = write!(
            out,
            "\nBest day: {} ({} from {} orders)",
            best.day,
            format_money(best.revenue),
            best.order_count
        );
    }
    out
}

/// Product revenue ranking with a total row.
#[must_use]
pub fn product_report(rows: &[ProductRevenue]) -> String {
    if rows.is_empty() {
        return "No product revenue data available.".to_string();
    }
    let mut table = table(&["Rank", "Laptop", "Name", "Units", "Revenue", "Avg price"]);
    for (rank, row) in rows.iter().enumerate() {
        _ = table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(row.laptop_id),
            Cell::new(&row.name),
            Cell::new(row.units),
            Cell::new(format_money(row.revenue)),
            Cell::new(format_money(row.average_price)),
        ]);
    }
    let units: i64 = rows.iter().map(|r| r.units).sum();
    let revenue: Decimal = rows.iter().map(|r| r.revenue).sum();
    format!(
        "{table}\nTotal: {units} units, {}",
        format_money(revenue)
    )
}

/// Brand revenue ranking with market share bars.
#[must_use]
pub fn brand_report(rows: &[BrandRevenue]) -> String {
    if rows.is_empty() {
        return "No brand revenue data available.".to_string();
    }
    let mut table = table(&["Rank", "Brand", "Products", "Units", "Revenue", "Share"]);
    for (rank, row) in rows.iter().enumerate() {
        _ = table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&row.brand),
            Cell::new(row.product_count),
            Cell::new(row.units),
            Cell::new(format_money(row.revenue)),
            Cell::new(report::format_share_bar(row.market_share, None)),
        ]);
    }
    table.to_string()
}

/// Top customers and lifetime-value segments.
#[must_use]
pub fn customer_report(report: &CustomerReport, top: usize) -> String {
    if report.customers.is_empty() {
        return "No customer purchase data available.".to_string();
    }
    let mut out = String::new();
    let mut table = table(&["Rank", "Customer", "Orders", "Spent", "Last purchase"]);
    for (rank, c) in report.customers.iter().take(top).enumerate() {
        _ = table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&c.name),
            Cell::new(c.order_count),
            Cell::new(format_money(c.total_spent)),
            Cell::new(timestamp(c.last_purchase)),
        ]);
    }
    _ = writeln!(out, "{table}");
    if report.customers.len() > top {
        _ = writeln!(out, "... and {} more customers", report.customers.len() - top);
    }
    _ = writeln!(out, "Customers: {}", report.customers.len());
    _ = writeln!(out, "Revenue: {}", format_money(report.total_revenue));
    _ = writeln!(out, "Orders: {}", report.total_orders);
    _ = writeln!(
        out,
        "Average spend: {}",
        format_money(report.average_spending)
    );
    _ = writeln!(out, "Average orders: {:.2}", report.average_orders);
    _ = write!(
        out,
        "Segments: high {}, mid {}, low {}",
        report.high_value, report.mid_value, report.low_value
    );
    out
}
