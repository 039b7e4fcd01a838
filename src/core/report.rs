//! Report generation business logic.
//!
//! Every report is a pure derivation over orders that already carry their
//! lines. The `generate_*` functions fetch what a report needs and hand it to
//! the matching pure function, so the aggregation itself is tested without a
//! database. CANCELLED orders never contribute money; revenue additionally
//! ignores orders that are not PAID. Rankings sort by the metric, descending,
//! and keep first-seen order among ties.

use crate::{
    config::settings::ReportSettings,
    core::{account, catalog, money, order::OrderWithLines},
    entities::{OrderStatus, PaymentStatus, account as account_entity, laptop},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sea_orm::DatabaseConnection;
use std::collections::{HashMap, HashSet};

/// All statuses in lifecycle order, for per-status breakdowns.
const STATUSES: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

fn counts_toward_revenue(order: &OrderWithLines) -> bool {
    order.order.status != OrderStatus::Cancelled
        && order.order.payment_status == PaymentStatus::Paid
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Sales for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySalesReport {
    /// Day covered
    pub date: NaiveDate,
    /// Every order placed that day, cancelled ones included
    pub order_count: usize,
    /// PAID, non-cancelled order totals
    pub revenue: Decimal,
    /// Order count per status, in lifecycle order
    pub status_counts: Vec<(OrderStatus, usize)>,
}

/// Builds the daily report from the orders placed on `date`.
#[must_use]
pub fn daily_sales(orders: &[OrderWithLines], date: NaiveDate) -> DailySalesReport {
    let day: Vec<&OrderWithLines> = orders
        .iter()
        .filter(|o| o.order.order_date.date_naive() == date)
        .collect();

    let revenue = day
        .iter()
        .filter(|o| counts_toward_revenue(o))
        .map(|o| o.total())
        .sum();
    let status_counts = STATUSES
        .iter()
        .map(|status| {
            (
                *status,
                day.iter().filter(|o| o.order.status == *status).count(),
            )
        })
        .collect();

    DailySalesReport {
        date,
        order_count: day.len(),
        revenue,
        status_counts,
    }
}

/// Fetches one day's orders and builds the daily report.
pub async fn generate_daily_report(
    db: &DatabaseConnection,
    date: NaiveDate,
) -> Result<DailySalesReport> {
    let end = date
        .succ_opt()
        .ok_or_else(|| Error::validation(format!("date {date} is out of range")))?;
    let orders =
        crate::core::order::get_orders_between(db, start_of_day(date), start_of_day(end)).await?;
    Ok(daily_sales(&orders, date))
}

/// Orders and revenue for one day of a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySales {
    /// Day of month, starting at 1
    pub day: u32,
    /// Orders placed that day
    pub order_count: usize,
    /// PAID, non-cancelled revenue that day
    pub revenue: Decimal,
}

/// Sales for one calendar month (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySalesReport {
    /// Year covered
    pub year: i32,
    /// Month covered, 1 through 12
    pub month: u32,
    /// Every order placed in the month
    pub order_count: usize,
    /// DELIVERED orders
    pub completed: usize,
    /// CANCELLED orders
    pub cancelled: usize,
    /// PAID, non-cancelled order totals
    pub revenue: Decimal,
    /// Revenue divided by order count, two places, half up
    pub average_order_value: Decimal,
    /// Days that had at least one order, in calendar order
    pub days: Vec<DaySales>,
    /// Day with the highest revenue; the earliest such day on a tie
    pub best_day: Option<DaySales>,
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || Error::validation(format!("invalid month {year}-{month:02}"));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?;
    Ok((start, end))
}

/// Builds the monthly report from the orders placed in `year`-`month`.
///
/// # Errors
/// Returns a validation error for a month outside 1 through 12.
pub fn monthly_sales(orders: &[OrderWithLines], year: i32, month: u32) -> Result<MonthlySalesReport> {
    month_bounds(year, month)?;
    let in_month: Vec<&OrderWithLines> = orders
        .iter()
        .filter(|o| {
            let date = o.order.order_date.date_naive();
            date.year() == year && date.month() == month
        })
        .collect();

    let mut days: Vec<DaySales> = Vec::new();
    let mut revenue = Decimal::ZERO;
    for placed in &in_month {
        let day = placed.order.order_date.day();
        let index = match days.iter().position(|d| d.day == day) {
            Some(index) => index,
            None => {
                days.push(DaySales {
                    day,
                    order_count: 0,
                    revenue: Decimal::ZERO,
                });
                days.len() - 1
            }
        };
        days[index].order_count += 1;
        if counts_toward_revenue(placed) {
            days[index].revenue += placed.total();
            revenue += placed.total();
        }
    }
    days.sort_by_key(|d| d.day);

    let best_day = days
        .iter()
        .filter(|d| d.revenue > Decimal::ZERO)
        .fold(None::<&DaySales>, |best, d| match best {
            Some(b) if b.revenue >= d.revenue => Some(b),
            _ => Some(d),
        })
        .cloned();

    Ok(MonthlySalesReport {
        year,
        month,
        order_count: in_month.len(),
        completed: in_month
            .iter()
            .filter(|o| o.order.status == OrderStatus::Delivered)
            .count(),
        cancelled: in_month
            .iter()
            .filter(|o| o.order.status == OrderStatus::Cancelled)
            .count(),
        revenue,
        average_order_value: money::average(revenue, in_month.len()),
        days,
        best_day,
    })
}

/// Fetches one month's orders and builds the monthly report.
pub async fn generate_monthly_report(
    db: &DatabaseConnection,
    year: i32,
    month: u32,
) -> Result<MonthlySalesReport> {
    let (start, end) = month_bounds(year, month)?;
    let orders =
        crate::core::order::get_orders_between(db, start_of_day(start), start_of_day(end)).await?;
    monthly_sales(&orders, year, month)
}

/// Units and revenue of one laptop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRevenue {
    /// Laptop ID
    pub laptop_id: i64,
    /// Laptop name, or a placeholder if it is no longer in the catalog
    pub name: String,
    /// Units sold
    pub units: i64,
    /// Sum of line subtotals
    pub revenue: Decimal,
    /// Revenue per unit, two places, half up
    pub average_price: Decimal,
}

/// Ranks laptops by revenue over PAID, non-cancelled orders.
#[must_use]
pub fn product_revenue(orders: &[OrderWithLines], laptops: &[laptop::Model]) -> Vec<ProductRevenue> {
    let names: HashMap<i64, &str> = laptops.iter().map(|l| (l.id, l.name.as_str())).collect();
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut rows: Vec<ProductRevenue> = Vec::new();

    for line in orders
        .iter()
        .filter(|o| counts_toward_revenue(o))
        .flat_map(|o| &o.lines)
    {
        let slot = *index.entry(line.laptop_id).or_insert_with(|| {
            rows.push(ProductRevenue {
                laptop_id: line.laptop_id,
                name: names
                    .get(&line.laptop_id)
                    .map_or_else(|| format!("Laptop #{}", line.laptop_id), |n| (*n).to_string()),
                units: 0,
                revenue: Decimal::ZERO,
                average_price: Decimal::ZERO,
            });
            rows.len() - 1
        });
        rows[slot].units += i64::from(line.quantity);
        rows[slot].revenue += line.subtotal();
    }

    for row in &mut rows {
        row.average_price = money::average(row.revenue, usize::try_from(row.units).unwrap_or(0));
    }
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}

/// Fetches orders and the catalog and builds the product ranking.
pub async fn generate_product_report(db: &DatabaseConnection) -> Result<Vec<ProductRevenue>> {
    let orders = crate::core::order::get_all_orders(db).await?;
    let laptops = catalog::get_all_laptops(db).await?;
    Ok(product_revenue(&orders, &laptops))
}

/// Units and revenue of one brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandRevenue {
    /// Brand name
    pub brand: String,
    /// Distinct laptops of this brand that sold
    pub product_count: usize,
    /// Units sold
    pub units: i64,
    /// Sum of line subtotals
    pub revenue: Decimal,
    /// Share of all brand revenue, percent, two places, half up
    pub market_share: Decimal,
}

/// Ranks brands by revenue over PAID, non-cancelled orders.
///
/// Lines whose laptop is no longer in the catalog have no brand and are skipped.
#[must_use]
pub fn brand_revenue(orders: &[OrderWithLines], laptops: &[laptop::Model]) -> Vec<BrandRevenue> {
    let brands: HashMap<i64, &str> = laptops.iter().map(|l| (l.id, l.brand.as_str())).collect();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut products: Vec<HashSet<i64>> = Vec::new();
    let mut rows: Vec<BrandRevenue> = Vec::new();

    for line in orders
        .iter()
        .filter(|o| counts_toward_revenue(o))
        .flat_map(|o| &o.lines)
    {
        let Some(brand) = brands.get(&line.laptop_id).copied() else {
            continue;
        };
        let slot = *index.entry(brand).or_insert_with(|| {
            rows.push(BrandRevenue {
                brand: brand.to_string(),
                product_count: 0,
                units: 0,
                revenue: Decimal::ZERO,
                market_share: Decimal::ZERO,
            });
            products.push(HashSet::new());
            rows.len() - 1
        });
        products[slot].insert(line.laptop_id);
        rows[slot].units += i64::from(line.quantity);
        rows[slot].revenue += line.subtotal();
    }

    let total: Decimal = rows.iter().map(|r| r.revenue).sum();
    for (row, laptops) in rows.iter_mut().zip(&products) {
        row.product_count = laptops.len();
        row.market_share = money::percentage(row.revenue, total, 2);
    }
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}

/// Fetches orders and the catalog and builds the brand ranking.
pub async fn generate_brand_report(db: &DatabaseConnection) -> Result<Vec<BrandRevenue>> {
    let orders = crate::core::order::get_all_orders(db).await?;
    let laptops = catalog::get_all_laptops(db).await?;
    Ok(brand_revenue(&orders, &laptops))
}

/// Draws a market share as a bar, e.g. `[█████░░░░░] 50.00%`.
#[must_use]
pub fn format_share_bar(share_percent: Decimal, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(20);
    let clamped = share_percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let filled = (clamped * Decimal::from(length) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(length);
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {share_percent:.2}%")
}

/// Lifetime purchases of one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerPurchases {
    /// Account ID
    pub account_id: i64,
    /// Full name, username, or a placeholder for deleted accounts
    pub name: String,
    /// Non-cancelled orders
    pub order_count: usize,
    /// Sum of non-cancelled order totals
    pub total_spent: Decimal,
    /// Most recent non-cancelled order
    pub last_purchase: DateTime<Utc>,
}

/// Spending tier of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// At or above the high-value threshold
    High,
    /// At or above the mid-value threshold
    Mid,
    /// Below the mid-value threshold
    Low,
}

/// Classifies lifetime spend against the configured thresholds.
#[must_use]
pub fn segment(total_spent: Decimal, settings: &ReportSettings) -> Segment {
    if total_spent >= settings.high_value_threshold {
        Segment::High
    } else if total_spent >= settings.mid_value_threshold {
        Segment::Mid
    } else {
        Segment::Low
    }
}

/// Customer ranking with aggregate statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerReport {
    /// Every customer with a non-cancelled order, highest spend first
    pub customers: Vec<CustomerPurchases>,
    /// Sum of all customers' spend
    pub total_revenue: Decimal,
    /// Non-cancelled orders across all customers
    pub total_orders: usize,
    /// Spend per customer, two places, half up
    pub average_spending: Decimal,
    /// Orders per customer, two places, half up
    pub average_orders: Decimal,
    /// Customers in the high tier
    pub high_value: usize,
    /// Customers in the mid tier
    pub mid_value: usize,
    /// Customers in the low tier
    pub low_value: usize,
}

/// Ranks customers by spend over non-cancelled orders, paid or not.
#[must_use]
pub fn customer_purchases(
    orders: &[OrderWithLines],
    accounts: &[account_entity::Model],
    settings: &ReportSettings,
) -> CustomerReport {
    let names: HashMap<i64, &account_entity::Model> = accounts.iter().map(|a| (a.id, a)).collect();
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut customers: Vec<CustomerPurchases> = Vec::new();

    for placed in orders
        .iter()
        .filter(|o| o.order.status != OrderStatus::Cancelled)
    {
        let user_id = placed.order.user_id;
        let slot = *index.entry(user_id).or_insert_with(|| {
            let name = names.get(&user_id).map_or_else(
                || format!("Customer ID {user_id}"),
                |a| {
                    if a.full_name.is_empty() {
                        a.username.clone()
                    } else {
                        a.full_name.clone()
                    }
                },
            );
            customers.push(CustomerPurchases {
                account_id: user_id,
                name,
                order_count: 0,
                total_spent: Decimal::ZERO,
                last_purchase: placed.order.order_date,
            });
            customers.len() - 1
        });
        let entry = &mut customers[slot];
        entry.order_count += 1;
        entry.total_spent += placed.total();
        entry.last_purchase = entry.last_purchase.max(placed.order.order_date);
    }
    customers.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));

    let total_revenue: Decimal = customers.iter().map(|c| c.total_spent).sum();
    let total_orders: usize = customers.iter().map(|c| c.order_count).sum();
    let count_in = |tier: Segment| {
        customers
            .iter()
            .filter(|c| segment(c.total_spent, settings) == tier)
            .count()
    };

    CustomerReport {
        total_revenue,
        total_orders,
        average_spending: money::average(total_revenue, customers.len()),
        average_orders: money::average(Decimal::from(total_orders), customers.len()),
        high_value: count_in(Segment::High),
        mid_value: count_in(Segment::Mid),
        low_value: count_in(Segment::Low),
        customers,
    }
}

/// Fetches orders and accounts and builds the customer report (admin only).
pub async fn generate_customer_report(
    db: &DatabaseConnection,
    session: &account::Session,
    settings: &ReportSettings,
) -> Result<CustomerReport> {
    let accounts = account::list_accounts(db, session).await?;
    let orders = crate::core::order::get_all_orders(db).await?;
    Ok(customer_purchases(&orders, &accounts, settings))
}
