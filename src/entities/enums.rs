//! Enumerated column types shared by the entities.
//!
//! Each enum is stored as its upper-case string value, matching what the
//! shell accepts and prints.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// Implements `Display` and case-insensitive `FromStr` over the string values.
macro_rules! string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $value:literal),+ $(,)? }) => {
        impl $name {
            /// The stored string value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(Error::validation(format!("unknown {}: {s}", $label))),
                }
            }
        }
    };
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    /// Store administrator
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    /// Regular customer
    #[sea_orm(string_value = "USER")]
    User,
}

string_enum!(Role, "role", { Admin => "ADMIN", User => "USER" });

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    /// Placed, not yet handled
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Being prepared
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    /// Handed to the carrier
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    /// Received by the customer
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    /// Cancelled, stock returned
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Shipped => "SHIPPED",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum PaymentMethod {
    /// Cash collected by the courier
    #[sea_orm(string_value = "CASH_ON_DELIVERY")]
    CashOnDelivery,
    /// Bank transfer
    #[sea_orm(string_value = "BANK_TRANSFER")]
    BankTransfer,
    /// Credit card
    #[sea_orm(string_value = "CREDIT_CARD")]
    CreditCard,
}

string_enum!(PaymentMethod, "payment method", {
    CashOnDelivery => "CASH_ON_DELIVERY",
    BankTransfer => "BANK_TRANSFER",
    CreditCard => "CREDIT_CARD",
});

/// Whether an order has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    /// Not paid yet
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    /// Paid in full
    #[sea_orm(string_value = "PAID")]
    Paid,
}

string_enum!(PaymentStatus, "payment status", { Unpaid => "UNPAID", Paid => "PAID" });

/// Warranty request decision state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum WarrantyStatus {
    /// Awaiting an administrator
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Accepted
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Refused
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

string_enum!(WarrantyStatus, "warranty status", {
    Pending => "PENDING",
    Approved => "APPROVED",
    Rejected => "REJECTED",
});
