//! Core business logic - framework-agnostic store operations.
//!
//! Every function takes a database handle (or a transaction) explicitly and
//! returns [`crate::errors::Result`]. The shell only parses input and formats
//! the structured values these modules return.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod inventory;
pub mod money;
pub mod order;
pub mod password;
pub mod report;
pub mod warranty;
