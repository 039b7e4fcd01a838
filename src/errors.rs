//! Unified error types and result handling.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants carry
//! enough context to print a useful message in the shell, and [`Error::kind`]
//! folds them into the coarse taxonomy callers branch on.

use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The referenced entity has no matching row.
    NotFound,
    /// The operation clashes with current state (stock, uniqueness, status).
    Conflict,
    /// The input was malformed or incomplete.
    Validation,
    /// The caller is not allowed to perform the operation.
    Forbidden,
    /// Storage could not be reached or failed.
    Unavailable,
    /// Startup configuration is broken.
    Config,
}

/// Application error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database failure, including connectivity problems.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure on the console or a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable is missing or not unicode.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// No row exists for the given identifier.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name, e.g. `"laptop"`
        entity: &'static str,
        /// Identifier as given by the caller
        id: String,
    },

    /// Username is already registered.
    #[error("Username '{username}' is already taken")]
    UsernameTaken {
        /// The rejected username
        username: String,
    },

    /// A stock change would drive stock below zero.
    #[error("Insufficient stock for laptop {laptop_id}: available {available}, requested {requested}")]
    InsufficientStock {
        /// Laptop whose stock was short
        laptop_id: i64,
        /// Stock at the time of the check
        available: i32,
        /// Units that were asked for
        requested: i32,
    },

    /// A status change is not permitted from the current status.
    #[error("Cannot move {entity} from {from} to {to}")]
    InvalidTransition {
        /// Entity name, e.g. `"order"`
        entity: &'static str,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// A pending warranty request already covers this order line.
    #[error("A pending warranty request already exists for laptop {laptop_id} in order {order_id}")]
    DuplicateWarrantyRequest {
        /// Order the request refers to
        order_id: i64,
        /// Laptop the request refers to
        laptop_id: i64,
    },

    /// Malformed or missing input.
    #[error("Invalid input: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// Monetary value outside the accepted range or precision.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// Offending amount as text
        amount: String,
    },

    /// Username or password did not match.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The session lacks the rights for the operation.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Why the operation was refused
        message: String,
    },

    /// Integer conversion failed (e.g. a count that does not fit a column).
    #[error("Number out of range: {0}")]
    OutOfRange(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UsernameTaken { .. }
            | Self::InsufficientStock { .. }
            | Self::InvalidTransition { .. }
            | Self::DuplicateWarrantyRequest { .. } => ErrorKind::Conflict,
            Self::Validation { .. } | Self::InvalidAmount { .. } | Self::OutOfRange(_) => {
                ErrorKind::Validation
            }
            Self::InvalidCredentials | Self::PermissionDenied { .. } => ErrorKind::Forbidden,
            Self::Database(_) | Self::Io(_) => ErrorKind::Unavailable,
            Self::Config { .. } | Self::EnvVar(_) => ErrorKind::Config,
        }
    }

    /// Shorthand for a [`Error::NotFound`] with a displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
