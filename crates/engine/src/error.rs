//! The module contains the error the engine can throw.
//!
//! The errors a caller is expected to handle are:
//!
//! - [`Forbidden`] the user has no (write) access to the ledger.
//! - [`KeyNotFound`] a ledger, bank account, transaction, matcher, category
//!   or booking does not exist (or is not visible from the given ledger).
//! - [`AlreadyMatched`] the bank transaction already carries a booking.
//! - [`NoApplicableMatcher`] the requested matcher exists but its filters
//!   reject the transaction.
//! - [`UnsupportedTarget`] the matcher target kind is not implemented.
//!
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`AlreadyMatched`]: EngineError::AlreadyMatched
//!  [`NoApplicableMatcher`]: EngineError::NoApplicableMatcher
//!  [`UnsupportedTarget`]: EngineError::UnsupportedTarget
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Already matched: {0}")]
    AlreadyMatched(String),
    #[error("No applicable matcher: {0}")]
    NoApplicableMatcher(String),
    #[error("Unsupported target kind: {0}")]
    UnsupportedTarget(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::AlreadyMatched(a), Self::AlreadyMatched(b)) => a == b,
            (Self::NoApplicableMatcher(a), Self::NoApplicableMatcher(b)) => a == b,
            (Self::UnsupportedTarget(a), Self::UnsupportedTarget(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::InvalidConfig(a), Self::InvalidConfig(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
