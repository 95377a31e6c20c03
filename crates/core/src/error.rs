//! Why a ledger request was refused.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A banking request that breaks a rule of the ledger.
///
/// Returned before anything is changed or written. Disk and lock failures are
/// reported by the infrastructure layer with their own type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad input: a zero or negative amount, an unknown account kind, a
    /// policy setter on the wrong account kind, or an amount that would
    /// overflow a balance.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request is well-formed but the balance rules forbid it: insufficient
    /// funds in a savings account, an overdraft beyond the limit, or removing a
    /// customer who still owns accounts.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A customer id that is not exactly nine digits, or an empty account id
    /// or one containing whitespace.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The named customer or account does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A duplicate customer id, or no free account id could be drawn.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
