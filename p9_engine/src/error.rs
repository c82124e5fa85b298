//! Error types for the P9 engine.
//!
//! All validation happens at the boundary: pay facts are checked before a
//! period is computed, period records are checked before a card is
//! aggregated, and bracket tables are checked when they are built.  The
//! bracket arithmetic itself never fails.

use thiserror::Error;

/// Errors raised by the payroll tax engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayrollError {
    /// A pay fact is negative or otherwise inconsistent.
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("month {0} is outside 1..=12")]
    InvalidMonth(u32),

    /// Two period records were supplied for the same month of one card.
    #[error("month {0} was supplied more than once")]
    DuplicateMonth(u32),

    #[error("pay period belongs to {found}, expected tax year {expected}")]
    YearMismatch { expected: i32, found: i32 },

    #[error("{0} pay periods supplied, a tax year has at most 12")]
    TooManyPeriods(usize),

    /// The bracket table is empty, unordered, or not open-ended.
    #[error("invalid bracket table: {0}")]
    InvalidBrackets(String),

    #[error("no tax year configuration covers {0}")]
    UnknownTaxYear(i32),
}

impl PayrollError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PayrollError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, PayrollError>;
