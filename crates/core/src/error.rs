//! Domain error model.

use thiserror::Error;

/// Result type used across the billing domain.
pub type BillingResult<T> = Result<T, BillingError>;

/// Billing domain error.
///
/// Conversion failures are returned directly to the caller. Record-level
/// failures are collected onto the record's own error set instead (see the
/// invoicing crate), but use the same kinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Amount absent, negative, non-numeric, out of range, or not strictly
    /// positive where a payment requires it.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A payment has no resolvable owning invoice.
    #[error("missing invoice: {0}")]
    MissingInvoice(String),

    /// Normalized payment method is not one of the known methods.
    #[error("unsupported payment method: {0}")]
    UnsupportedPaymentMethod(String),

    /// The storage collaborator rejected or could not complete a write.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found.
    #[error("not found")]
    NotFound,
}

impl BillingError {
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn missing_invoice(msg: impl Into<String>) -> Self {
        Self::MissingInvoice(msg.into())
    }

    pub fn unsupported_payment_method(msg: impl Into<String>) -> Self {
        Self::UnsupportedPaymentMethod(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceFailure(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// The human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidAmount(m)
            | Self::MissingInvoice(m)
            | Self::UnsupportedPaymentMethod(m)
            | Self::PersistenceFailure(m)
            | Self::InvalidId(m) => m,
            Self::NotFound => "not found",
        }
    }
}
