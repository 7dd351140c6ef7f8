//! Persistence collaborator contract.
//!
//! The domain never talks to a concrete backend. It asks a [`LedgerStore`] to
//! run a unit of work inside a transaction and performs all reads and writes
//! through the [`LedgerTx`] handed to that closure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use billing_core::{BillingError, Cents, InvoiceId, PaymentId};

/// Persisted invoice row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    /// Total owed, in cents.
    pub invoice_total: Cents,
    pub created_at: DateTime<Utc>,
}

/// Persisted payment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    /// Amount paid, in cents. Always positive.
    pub amount: Cents,
    pub payment_method_id: u8,
    pub created_at: DateTime<Utc>,
}

/// A validated payment about to be inserted (identity not yet allocated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub invoice_id: InvoiceId,
    pub amount: Cents,
    pub payment_method_id: u8,
}

/// Storage operation error.
///
/// These are **infrastructure errors**; record validation problems never show
/// up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    /// Fault injected by a test or dev harness.
    #[error("injected failure: {0}")]
    Injected(String),

    #[error("lock poisoned")]
    LockPoisoned,
}

impl From<StoreError> for BillingError {
    fn from(err: StoreError) -> Self {
        BillingError::persistence(err.to_string())
    }
}

/// Operations available inside a transaction.
///
/// Writes staged through a `LedgerTx` become visible to other callers only if
/// the enclosing [`LedgerStore::transaction`] commits.
pub trait LedgerTx {
    /// Insert an invoice, allocating its identity.
    fn insert_invoice(&mut self, invoice_total: Cents) -> Result<InvoiceRecord, StoreError>;

    fn find_invoice(&self, id: InvoiceId) -> Result<Option<InvoiceRecord>, StoreError>;

    fn invoice_exists(&self, id: InvoiceId) -> Result<bool, StoreError> {
        Ok(self.find_invoice(id)?.is_some())
    }

    /// Payments recorded against an invoice, in insertion order.
    fn payments_for(&self, invoice_id: InvoiceId) -> Result<Vec<PaymentRecord>, StoreError>;

    /// Insert a payment, allocating its identity.
    ///
    /// Implementations must reject payments whose invoice does not exist.
    fn insert_payment(&mut self, payment: NewPayment) -> Result<PaymentRecord, StoreError>;

    /// Delete an invoice together with every payment that references it.
    ///
    /// Returns the number of payments removed, or `None` if the invoice did
    /// not exist.
    fn delete_invoice(&mut self, id: InvoiceId) -> Result<Option<usize>, StoreError>;
}

/// Transactional ledger storage.
///
/// ## Atomicity
///
/// `transaction()` runs `work` against a private view of the store. If `work`
/// returns `Ok`, every write it made is committed at once; if it returns `Err`
/// (or the commit itself fails), nothing it wrote is ever observable.
///
/// No isolation beyond that is promised: two transactions touching the same
/// invoice may interleave, and derived values such as the amount owed are
/// only as fresh as the last read.
pub trait LedgerStore: Send + Sync {
    fn transaction<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore,
{
    fn transaction<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, StoreError>,
    {
        (**self).transaction(work)
    }
}
