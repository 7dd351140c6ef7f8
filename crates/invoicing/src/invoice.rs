use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use billing_core::{
    BillingError, BillingResult, Cents, DollarInput, Entity, InvoiceId, cents_to_dollars,
    dollars_to_cents,
};

use crate::errors::{Errors, Field};
use crate::payment::Payment;
use crate::payment_method::RawPaymentMethod;
use crate::store::{InvoiceRecord, LedgerStore, PaymentRecord};

/// Invoice: a total owed plus the payments recorded against it.
///
/// The invoice exclusively owns its payments; destroying it destroys them.
/// `payments` only ever holds persisted payments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: Option<InvoiceId>,
    invoice_total: Cents,
    created_at: Option<DateTime<Utc>>,
    payments: Vec<Payment>,
}

/// Result of [`Invoice::record_payment`].
///
/// Both variants carry the payment so callers can inspect `errors()` the same
/// way whatever happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The payment was committed.
    Recorded(Payment),
    /// Validation or storage rejected the payment; nothing was written.
    Rejected(Payment),
}

impl PaymentOutcome {
    pub fn payment(&self) -> &Payment {
        match self {
            PaymentOutcome::Recorded(p) | PaymentOutcome::Rejected(p) => p,
        }
    }

    pub fn into_payment(self) -> Payment {
        match self {
            PaymentOutcome::Recorded(p) | PaymentOutcome::Rejected(p) => p,
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, PaymentOutcome::Recorded(_))
    }

    pub fn errors(&self) -> &Errors {
        self.payment().errors()
    }
}

impl Invoice {
    /// Unsaved invoice with a total in cents.
    pub fn new(invoice_total: Cents) -> Self {
        Self {
            id: None,
            invoice_total,
            created_at: None,
            payments: Vec::new(),
        }
    }

    /// Unsaved invoice with a total in dollars.
    pub fn from_dollars(value: impl Into<DollarInput>) -> BillingResult<Self> {
        Ok(Self::new(dollars_to_cents(value)?))
    }

    /// Rehydrate a persisted invoice and its payments.
    pub fn from_records(record: &InvoiceRecord, payments: &[PaymentRecord]) -> Self {
        Self {
            id: Some(record.id),
            invoice_total: record.invoice_total,
            created_at: Some(record.created_at),
            payments: payments.iter().map(Payment::from_record).collect(),
        }
    }

    /// Total owed, in cents.
    pub fn invoice_total(&self) -> Cents {
        self.invoice_total
    }

    pub fn invoice_total_dollars(&self) -> Decimal {
        cents_to_dollars(self.invoice_total)
    }

    /// Set the total from dollars. Only allowed before the invoice is saved;
    /// a persisted total is never edited.
    pub fn set_invoice_total_dollars(&mut self, value: impl Into<DollarInput>) -> BillingResult<()> {
        if self.is_persisted() {
            return Err(BillingError::persistence(
                "invoice total cannot change once persisted",
            ));
        }
        self.invoice_total = dollars_to_cents(value)?;
        Ok(())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Sum of recorded payments, in cents.
    pub fn total_paid_cents(&self) -> Cents {
        self.payments
            .iter()
            .filter_map(Payment::amount)
            .fold(0, Cents::saturating_add)
    }

    /// Remaining amount owed in cents. Never negative; recomputed on every call.
    pub fn amount_owed_cents(&self) -> Cents {
        self.invoice_total.saturating_sub(self.total_paid_cents())
    }

    pub fn amount_owed_dollars(&self) -> Decimal {
        cents_to_dollars(self.amount_owed_cents())
    }

    /// True when fully paid or overpaid.
    pub fn is_fully_paid(&self) -> bool {
        self.amount_owed_cents() == 0
    }

    /// Insert this invoice, allocating its identity.
    pub fn save<S: LedgerStore>(&mut self, store: &S) -> BillingResult<()> {
        if self.is_persisted() {
            return Err(BillingError::persistence("invoice is already persisted"));
        }
        let total = self.invoice_total;
        let record = store.transaction(|tx| tx.insert_invoice(total))?;
        self.id = Some(record.id);
        self.created_at = Some(record.created_at);
        Ok(())
    }

    /// Load an invoice with its payments in insertion order.
    pub fn find<S: LedgerStore>(store: &S, id: InvoiceId) -> BillingResult<Self> {
        let (record, payments) = store
            .transaction(|tx| {
                let Some(record) = tx.find_invoice(id)? else {
                    return Ok(None);
                };
                let payments = tx.payments_for(id)?;
                Ok(Some((record, payments)))
            })?
            .ok_or_else(BillingError::not_found)?;

        Ok(Self::from_records(&record, &payments))
    }

    /// Refresh from persisted state, picking up payments recorded elsewhere.
    pub fn reload<S: LedgerStore>(&mut self, store: &S) -> BillingResult<()> {
        let id = self.id.ok_or_else(BillingError::not_found)?;
        *self = Self::find(store, id)?;
        Ok(())
    }

    /// Delete the invoice and all of its payments in one transaction.
    ///
    /// Returns the number of payments removed. An unsaved invoice has nothing
    /// to delete. On success the invoice is left unpersisted with no payments;
    /// on failure it is untouched.
    pub fn destroy<S: LedgerStore>(&mut self, store: &S) -> BillingResult<usize> {
        let Some(id) = self.id else {
            return Ok(0);
        };
        let removed = store
            .transaction(|tx| tx.delete_invoice(id))?
            .ok_or_else(BillingError::not_found)?;

        self.id = None;
        self.created_at = None;
        self.payments.clear();

        info!(invoice_id = %id, payments_removed = removed, "invoice destroyed");
        Ok(removed)
    }

    /// Record a payment against this invoice.
    ///
    /// An amount that cannot be converted to cents is returned as `Err` before
    /// any payment is built. Everything after that comes back as a
    /// [`PaymentOutcome`]: validation errors stay on the payment, and a storage
    /// failure is attached as a base error.
    pub fn record_payment<S: LedgerStore>(
        &mut self,
        store: &S,
        amount_dollars: impl Into<DollarInput>,
        payment_method: impl Into<RawPaymentMethod>,
    ) -> BillingResult<PaymentOutcome> {
        let amount = dollars_to_cents(amount_dollars)?;
        let mut payment = Payment::build(self.id, Some(amount), Some(payment_method.into()));

        match store.transaction(|tx| payment.save_in(tx)) {
            Ok(true) => {
                info!(
                    invoice_id = ?self.id,
                    payment_id = ?payment.id(),
                    amount,
                    "payment recorded"
                );
                self.payments.push(payment.clone());
                Ok(PaymentOutcome::Recorded(payment))
            }
            Ok(false) => {
                warn!(
                    invoice_id = ?self.id,
                    errors = ?payment.errors().full_messages(),
                    "payment rejected by validation"
                );
                Ok(PaymentOutcome::Rejected(payment))
            }
            Err(err) => {
                warn!(invoice_id = ?self.id, error = %err, "payment could not be persisted");
                payment.forget_identity();
                payment.errors_mut().add(
                    Field::Base,
                    BillingError::persistence(format!("Unable to record payment: {err}")),
                );
                Ok(PaymentOutcome::Rejected(payment))
            }
        }
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> Option<Self::Id> {
        self.id
    }
}
