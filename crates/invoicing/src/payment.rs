//! Payment entity: a single monetary movement against an invoice.
//!
//! A payment starts **unpersisted** (mutable, validity unknown) and becomes
//! **persisted** once a save succeeds. Persisted payments are terminal: there
//! are no updates and no voiding.

use chrono::{DateTime, Utc};

use billing_core::{BillingError, Cents, Entity, InvoiceId, PaymentId};

use crate::errors::{Errors, Field};
use crate::payment_method::{PaymentMethod, RawPaymentMethod};
use crate::store::{LedgerStore, LedgerTx, NewPayment, PaymentRecord, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    id: Option<PaymentId>,
    invoice_id: Option<InvoiceId>,
    amount: Option<Cents>,
    payment_method_id: Option<u8>,
    raw_payment_method: Option<RawPaymentMethod>,
    created_at: Option<DateTime<Utc>>,
    errors: Errors,
}

impl Payment {
    /// Build an unpersisted payment. Nothing is validated until it is saved.
    pub fn build(
        invoice_id: Option<InvoiceId>,
        amount: Option<Cents>,
        raw_payment_method: Option<RawPaymentMethod>,
    ) -> Self {
        Self {
            id: None,
            invoice_id,
            amount,
            payment_method_id: None,
            raw_payment_method,
            created_at: None,
            errors: Errors::new(),
        }
    }

    /// Rehydrate a persisted payment.
    pub fn from_record(record: &PaymentRecord) -> Self {
        Self {
            id: Some(record.id),
            invoice_id: Some(record.invoice_id),
            amount: Some(record.amount),
            payment_method_id: Some(record.payment_method_id),
            raw_payment_method: None,
            created_at: Some(record.created_at),
            errors: Errors::new(),
        }
    }

    pub fn invoice_id(&self) -> Option<InvoiceId> {
        self.invoice_id
    }

    /// Amount in cents.
    pub fn amount(&self) -> Option<Cents> {
        self.amount
    }

    /// Stored method code.
    pub fn payment_method_id(&self) -> Option<u8> {
        self.payment_method_id
    }

    /// Symbolic method for the stored code; `None` if unset or unknown.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method_id.and_then(PaymentMethod::from_code)
    }

    pub fn raw_payment_method(&self) -> Option<&RawPaymentMethod> {
        self.raw_payment_method.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Errors from the most recent validation or save attempt.
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    pub(crate) fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    /// True when the last validation or save attempt left no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Validate without saving. Returns whether the payment is valid.
    pub fn validate<S: LedgerStore>(&mut self, store: &S) -> Result<bool, StoreError> {
        store.transaction(|tx| self.run_validations(tx))
    }

    /// Validate and insert in a transaction of its own.
    ///
    /// `Ok(false)` means validation failed and the errors are attached to the
    /// payment. `Err` means storage failed; the payment is left unpersisted.
    pub fn save<S: LedgerStore>(&mut self, store: &S) -> Result<bool, StoreError> {
        if self.is_persisted() {
            return Ok(true);
        }
        let result = store.transaction(|tx| self.save_in(tx));
        if result.is_err() {
            self.forget_identity();
        }
        result
    }

    /// Validate and insert using an already open transaction.
    ///
    /// On `Err` the caller must treat the payment as unpersisted even if an
    /// identity was staged; [`Payment::save`] does that itself.
    pub fn save_in(&mut self, tx: &mut dyn LedgerTx) -> Result<bool, StoreError> {
        if self.is_persisted() {
            return Ok(true);
        }
        if !self.run_validations(tx)? {
            return Ok(false);
        }
        let (Some(invoice_id), Some(amount), Some(payment_method_id)) =
            (self.invoice_id, self.amount, self.payment_method_id)
        else {
            return Ok(false);
        };

        let record = tx.insert_payment(NewPayment {
            invoice_id,
            amount,
            payment_method_id,
        })?;
        self.id = Some(record.id);
        self.created_at = Some(record.created_at);
        Ok(true)
    }

    pub(crate) fn forget_identity(&mut self) {
        self.id = None;
        self.created_at = None;
    }

    fn run_validations(&mut self, tx: &dyn LedgerTx) -> Result<bool, StoreError> {
        self.errors.clear();
        self.assign_payment_method_id();

        self.validate_invoice(tx)?;
        self.validate_amount();
        self.validate_payment_method();
        Ok(self.errors.is_empty())
    }

    /// Derive the stored code from the transient raw method, if one was given.
    fn assign_payment_method_id(&mut self) {
        if let Some(raw) = self.raw_payment_method.as_ref().filter(|r| r.is_present()) {
            self.payment_method_id = raw.normalize().map(PaymentMethod::code);
        }
    }

    fn validate_invoice(&mut self, tx: &dyn LedgerTx) -> Result<(), StoreError> {
        let exists = match self.invoice_id {
            Some(id) => tx.invoice_exists(id)?,
            None => false,
        };
        if !exists {
            self.errors
                .add(Field::Invoice, BillingError::missing_invoice("must exist"));
        }
        Ok(())
    }

    fn validate_amount(&mut self) {
        match self.amount {
            None => self
                .errors
                .add(Field::Amount, BillingError::invalid_amount("can't be blank")),
            Some(0) => self.errors.add(
                Field::Amount,
                BillingError::invalid_amount("must be greater than 0"),
            ),
            Some(_) => {}
        }
    }

    fn validate_payment_method(&mut self) {
        match self.payment_method_id {
            None => self.errors.add(
                Field::PaymentMethodId,
                BillingError::unsupported_payment_method("can't be blank"),
            ),
            Some(code) if !PaymentMethod::is_known_code(code) => self.errors.add(
                Field::PaymentMethodId,
                BillingError::unsupported_payment_method("is not included in the list"),
            ),
            Some(_) => {}
        }

        let unsupported = self
            .raw_payment_method
            .as_ref()
            .is_some_and(|raw| raw.is_present() && raw.normalize().is_none());
        if unsupported {
            self.errors.add(
                Field::RawPaymentMethod,
                BillingError::unsupported_payment_method("is not supported"),
            );
        }
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> Option<Self::Id> {
        self.id
    }
}
