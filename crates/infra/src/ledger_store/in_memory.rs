use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use tracing::{debug, info};

use billing_core::{Cents, InvoiceId, PaymentId};
use billing_invoicing::{
    InvoiceRecord, LedgerStore, LedgerTx, NewPayment, PaymentMethod, PaymentRecord, StoreError,
};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    invoices: BTreeMap<InvoiceId, InvoiceRecord>,
    /// Insertion order is preserved.
    payments: Vec<PaymentRecord>,
}

/// In-memory transactional ledger store.
///
/// Intended for tests/dev. Not optimized for performance: a transaction holds
/// the write lock for its whole duration and works on a private copy of the
/// state, which replaces the shared state only on commit.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
    commit_fault: Mutex<Option<String>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with [`StoreError::Injected`].
    ///
    /// The transaction's work still runs; its writes are discarded.
    pub fn fail_next_commit(&self, message: impl Into<String>) -> Result<(), StoreError> {
        let mut fault = self
            .commit_fault
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?;
        *fault = Some(message.into());
        Ok(())
    }

    pub fn invoice_count(&self) -> Result<usize, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.invoices.len())
    }

    pub fn payment_count(&self) -> Result<usize, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.payments.len())
    }

    /// Payments whose invoice no longer exists. Always empty unless the
    /// cascade is broken.
    pub fn orphaned_payments(&self) -> Result<Vec<PaymentRecord>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state
            .payments
            .iter()
            .filter(|p| !state.invoices.contains_key(&p.invoice_id))
            .cloned()
            .collect())
    }

    fn take_commit_fault(&self) -> Result<Option<String>, StoreError> {
        let mut fault = self
            .commit_fault
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(fault.take())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn transaction<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, StoreError>,
    {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut tx = InMemoryTx {
            staged: state.clone(),
            writes: 0,
        };

        let value = match work(&mut tx) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "transaction rolled back");
                return Err(err);
            }
        };

        if let Some(message) = self.take_commit_fault()? {
            debug!(writes = tx.writes, "commit failed, transaction rolled back");
            return Err(StoreError::Injected(message));
        }

        if tx.writes > 0 {
            debug!(writes = tx.writes, "transaction committed");
        }
        *state = tx.staged;
        Ok(value)
    }
}

/// Private view of the ledger for the duration of one transaction.
struct InMemoryTx {
    staged: LedgerState,
    writes: usize,
}

impl LedgerTx for InMemoryTx {
    fn insert_invoice(&mut self, invoice_total: Cents) -> Result<InvoiceRecord, StoreError> {
        let record = InvoiceRecord {
            id: InvoiceId::new(),
            invoice_total,
            created_at: Utc::now(),
        };
        self.staged.invoices.insert(record.id, record.clone());
        self.writes += 1;
        Ok(record)
    }

    fn find_invoice(&self, id: InvoiceId) -> Result<Option<InvoiceRecord>, StoreError> {
        Ok(self.staged.invoices.get(&id).cloned())
    }

    fn payments_for(&self, invoice_id: InvoiceId) -> Result<Vec<PaymentRecord>, StoreError> {
        Ok(self
            .staged
            .payments
            .iter()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect())
    }

    fn insert_payment(&mut self, payment: NewPayment) -> Result<PaymentRecord, StoreError> {
        // Constraints a relational schema would enforce.
        if !self.staged.invoices.contains_key(&payment.invoice_id) {
            return Err(StoreError::Constraint(format!(
                "payment references unknown invoice {}",
                payment.invoice_id
            )));
        }
        if payment.amount == 0 {
            return Err(StoreError::Constraint("payment amount must be positive".to_string()));
        }
        if !PaymentMethod::is_known_code(payment.payment_method_id) {
            return Err(StoreError::Constraint(format!(
                "unknown payment method code {}",
                payment.payment_method_id
            )));
        }

        let record = PaymentRecord {
            id: PaymentId::new(),
            invoice_id: payment.invoice_id,
            amount: payment.amount,
            payment_method_id: payment.payment_method_id,
            created_at: Utc::now(),
        };
        self.staged.payments.push(record.clone());
        self.writes += 1;
        Ok(record)
    }

    fn delete_invoice(&mut self, id: InvoiceId) -> Result<Option<usize>, StoreError> {
        if self.staged.invoices.remove(&id).is_none() {
            return Ok(None);
        }

        let before = self.staged.payments.len();
        self.staged.payments.retain(|p| p.invoice_id != id);
        let removed = before - self.staged.payments.len();
        self.writes += 1 + removed;

        info!(invoice_id = %id, payments_removed = removed, "cascading invoice delete staged");
        Ok(Some(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_payment(invoice_id: InvoiceId, amount: Cents) -> NewPayment {
        NewPayment {
            invoice_id,
            amount,
            payment_method_id: PaymentMethod::Cash.code(),
        }
    }

    #[test]
    fn committed_writes_are_visible() {
        let store = InMemoryLedgerStore::new();
        let invoice = store.transaction(|tx| tx.insert_invoice(1000)).unwrap();
        store
            .transaction(|tx| tx.insert_payment(new_payment(invoice.id, 250)))
            .unwrap();

        let payments = store.transaction(|tx| tx.payments_for(invoice.id)).unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 250);
        assert_eq!(store.invoice_count().unwrap(), 1);
    }

    #[test]
    fn failed_work_discards_every_staged_write() {
        let store = InMemoryLedgerStore::new();
        let result: Result<(), StoreError> = store.transaction(|tx| {
            let invoice = tx.insert_invoice(1000)?;
            tx.insert_payment(new_payment(invoice.id, 100))?;
            Err(StoreError::Unavailable("connection reset".to_string()))
        });

        assert_eq!(
            result.unwrap_err(),
            StoreError::Unavailable("connection reset".to_string())
        );
        assert_eq!(store.invoice_count().unwrap(), 0);
        assert_eq!(store.payment_count().unwrap(), 0);
    }

    #[test]
    fn injected_commit_fault_discards_writes_once() {
        let store = InMemoryLedgerStore::new();
        store.fail_next_commit("disk full").unwrap();

        let err = store.transaction(|tx| tx.insert_invoice(10)).unwrap_err();
        assert_eq!(err, StoreError::Injected("disk full".to_string()));
        assert_eq!(store.invoice_count().unwrap(), 0);

        store.transaction(|tx| tx.insert_invoice(10)).unwrap();
        assert_eq!(store.invoice_count().unwrap(), 1);
    }

    #[test]
    fn payment_for_unknown_invoice_violates_constraint() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .transaction(|tx| tx.insert_payment(new_payment(InvoiceId::new(), 100)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[test]
    fn zero_amount_and_unknown_code_violate_constraints() {
        let store = InMemoryLedgerStore::new();
        let invoice = store.transaction(|tx| tx.insert_invoice(1000)).unwrap();

        let err = store
            .transaction(|tx| tx.insert_payment(new_payment(invoice.id, 0)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        let err = store
            .transaction(|tx| {
                tx.insert_payment(NewPayment {
                    invoice_id: invoice.id,
                    amount: 100,
                    payment_method_id: 7,
                })
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
        assert_eq!(store.payment_count().unwrap(), 0);
    }

    #[test]
    fn delete_invoice_cascades_to_its_payments_only() {
        let store = InMemoryLedgerStore::new();
        let (doomed, kept) = store
            .transaction(|tx| {
                let doomed = tx.insert_invoice(1000)?;
                let kept = tx.insert_invoice(2000)?;
                tx.insert_payment(new_payment(doomed.id, 100))?;
                tx.insert_payment(new_payment(doomed.id, 200))?;
                tx.insert_payment(new_payment(kept.id, 300))?;
                Ok((doomed, kept))
            })
            .unwrap();

        let removed = store.transaction(|tx| tx.delete_invoice(doomed.id)).unwrap();
        assert_eq!(removed, Some(2));
        assert_eq!(store.payment_count().unwrap(), 1);
        assert!(store.orphaned_payments().unwrap().is_empty());
        assert_eq!(
            store.transaction(|tx| tx.payments_for(kept.id)).unwrap().len(),
            1
        );

        let again = store.transaction(|tx| tx.delete_invoice(doomed.id)).unwrap();
        assert_eq!(again, None);
    }
}
