//! Invoicing domain module.
//!
//! Invoices own a total in cents and the payments recorded against them. The
//! outstanding balance is always derived from the payments, never stored.
//! Storage is reached only through the [`LedgerStore`] contract, so this crate
//! stays free of any concrete backend.

pub mod errors;
pub mod invoice;
pub mod payment;
pub mod payment_method;
pub mod store;

pub use errors::{Errors, Field, RecordError};
pub use invoice::{Invoice, PaymentOutcome};
pub use payment::Payment;
pub use payment_method::{PaymentMethod, RawPaymentMethod};
pub use store::{InvoiceRecord, LedgerStore, LedgerTx, NewPayment, PaymentRecord, StoreError};
