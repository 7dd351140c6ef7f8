//! Ledger storage adapters.
//!
//! Adapters implement the `LedgerStore` contract from `billing-invoicing`:
//! identity allocation, all-or-nothing transactions, and cascading deletion
//! of an invoice's payments.

pub mod in_memory;

pub use in_memory::InMemoryLedgerStore;
