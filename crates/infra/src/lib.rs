//! Infrastructure layer: storage adapters for the billing domain.

pub mod ledger_store;


pub use ledger_store::InMemoryLedgerStore;
