//! `billing-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error model, typed identifiers, and exact money conversion.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{BillingError, BillingResult};
pub use id::{InvoiceId, PaymentId};
pub use money::{Cents, DollarInput, cents_to_dollars, dollars_to_cents};
pub use value_object::ValueObject;
