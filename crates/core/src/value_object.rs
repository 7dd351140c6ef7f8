//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity** and are **immutable**: two values with the
/// same attributes are interchangeable. In this crate the payment method and the
/// dollar-facing input are value objects; invoices and payments are entities.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
