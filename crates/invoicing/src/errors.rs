//! Per-record error set, keyed by field.
//!
//! Validation and persistence failures are attached here instead of being
//! returned as `Err`, so callers inspect a record the same way whether it was
//! rejected by validation or by storage.

use billing_core::BillingError;

/// Field an error is attached to. `Base` holds cross-field failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Base,
    Invoice,
    Amount,
    PaymentMethodId,
    RawPaymentMethod,
}

impl Field {
    /// Human-readable attribute name used in full messages.
    pub fn human_name(self) -> &'static str {
        match self {
            Field::Base => "",
            Field::Invoice => "Invoice",
            Field::Amount => "Amount",
            Field::PaymentMethodId => "Payment method",
            Field::RawPaymentMethod => "Raw payment method",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub field: Field,
    pub error: BillingError,
}

impl RecordError {
    /// Message prefixed with the field name, e.g. `"Amount can't be blank"`.
    pub fn full_message(&self) -> String {
        match self.field {
            Field::Base => self.error.message().to_string(),
            field => format!("{} {}", field.human_name(), self.error.message()),
        }
    }
}

/// Errors attached to a record, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    entries: Vec<RecordError>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, error: BillingError) {
        self.entries.push(RecordError { field, error });
    }

    /// Errors attached to `field`.
    pub fn on(&self, field: Field) -> Vec<&BillingError> {
        self.entries
            .iter()
            .filter(|e| e.field == field)
            .map(|e| &e.error)
            .collect()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.entries.iter().any(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordError> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.entries.iter().map(RecordError::full_message).collect()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a RecordError;
    type IntoIter = core::slice::Iter<'a, RecordError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
