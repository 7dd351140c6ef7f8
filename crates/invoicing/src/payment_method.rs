//! Closed set of payment methods and the normalization of caller input.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use billing_core::ValueObject;

/// Payment channel. Persisted as a small integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Check,
    Charge,
}

impl ValueObject for PaymentMethod {}

/// Bidirectional mapping between methods, their keys and their stored codes.
const METHODS: [(PaymentMethod, &str, u8); 3] = [
    (PaymentMethod::Cash, "cash", 1),
    (PaymentMethod::Check, "check", 2),
    (PaymentMethod::Charge, "charge", 3),
];

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Cash, PaymentMethod::Check, PaymentMethod::Charge];

    /// Stored integer code.
    pub fn code(self) -> u8 {
        METHODS
            .iter()
            .find_map(|(m, _, code)| (*m == self).then_some(*code))
            .unwrap_or_default()
    }

    /// Symbolic key, e.g. `"cash"`.
    pub fn key(self) -> &'static str {
        METHODS
            .iter()
            .find_map(|(m, key, _)| (*m == self).then_some(*key))
            .unwrap_or_default()
    }

    /// Map a stored code back to its method. Unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        METHODS.iter().find_map(|(m, _, c)| (*c == code).then_some(*m))
    }

    /// Look up an already-normalized key. Matching is exact.
    pub fn from_key(key: &str) -> Option<Self> {
        METHODS.iter().find_map(|(m, k, _)| (*k == key).then_some(*m))
    }

    pub fn is_known_code(code: u8) -> bool {
        Self::from_code(code).is_some()
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// Payment method exactly as a caller supplied it. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPaymentMethod {
    /// Free text, normalized by trimming and lower-casing.
    Text(String),
    /// Already symbolic; used as-is.
    Method(PaymentMethod),
    /// Input of a type that cannot name a method (number, object, ...).
    /// Holds a rendering of the value for diagnostics.
    Unrecognized(String),
}

impl RawPaymentMethod {
    /// Whether the caller supplied anything at all. Blank text counts as absent.
    pub fn is_present(&self) -> bool {
        match self {
            RawPaymentMethod::Text(text) => !text.trim().is_empty(),
            RawPaymentMethod::Method(_) => true,
            RawPaymentMethod::Unrecognized(rendered) => !rendered.is_empty(),
        }
    }

    /// Resolve to a known method.
    ///
    /// Never fails loudly: anything that cannot be interpreted resolves to `None`
    /// and is reported later by validation.
    pub fn normalize(&self) -> Option<PaymentMethod> {
        match self {
            RawPaymentMethod::Text(text) => PaymentMethod::from_key(&text.trim().to_lowercase()),
            RawPaymentMethod::Method(method) => Some(*method),
            RawPaymentMethod::Unrecognized(_) => None,
        }
    }
}

impl From<PaymentMethod> for RawPaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        RawPaymentMethod::Method(value)
    }
}

impl From<&str> for RawPaymentMethod {
    fn from(value: &str) -> Self {
        RawPaymentMethod::Text(value.to_string())
    }
}

impl From<String> for RawPaymentMethod {
    fn from(value: String) -> Self {
        RawPaymentMethod::Text(value)
    }
}

impl From<JsonValue> for RawPaymentMethod {
    fn from(value: JsonValue) -> Self {
        let blank = match &value {
            JsonValue::Null | JsonValue::Bool(false) => true,
            JsonValue::Array(items) => items.is_empty(),
            JsonValue::Object(map) => map.is_empty(),
            _ => false,
        };
        match value {
            JsonValue::String(text) => RawPaymentMethod::Text(text),
            _ if blank => RawPaymentMethod::Unrecognized(String::new()),
            other => RawPaymentMethod::Unrecognized(other.to_string()),
        }
    }
}
