//! Inbound IME Pay callback handling
//!
//! The gateway POSTs a flat key/value payload to the merchant's server when a
//! transaction settles. [`CallbackValidator`] authenticates that payload
//! against the merchant credential and normalises the interesting fields.

pub mod signature;
pub mod validator;

pub use validator::CallbackValidator;

use crate::error::{ImePayError, ImePayResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Callback field names as sent by the gateway
pub mod fields {
    pub const MERCHANT_CODE: &str = "MerchantCode";
    pub const TRANSACTION_ID: &str = "TransactionId";
    pub const REF_ID: &str = "RefId";
    pub const AMOUNT: &str = "Amount";
    pub const STATUS: &str = "Status";
    pub const MESSAGE: &str = "Message";
    pub const SIGNATURE: &str = "Signature";

    pub const REQUIRED: [&str; 3] = [MERCHANT_CODE, TRANSACTION_ID, REF_ID];
}

/// Merchant identity and the shared secret used for callback signatures.
#[derive(Clone, PartialEq, Eq)]
pub struct MerchantCredential {
    merchant_code: String,
    merchant_secret: String,
}

impl MerchantCredential {
    pub fn new(merchant_code: impl Into<String>, merchant_secret: impl Into<String>) -> Self {
        Self {
            merchant_code: merchant_code.into(),
            merchant_secret: merchant_secret.into(),
        }
    }

    pub fn merchant_code(&self) -> &str {
        &self.merchant_code
    }

    pub fn merchant_secret(&self) -> &str {
        &self.merchant_secret
    }
}

impl fmt::Debug for MerchantCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantCredential")
            .field("merchant_code", &self.merchant_code)
            .field("merchant_secret", &"***")
            .finish()
    }
}

/// Raw callback fields, kept in byte-wise key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackPayload(BTreeMap<String, String>);

impl CallbackPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a JSON object whose values are all strings.
    pub fn from_json(body: &[u8]) -> ImePayResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| ImePayError::invalid_payload(format!("expected a JSON object of strings: {}", e)))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate fields in ascending byte order of their keys.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CallbackPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for CallbackPayload {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl From<HashMap<String, String>> for CallbackPayload {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map.into_iter().collect())
    }
}

/// Why a callback was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// `MerchantCode`, `TransactionId` or `RefId` is absent
    MissingFields,
    /// `MerchantCode` differs from the configured merchant
    MerchantMismatch,
    /// The provided signature does not match the computed one
    SignatureMismatch,
    /// Unsigned callback with an unrecognised `Status`
    InvalidStatus,
    /// Unsigned callback while unsigned callbacks are refused
    MissingSignature,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingFields => "MISSING_FIELDS",
            Self::MerchantMismatch => "MERCHANT_MISMATCH",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::MissingSignature => "MISSING_SIGNATURE",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a callback that carries no `Signature`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnsignedPolicy {
    /// Accept it when its `Status` (if any) is a known value. Matches the
    /// gateway's documented behaviour, but anyone who knows the merchant code
    /// can forge such a callback.
    #[default]
    Accept,
    /// Reject every unsigned callback with [`RejectReason::MissingSignature`].
    Reject,
}

/// Normalised fields of an accepted callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackFields {
    pub transaction_id: String,
    pub ref_id: String,
    pub amount: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid(CallbackFields),
    Invalid(RejectReason),
}

impl ValidationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(reason) => Some(*reason),
        }
    }

    pub fn fields(&self) -> Option<&CallbackFields> {
        match self {
            Self::Valid(fields) => Some(fields),
            Self::Invalid(_) => None,
        }
    }

    pub fn into_result(self) -> Result<CallbackFields, RejectReason> {
        match self {
            Self::Valid(fields) => Ok(fields),
            Self::Invalid(reason) => Err(reason),
        }
    }
}
