//! IME Pay gateway types and data structures

use crate::error::ImePayError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Gateway environment; each has its own fixed base URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Live,
    #[default]
    Test,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Live => "https://payment.imepay.com.np:7979/api/Web",
            Environment::Test => "https://testpayment.imepay.com.np:7979/api/Web",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Live => f.write_str("LIVE"),
            Environment::Test => f.write_str("TEST"),
        }
    }
}

impl FromStr for Environment {
    type Err = ImePayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LIVE" => Ok(Environment::Live),
            "TEST" => Ok(Environment::Test),
            other => Err(ImePayError::configuration(format!(
                "environment must be LIVE or TEST, got {}",
                other
            ))),
        }
    }
}

/// Transaction status values used by the gateway. Parsing is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownStatus;

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown transaction status")
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for TransactionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(TransactionStatus::Success),
            "FAILED" => Ok(TransactionStatus::Failed),
            "PENDING" => Ok(TransactionStatus::Pending),
            "CANCELLED" => Ok(TransactionStatus::Cancelled),
            _ => Err(UnknownStatus),
        }
    }
}

/// Decoded gateway reply.
///
/// `fields` is the JSON object exactly as returned; `success` is derived from
/// it by [`GatewayResponse::from_fields`].
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub success: bool,
    pub http_status: u16,
    pub fields: Map<String, Value>,
}

impl GatewayResponse {
    pub fn from_fields(http_status: u16, fields: Map<String, Value>) -> Self {
        let success = is_success_response(&fields);
        Self {
            success,
            http_status,
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of `key`, if present and a string.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn token_id(&self) -> Option<&str> {
        self.field_str("TokenId").filter(|s| !s.is_empty())
    }

    pub fn payment_url(&self) -> Option<&str> {
        self.field_str("PaymentUrl").filter(|s| !s.is_empty())
    }

    pub fn response_code(&self) -> Option<String> {
        match self.fields.get("ResponseCode")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        self.field_str("Status").and_then(|s| s.parse().ok())
    }

    pub fn message(&self) -> Option<&str> {
        self.field_str("Message")
            .or_else(|| self.field_str("ResponseDescription"))
    }
}

fn is_populated(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(_)) => true,
    }
}

fn is_zero_code(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => s == "0",
        Some(Value::Number(n)) => n.as_u64() == Some(0) || n.as_i64() == Some(0),
        _ => false,
    }
}

/// Success rules, first match wins: zero `ResponseCode`, `Status` of
/// `SUCCESS`, a populated `TokenId`, a populated `PaymentUrl`.
pub fn is_success_response(fields: &Map<String, Value>) -> bool {
    if is_zero_code(fields.get("ResponseCode")) {
        return true;
    }

    if fields.get("Status").and_then(Value::as_str) == Some("SUCCESS") {
        return true;
    }

    if is_populated(fields.get("TokenId")) {
        return true;
    }

    is_populated(fields.get("PaymentUrl"))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct InitiateRequest<'a> {
    pub token_id: &'a str,
    pub merchant_code: &'a str,
    pub ref_id: &'a str,
    pub amount: &'a str,
    pub reference_value: &'a str,
    pub product_name: &'a str,
    pub product_url: &'a str,
    pub transaction_recording_url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct TokenRequest<'a> {
    pub merchant_code: &'a str,
    pub merchant_name: &'a str,
    pub module: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Body shared by Verify, CheckTransaction and Cancel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct TransactionRequest<'a> {
    pub token_id: &'a str,
    pub merchant_code: &'a str,
    pub ref_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}
