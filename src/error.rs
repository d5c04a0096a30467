use thiserror::Error;

pub type ImePayResult<T> = Result<T, ImePayError>;

/// What went wrong while talking to the gateway or decoding its data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImePayErrorKind {
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Timeout error: request to {url} timed out")]
    Timeout { url: String },

    #[error("Invalid response from IME Pay API: {message}")]
    InvalidResponse { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid callback payload: {message}")]
    InvalidPayload { message: String },
}

/// Auxiliary diagnostics attached to an [`ImePayError`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorData {
    /// HTTP status of the gateway reply, when one was received
    pub http_status: Option<u16>,
    /// Raw response body, kept when it could not be decoded
    pub raw_response: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}")]
pub struct ImePayError {
    pub kind: ImePayErrorKind,
    pub data: ErrorData,
}

impl ImePayError {
    pub fn new(kind: ImePayErrorKind) -> Self {
        Self {
            kind,
            data: ErrorData::default(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ImePayErrorKind::Transport {
            message: message.into(),
        })
    }

    pub fn timeout(url: impl Into<String>) -> Self {
        Self::new(ImePayErrorKind::Timeout { url: url.into() })
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ImePayErrorKind::InvalidResponse {
            message: message.into(),
        })
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ImePayErrorKind::Serialization {
            message: message.into(),
        })
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ImePayErrorKind::Configuration {
            message: message.into(),
        })
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(ImePayErrorKind::InvalidPayload {
            message: message.into(),
        })
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.data.http_status = Some(status);
        self
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.data.raw_response = Some(raw.into());
        self
    }

    pub fn http_status(&self) -> Option<u16> {
        self.data.http_status
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ImePayErrorKind::Timeout { .. })
    }
}

impl From<reqwest::Error> for ImePayError {
    fn from(err: reqwest::Error) -> Self {
        let error = if err.is_timeout() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            ImePayError::timeout(url)
        } else {
            ImePayError::transport(format!("Request error: {}", err))
        };

        match err.status() {
            Some(status) => error.with_http_status(status.as_u16()),
            None => error,
        }
    }
}

impl From<serde_json::Error> for ImePayError {
    fn from(err: serde_json::Error) -> Self {
        ImePayError::serialization(format!("JSON error: {}", err))
    }
}
