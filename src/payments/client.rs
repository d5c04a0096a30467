//! IME Pay gateway client
//!
//! Every operation serialises a flat JSON body, POSTs it to the environment's
//! base URL and decodes the JSON object that comes back. The gateway carries
//! the token inside the body, so there is no authorization header.

use crate::error::{ImePayError, ImePayResult};
use crate::logging::{self, SharedLogger};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{
    Environment, GatewayResponse, InitiateRequest, TokenRequest, TransactionRequest,
};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CANCEL_REASON: &str = "Cancelled by merchant";

/// IME Pay client configuration
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub environment: Environment,
    /// Merchant code issued by IME Pay
    pub merchant_code: String,
    pub merchant_name: String,
    pub module: String,
    /// API username
    pub username: String,
    /// API password
    pub password: String,
    /// Reference value sent with every payment initiation
    pub reference_value: String,
    /// Amount sent with every payment initiation
    pub amount: String,
    /// URL the gateway posts callbacks to
    pub transaction_recording_url: String,
    /// Overrides the environment's base URL when set
    pub base_url: Option<String>,
    /// Per-request timeout, must be non-zero
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Test,
            merchant_code: String::new(),
            merchant_name: String::new(),
            module: String::new(),
            username: String::new(),
            password: String::new(),
            reference_value: String::new(),
            amount: String::new(),
            transaction_recording_url: String::new(),
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("environment", &self.environment)
            .field("merchant_code", &self.merchant_code)
            .field("merchant_name", &self.merchant_name)
            .field("module", &self.module)
            .field("username", &self.username)
            .field("password", &"***")
            .field("reference_value", &self.reference_value)
            .field("amount", &self.amount)
            .field("transaction_recording_url", &self.transaction_recording_url)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GatewayConfig {
    /// Create config from `IMEPAY_*` environment variables
    pub fn from_env() -> ImePayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> ImePayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                ImePayError::configuration(format!("{} environment variable is required", key))
            })
        };
        let optional = |key: &str| lookup(key).unwrap_or_default();

        let environment = match lookup("IMEPAY_ENVIRONMENT") {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        let timeout = match lookup("IMEPAY_TIMEOUT_SECS") {
            Some(value) => value.trim().parse().map(Duration::from_secs).map_err(|_| {
                ImePayError::configuration(format!(
                    "IMEPAY_TIMEOUT_SECS must be a number of seconds, got {}",
                    value
                ))
            })?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            environment,
            merchant_code: required("IMEPAY_MERCHANT_CODE")?,
            merchant_name: optional("IMEPAY_MERCHANT_NAME"),
            module: optional("IMEPAY_MODULE"),
            username: optional("IMEPAY_USERNAME"),
            password: required("IMEPAY_PASSWORD")?,
            reference_value: optional("IMEPAY_REFERENCE_VALUE"),
            amount: optional("IMEPAY_AMOUNT"),
            transaction_recording_url: optional("IMEPAY_TRANSACTION_RECORDING_URL"),
            base_url: lookup("IMEPAY_BASE_URL").filter(|url| !url.trim().is_empty()),
            timeout,
        })
    }

    /// Base URL requests are sent to, without a trailing slash.
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
    }
}

/// Assembles an immutable [`ImePayClient`].
#[derive(Debug)]
pub struct ImePayClientBuilder {
    config: GatewayConfig,
    logger: SharedLogger,
}

impl Default for ImePayClientBuilder {
    fn default() -> Self {
        Self {
            config: GatewayConfig::default(),
            logger: logging::noop(),
        }
    }
}

impl ImePayClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    pub fn merchant_code(mut self, merchant_code: impl Into<String>) -> Self {
        self.config.merchant_code = merchant_code.into();
        self
    }

    pub fn merchant_name(mut self, merchant_name: impl Into<String>) -> Self {
        self.config.merchant_name = merchant_name.into();
        self
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.config.module = module.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn reference_value(mut self, reference_value: impl Into<String>) -> Self {
        self.config.reference_value = reference_value.into();
        self
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.config.amount = amount.into();
        self
    }

    pub fn transaction_recording_url(mut self, url: impl Into<String>) -> Self {
        self.config.transaction_recording_url = url.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> ImePayResult<ImePayClient> {
        if self.config.timeout.is_zero() {
            return Err(ImePayError::configuration("Request timeout must be non-zero"));
        }

        let http_client = Client::builder()
            .timeout(self.config.timeout)
            .user_agent(concat!("imepay-sdk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ImePayError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(ImePayClient {
            config: Arc::new(self.config),
            http_client,
            logger: self.logger,
        })
    }
}

/// IME Pay gateway client
///
/// Cloning is cheap and clones share the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct ImePayClient {
    config: Arc<GatewayConfig>,
    http_client: Client,
    logger: SharedLogger,
}

impl ImePayClient {
    pub fn builder() -> ImePayClientBuilder {
        ImePayClientBuilder::new()
    }

    pub fn from_config(config: GatewayConfig) -> ImePayResult<Self> {
        Self::builder().config(config).build()
    }

    /// Create client from environment variables
    pub fn from_env() -> ImePayResult<Self> {
        Self::from_config(GatewayConfig::from_env()?)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    /// New client for a different payment amount.
    pub fn with_amount(&self, amount: impl Into<String>) -> Self {
        let mut config = (*self.config).clone();
        config.amount = amount.into();
        self.with_config(config)
    }

    /// New client for a different reference value.
    pub fn with_reference_value(&self, reference_value: impl Into<String>) -> Self {
        let mut config = (*self.config).clone();
        config.reference_value = reference_value.into();
        self.with_config(config)
    }

    fn with_config(&self, config: GatewayConfig) -> Self {
        Self {
            config: Arc::new(config),
            http_client: self.http_client.clone(),
            logger: self.logger.clone(),
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.resolved_base_url(), endpoint)
    }

    /// POST `body` to `endpoint` and decode the reply
    async fn make_request<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ImePayResult<GatewayResponse> {
        let url = self.endpoint_url(endpoint);
        let payload = serde_json::to_value(body)?;
        self.logger.request(&url, &payload);

        let result = self.send(&url, &payload).await;
        if let Err(e) = &result {
            self.logger.request_failed(&url, e);
        }
        result
    }

    async fn send(&self, url: &str, payload: &Value) -> ImePayResult<GatewayResponse> {
        let response = self
            .http_client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let response_text = response
            .text()
            .await
            .map_err(|e| ImePayError::from(e).with_http_status(status))?;

        let body: Value = serde_json::from_str(&response_text).map_err(|e| {
            ImePayError::invalid_response(format!("body is not JSON: {}", e))
                .with_http_status(status)
                .with_raw_response(response_text.as_str())
        })?;

        self.logger.response(url, status, &body);

        match body {
            Value::Object(fields) if !fields.is_empty() => {
                Ok(GatewayResponse::from_fields(status, fields))
            }
            _ => Err(ImePayError::invalid_response("expected a non-empty JSON object")
                .with_http_status(status)
                .with_raw_response(response_text)),
        }
    }
}

#[async_trait]
impl PaymentGateway for ImePayClient {
    async fn get_token(&self) -> ImePayResult<Option<String>> {
        let request = TokenRequest {
            merchant_code: &self.config.merchant_code,
            merchant_name: &self.config.merchant_name,
            module: &self.config.module,
            username: &self.config.username,
            password: &self.config.password,
        };

        let response = self.make_request("/GetToken", &request).await?;
        Ok(response.token_id().map(str::to_string))
    }

    async fn initiate_payment(
        &self,
        token: &str,
        transaction_id: &str,
        product_name: &str,
        product_url: Option<&str>,
    ) -> ImePayResult<GatewayResponse> {
        let request = InitiateRequest {
            token_id: token,
            merchant_code: &self.config.merchant_code,
            ref_id: transaction_id,
            amount: &self.config.amount,
            reference_value: &self.config.reference_value,
            product_name,
            product_url: product_url.unwrap_or_default(),
            transaction_recording_url: &self.config.transaction_recording_url,
        };

        self.make_request("/Initiate", &request).await
    }

    async fn verify_payment(
        &self,
        token: &str,
        transaction_id: &str,
        ref_id: &str,
    ) -> ImePayResult<GatewayResponse> {
        let request = TransactionRequest {
            token_id: token,
            merchant_code: &self.config.merchant_code,
            ref_id: transaction_id,
            transaction_id: Some(ref_id),
            reason: None,
        };

        self.make_request("/Verify", &request).await
    }

    async fn check_transaction_status(
        &self,
        token: &str,
        transaction_id: &str,
    ) -> ImePayResult<GatewayResponse> {
        let request = TransactionRequest {
            token_id: token,
            merchant_code: &self.config.merchant_code,
            ref_id: transaction_id,
            transaction_id: None,
            reason: None,
        };

        self.make_request("/CheckTransaction", &request).await
    }

    async fn cancel_transaction(
        &self,
        token: &str,
        transaction_id: &str,
        ref_id: &str,
        reason: Option<&str>,
    ) -> ImePayResult<GatewayResponse> {
        let request = TransactionRequest {
            token_id: token,
            merchant_code: &self.config.merchant_code,
            ref_id: transaction_id,
            transaction_id: Some(ref_id),
            reason: Some(reason.unwrap_or(DEFAULT_CANCEL_REASON)),
        };

        self.make_request("/Cancel", &request).await
    }
}
