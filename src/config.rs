//! Environment-driven settings for an application using both halves of the SDK

use crate::callback::{CallbackValidator, MerchantCredential, UnsignedPolicy};
use crate::logging::SharedLogger;
use crate::payments::{GatewayConfig, ImePayClient};
use anyhow::{anyhow, Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub gateway: GatewayConfig,
    pub callback: CallbackSettings,
}

#[derive(Clone)]
pub struct CallbackSettings {
    pub merchant_secret: String,
    pub allow_unsigned: bool,
}

impl std::fmt::Debug for CallbackSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSettings")
            .field("merchant_secret", &"***")
            .field("allow_unsigned", &self.allow_unsigned)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gateway =
            GatewayConfig::from_lookup(&lookup).context("invalid IME Pay gateway configuration")?;

        let merchant_secret =
            lookup("IMEPAY_MERCHANT_SECRET").context("IMEPAY_MERCHANT_SECRET not set")?;

        let allow_unsigned = match lookup("IMEPAY_ALLOW_UNSIGNED_CALLBACKS") {
            Some(value) => parse_flag(&value)
                .context("IMEPAY_ALLOW_UNSIGNED_CALLBACKS must be true or false")?,
            None => true,
        };

        let settings = Settings {
            gateway,
            callback: CallbackSettings {
                merchant_secret,
                allow_unsigned,
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gateway.merchant_code.trim().is_empty() {
            return Err(anyhow!("IMEPAY_MERCHANT_CODE cannot be empty"));
        }

        if self.callback.merchant_secret.trim().is_empty() {
            return Err(anyhow!("IMEPAY_MERCHANT_SECRET cannot be empty"));
        }

        if self.gateway.timeout.is_zero() {
            return Err(anyhow!("IMEPAY_TIMEOUT_SECS must be greater than 0"));
        }

        Ok(())
    }

    pub fn unsigned_policy(&self) -> UnsignedPolicy {
        if self.callback.allow_unsigned {
            UnsignedPolicy::Accept
        } else {
            UnsignedPolicy::Reject
        }
    }

    pub fn credential(&self) -> MerchantCredential {
        MerchantCredential::new(
            self.gateway.merchant_code.clone(),
            self.callback.merchant_secret.clone(),
        )
    }

    pub fn callback_validator(&self, logger: SharedLogger) -> CallbackValidator {
        CallbackValidator::new(self.credential())
            .with_unsigned_policy(self.unsigned_policy())
            .with_logger(logger)
    }

    pub fn gateway_client(&self, logger: SharedLogger) -> Result<ImePayClient> {
        ImePayClient::builder()
            .config(self.gateway.clone())
            .logger(logger)
            .build()
            .context("failed to build IME Pay client")
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("unrecognised flag value {}", other)),
    }
}
