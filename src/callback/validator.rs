use super::{
    fields, signature, CallbackFields, CallbackPayload, MerchantCredential, RejectReason,
    UnsignedPolicy, ValidationOutcome,
};
use crate::logging::{self, SharedLogger};
use crate::payments::types::TransactionStatus;

/// Authenticates callback payloads for one merchant.
///
/// Validation only reads the credential and the payload it is given, so one
/// validator can be shared across threads and reused for every request.
#[derive(Debug, Clone)]
pub struct CallbackValidator {
    credential: MerchantCredential,
    unsigned_policy: UnsignedPolicy,
    logger: SharedLogger,
}

impl CallbackValidator {
    pub fn new(credential: MerchantCredential) -> Self {
        Self {
            credential,
            unsigned_policy: UnsignedPolicy::default(),
            logger: logging::noop(),
        }
    }

    pub fn with_unsigned_policy(mut self, policy: UnsignedPolicy) -> Self {
        self.unsigned_policy = policy;
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn credential(&self) -> &MerchantCredential {
        &self.credential
    }

    pub fn unsigned_policy(&self) -> UnsignedPolicy {
        self.unsigned_policy
    }

    /// Signature the gateway should have attached to `payload`.
    pub fn expected_signature(&self, payload: &CallbackPayload) -> String {
        signature::sign(payload, self.credential.merchant_secret())
    }

    pub fn validate(&self, payload: &CallbackPayload) -> ValidationOutcome {
        self.logger.callback_received(payload);

        match self.check(payload) {
            Ok(fields) => ValidationOutcome::Valid(fields),
            Err(reason) => {
                self.logger.validation_failed(reason, payload);
                ValidationOutcome::Invalid(reason)
            }
        }
    }

    fn check(&self, payload: &CallbackPayload) -> Result<CallbackFields, RejectReason> {
        if !fields::REQUIRED.iter().all(|key| payload.contains(key)) {
            return Err(RejectReason::MissingFields);
        }

        if payload.get(fields::MERCHANT_CODE) != Some(self.credential.merchant_code()) {
            return Err(RejectReason::MerchantMismatch);
        }

        match payload.get(fields::SIGNATURE) {
            Some(provided) => {
                if !signature::verify(payload, provided, self.credential.merchant_secret()) {
                    return Err(RejectReason::SignatureMismatch);
                }
            }
            None => {
                if let Some(status) = payload.get(fields::STATUS) {
                    if status.parse::<TransactionStatus>().is_err() {
                        return Err(RejectReason::InvalidStatus);
                    }
                }
                if self.unsigned_policy == UnsignedPolicy::Reject {
                    return Err(RejectReason::MissingSignature);
                }
                self.logger.unsigned_accepted(payload);
            }
        }

        Ok(normalize(payload))
    }
}

fn normalize(payload: &CallbackPayload) -> CallbackFields {
    let owned = |key: &str| payload.get(key).map(str::to_string);

    CallbackFields {
        transaction_id: owned(fields::TRANSACTION_ID).unwrap_or_default(),
        ref_id: owned(fields::REF_ID).unwrap_or_default(),
        amount: owned(fields::AMOUNT),
        status: owned(fields::STATUS),
        message: owned(fields::MESSAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::testing::RecordingLogger;
    use std::sync::Arc;

    fn validator() -> CallbackValidator {
        CallbackValidator::new(MerchantCredential::new("M", "s3cr3t"))
    }

    fn base_payload() -> CallbackPayload {
        CallbackPayload::new()
            .with("MerchantCode", "M")
            .with("TransactionId", "T1")
            .with("RefId", "R1")
    }

    #[test]
    fn test_required_fields_checked_before_merchant() {
        let payload = CallbackPayload::new()
            .with("MerchantCode", "OTHER")
            .with("TransactionId", "T1");
        assert_eq!(
            validator().validate(&payload).reason(),
            Some(RejectReason::MissingFields)
        );
    }

    #[test]
    fn test_empty_required_field_counts_as_present() {
        let payload = base_payload().with("RefId", "");
        let outcome = validator().validate(&payload);
        assert!(outcome.is_success());
        assert_eq!(outcome.fields().unwrap().ref_id, "");
    }

    #[test]
    fn test_merchant_code_is_case_sensitive() {
        let payload = base_payload().with("MerchantCode", "m");
        assert_eq!(
            validator().validate(&payload).reason(),
            Some(RejectReason::MerchantMismatch)
        );
    }

    #[test]
    fn test_signed_payload_skips_status_check() {
        let mut payload = base_payload().with("Status", "BOGUS");
        let signature = validator().expected_signature(&payload);
        payload.insert("Signature", signature);
        assert!(validator().validate(&payload).is_success());
    }

    #[test]
    fn test_empty_signature_is_checked_not_ignored() {
        let payload = base_payload().with("Signature", "");
        assert_eq!(
            validator().validate(&payload).reason(),
            Some(RejectReason::SignatureMismatch)
        );
    }

    #[test]
    fn test_status_is_case_sensitive() {
        let payload = base_payload().with("Status", "success");
        assert_eq!(
            validator().validate(&payload).reason(),
            Some(RejectReason::InvalidStatus)
        );
    }

    #[test]
    fn test_reject_policy_refuses_unsigned() {
        let validator = validator().with_unsigned_policy(UnsignedPolicy::Reject);
        let payload = base_payload().with("Status", "SUCCESS");
        assert_eq!(
            validator.validate(&payload).reason(),
            Some(RejectReason::MissingSignature)
        );
    }

    #[test]
    fn test_reject_policy_still_reports_invalid_status_first() {
        let validator = validator().with_unsigned_policy(UnsignedPolicy::Reject);
        let payload = base_payload().with("Status", "BOGUS");
        assert_eq!(
            validator.validate(&payload).reason(),
            Some(RejectReason::InvalidStatus)
        );
    }

    #[test]
    fn test_missing_optional_fields_are_none() {
        let outcome = validator().validate(&base_payload());
        let fields = outcome.fields().unwrap();
        assert_eq!(fields.transaction_id, "T1");
        assert_eq!(fields.ref_id, "R1");
        assert_eq!(fields.amount, None);
        assert_eq!(fields.status, None);
        assert_eq!(fields.message, None);
    }

    #[test]
    fn test_logger_sees_failures_and_unsigned_acceptance() {
        let logger = Arc::new(RecordingLogger::default());
        let validator = validator().with_logger(logger.clone());

        validator.validate(&base_payload());
        validator.validate(&base_payload().with("MerchantCode", "X"));

        assert_eq!(
            logger.events(),
            vec![
                "callback_received",
                "unsigned_accepted",
                "callback_received",
                "validation_failed:MERCHANT_MISMATCH",
            ]
        );
    }
}
