//! Integration tests for IME Pay callback validation

use imepay::callback::signature;
use imepay::{
    CallbackPayload, CallbackValidator, MerchantCredential, RejectReason, TracingLogger,
    ValidationOutcome,
};
use std::sync::Arc;
use std::thread;

const SECRET: &str = "s3cr3t";

fn validator() -> CallbackValidator {
    CallbackValidator::new(MerchantCredential::new("M", SECRET))
}

fn unsigned_payload() -> CallbackPayload {
    CallbackPayload::new()
        .with("MerchantCode", "M")
        .with("TransactionId", "T1")
        .with("RefId", "R1")
        .with("Amount", "100.00")
}

fn signed_payload() -> CallbackPayload {
    let payload = unsigned_payload();
    let signature = signature::sign(&payload, SECRET);
    payload.with("Signature", signature)
}

#[test]
fn test_missing_any_required_field() {
    for field in ["MerchantCode", "TransactionId", "RefId"] {
        let mut payload = signed_payload();
        payload.remove(field);
        assert_eq!(
            validator().validate(&payload),
            ValidationOutcome::Invalid(RejectReason::MissingFields),
            "missing {}",
            field
        );
    }
}

#[test]
fn test_merchant_mismatch_regardless_of_signature() {
    let mut payload = unsigned_payload().with("MerchantCode", "OTHER");
    let signature = signature::sign(&payload, SECRET);
    payload.insert("Signature", signature);

    assert_eq!(
        validator().validate(&payload).reason(),
        Some(RejectReason::MerchantMismatch)
    );
}

#[test]
fn test_known_signature_vector() {
    assert_eq!(
        signature::canonical_string(&unsigned_payload(), SECRET),
        "Amount=100.00&MerchantCode=M&RefId=R1&TransactionId=T1s3cr3t"
    );
    assert_eq!(
        validator().expected_signature(&unsigned_payload()),
        "bbf624885e5f594d72f257c1f70512603d6bf0cb95d4aaa65817aa3cc4de9304"
    );
}

#[test]
fn test_signed_round_trip() {
    let payload = unsigned_payload().with(
        "Signature",
        "bbf624885e5f594d72f257c1f70512603d6bf0cb95d4aaa65817aa3cc4de9304",
    );

    let outcome = validator().validate(&payload);
    assert!(outcome.is_success());

    let fields = outcome.fields().unwrap();
    assert_eq!(fields.transaction_id, "T1");
    assert_eq!(fields.ref_id, "R1");
    assert_eq!(fields.amount.as_deref(), Some("100.00"));
    assert_eq!(fields.status, None);
    assert_eq!(fields.message, None);
}

#[test]
fn test_signature_is_deterministic() {
    let validator = validator();
    let payload = unsigned_payload();
    let first = validator.expected_signature(&payload);
    for _ in 0..10 {
        assert_eq!(validator.expected_signature(&payload), first);
    }
}

#[test]
fn test_tampering_any_character_breaks_signature() {
    let mut original = unsigned_payload()
        .with("Status", "SUCCESS")
        .with("Message", "Payment successful");
    let signature = signature::sign(&original, SECRET);
    original.insert("Signature", signature);
    assert!(validator().validate(&original).is_success());

    let keys: Vec<String> = original
        .iter()
        .map(|(k, _)| k.to_string())
        .filter(|k| k != "Signature" && k != "MerchantCode")
        .collect();

    for key in keys {
        let value = original.get(&key).unwrap().to_string();
        for (index, ch) in value.char_indices() {
            let flipped = if ch == 'x' { 'y' } else { 'x' };
            let mut tampered_value = value.clone();
            tampered_value.replace_range(index..index + ch.len_utf8(), &flipped.to_string());

            let mut tampered = original.clone();
            tampered.insert(key.as_str(), tampered_value);

            assert_eq!(
                validator().validate(&tampered).reason(),
                Some(RejectReason::SignatureMismatch),
                "tampered {} at {}",
                key,
                index
            );
        }
    }
}

#[test]
fn test_added_field_breaks_signature() {
    let payload = signed_payload().with("Status", "SUCCESS");
    assert_eq!(
        validator().validate(&payload).reason(),
        Some(RejectReason::SignatureMismatch)
    );
}

#[test]
fn test_wrong_secret_breaks_signature() {
    let payload = unsigned_payload();
    let forged = signature::sign(&payload, "guessed");
    let payload = payload.with("Signature", forged);
    assert_eq!(
        validator().validate(&payload).reason(),
        Some(RejectReason::SignatureMismatch)
    );
}

#[test]
fn test_unsigned_fallback_status_check() {
    let bogus = unsigned_payload().with("Status", "BOGUS");
    assert_eq!(
        validator().validate(&bogus).reason(),
        Some(RejectReason::InvalidStatus)
    );

    for status in ["SUCCESS", "FAILED", "PENDING", "CANCELLED"] {
        let payload = unsigned_payload().with("Status", status);
        let outcome = validator().validate(&payload);
        assert!(outcome.is_success(), "status {}", status);
        assert_eq!(outcome.fields().unwrap().status.as_deref(), Some(status));
    }

    assert!(validator().validate(&unsigned_payload()).is_success());
}

#[test]
fn test_validate_is_idempotent() {
    let validator = validator();
    for payload in [
        signed_payload(),
        unsigned_payload(),
        unsigned_payload().with("Status", "BOGUS"),
        unsigned_payload().with("MerchantCode", "X"),
    ] {
        assert_eq!(validator.validate(&payload), validator.validate(&payload));
    }
}

#[test]
fn test_json_payload_with_extra_gateway_fields() {
    let mut payload = CallbackPayload::from_json(
        br#"{
            "MerchantCode": "M",
            "TransactionId": "IME123456789",
            "RefId": "TXN1234567890",
            "Amount": "2000.00",
            "Status": "SUCCESS",
            "Message": "Payment successful",
            "Msisdn": "98XXXXXXXX"
        }"#,
    )
    .unwrap();
    let signature = signature::sign(&payload, SECRET);
    payload.insert("Signature", signature);

    let fields = validator().validate(&payload).into_result().unwrap();
    assert_eq!(fields.transaction_id, "IME123456789");
    assert_eq!(fields.ref_id, "TXN1234567890");
    assert_eq!(fields.message.as_deref(), Some("Payment successful"));
}

#[test]
fn test_concurrent_validation_with_tracing_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("imepay=debug")
        .with_test_writer()
        .try_init();

    let validator = Arc::new(validator().with_logger(Arc::new(TracingLogger)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let validator = Arc::clone(&validator);
            thread::spawn(move || {
                let payload = if i % 2 == 0 {
                    signed_payload()
                } else {
                    signed_payload().with("Amount", "999.00")
                };
                validator.validate(&payload).is_success()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), i % 2 == 0);
    }
}
