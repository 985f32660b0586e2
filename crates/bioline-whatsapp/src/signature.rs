// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `X-Hub-Signature-256` verification.
//!
//! The digest is an HMAC-SHA256 of the raw request body keyed with the app
//! secret. It must be computed over the exact bytes received; re-serialized
//! JSON hashes differently.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

use bioline_core::BiolineError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const PREFIX: &str = "sha256=";

/// Check `header` (`sha256=<hex>`) against the HMAC of `body`.
///
/// Comparison is constant-time. A header with the wrong prefix or invalid
/// hex never verifies.
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> bool {
    let Some(hex_sig) = header.trim().strip_prefix(PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Apply the delivery policy for a webhook body.
///
/// With no secret configured verification is skipped. With a secret, a
/// missing, malformed, or mismatched header is [`BiolineError::SignatureInvalid`].
pub fn check_delivery(
    secret: Option<&str>,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), BiolineError> {
    let Some(secret) = secret else {
        debug!("no app secret configured, skipping signature check");
        return Ok(());
    };
    match header {
        Some(value) if verify_signature(secret, body, value) => Ok(()),
        Some(_) => {
            warn!("webhook signature mismatch");
            Err(BiolineError::SignatureInvalid)
        }
        None => {
            warn!("webhook signature header missing");
            Err(BiolineError::SignatureInvalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sign(body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("{PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn known_vector_verifies() {
        let body = br#"{"entry":[]}"#;
        let header = sign(body, "app-secret");
        assert!(header.starts_with("sha256="));
        assert_eq!(header.len(), "sha256=".len() + 64);
        assert!(verify_signature("app-secret", body, &header));
    }

    #[test]
    fn rejects_wrong_prefix_and_bad_hex() {
        let body = b"payload";
        let good = sign(body, "s");
        let hex_only = good.trim_start_matches("sha256=");
        assert!(!verify_signature("s", body, hex_only));
        assert!(!verify_signature("s", body, &format!("sha1={hex_only}")));
        assert!(!verify_signature("s", body, "sha256=zz-not-hex"));
        assert!(!verify_signature("s", body, ""));
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = b"payload";
        assert!(!verify_signature("other", body, &sign(body, "s")));
    }

    #[test]
    fn reserialized_body_does_not_verify() {
        let raw = br#"{ "b": 1, "a": 2 }"#;
        let header = sign(raw, "s");
        let value: serde_json::Value = serde_json::from_slice(raw).unwrap();
        let reserialized = serde_json::to_vec(&value).unwrap();
        assert!(!verify_signature("s", &reserialized, &header));
    }

    #[test]
    fn policy_skips_without_secret() {
        assert!(check_delivery(None, b"x", None).is_ok());
        assert!(check_delivery(None, b"x", Some("sha256=00")).is_ok());
    }

    #[test]
    fn policy_rejects_missing_or_bad_header_with_secret() {
        assert!(matches!(
            check_delivery(Some("s"), b"x", None),
            Err(BiolineError::SignatureInvalid)
        ));
        assert!(matches!(
            check_delivery(Some("s"), b"x", Some("sha256=00")),
            Err(BiolineError::SignatureInvalid)
        ));
        let header = sign(b"x", "s");
        assert!(check_delivery(Some("s"), b"x", Some(&header)).is_ok());
    }

    proptest! {
        #[test]
        fn signed_body_always_verifies(body in proptest::collection::vec(any::<u8>(), 0..512), secret in ".{0,64}") {
            let header = sign(&body, &secret);
            prop_assert!(verify_signature(&secret, &body, &header));
        }

        #[test]
        fn different_body_never_verifies(
            a in proptest::collection::vec(any::<u8>(), 0..256),
            b in proptest::collection::vec(any::<u8>(), 0..256),
            secret in "[a-z0-9]{1,32}",
        ) {
            prop_assume!(a != b);
            let header = sign(&b, &secret);
            prop_assert!(!verify_signature(&secret, &a, &header));
        }
    }
}
