//! Inbound webhook authentication for the three providers.
//!
//! All comparisons go through `Mac::verify_slice`, which is constant time.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Maximum age of a signed timestamp, either direction
pub const TIMESTAMP_TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("signature mismatch")]
    Mismatch,
    #[error("invalid signing secret")]
    InvalidSecret,
}

fn check_timestamp(timestamp: i64, now: i64) -> Result<(), SignatureError> {
    if now.abs_diff(timestamp) > TIMESTAMP_TOLERANCE_SECONDS.unsigned_abs() {
        Err(SignatureError::Expired)
    } else {
        Ok(())
    }
}

/// Payment gateway: `x-paystack-signature` is hex(HMAC-SHA512(secret, body)).
pub fn verify_paystack(secret: &str, body: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
    let expected = hex::decode(signature_hex.trim()).map_err(|_| SignatureError::Malformed)?;

    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Identity provider (Svix): HMAC-SHA256 over `{id}.{timestamp}.{body}` with
/// the base64 key after the `whsec_` prefix. The header may carry several
/// space separated `v1,<base64>` signatures; any match is accepted.
pub fn verify_svix(
    secret: &str,
    message_id: &str,
    timestamp: &str,
    body: &[u8],
    signatures: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let ts: i64 = timestamp.trim().parse().map_err(|_| SignatureError::Malformed)?;
    check_timestamp(ts, now)?;

    let key = BASE64
        .decode(secret.strip_prefix("whsec_").unwrap_or(secret))
        .map_err(|_| SignatureError::InvalidSecret)?;

    let mut mac = HmacSha256::new_from_slice(&key).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(message_id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.trim().as_bytes());
    mac.update(b".");
    mac.update(body);

    let candidates: Vec<Vec<u8>> = signatures
        .split_whitespace()
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == "v1")
        .filter_map(|(_, sig)| BASE64.decode(sig).ok())
        .collect();

    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }

    if candidates
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok())
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Video platform (Mux): header `t=<unix>,v1=<hex>`, HMAC-SHA256 over
/// `{t}.{body}`.
pub fn verify_mux(secret: &str, header: &str, body: &[u8], now: i64) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    let ts: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }
    check_timestamp(ts, now)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);

    let matched = signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|sig| mac.clone().verify_slice(&sig).is_ok());

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_paystack(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    fn sign_svix(key: &[u8], id: &str, ts: i64, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(key).unwrap();
        mac.update(format!("{id}.{ts}.").as_bytes());
        mac.update(body);
        format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
    }

    fn sign_mux(secret: &str, ts: i64, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{ts}.").as_bytes());
        mac.update(body);
        format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    const BODY: &[u8] = br#"{"event":"charge.success"}"#;

    #[test]
    fn test_paystack_signature() {
        let sig = sign_paystack("sk_test_secret", BODY);
        assert_eq!(verify_paystack("sk_test_secret", BODY, &sig), Ok(()));
        assert_eq!(
            verify_paystack("sk_other", BODY, &sig),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify_paystack("sk_test_secret", b"{}", &sig),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify_paystack("sk_test_secret", BODY, "not-hex"),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_svix_signature() {
        let key = b"identity-signing-key";
        let secret = format!("whsec_{}", BASE64.encode(key));
        let now = 1_700_000_000;
        let header = sign_svix(key, "msg_1", now, BODY);

        assert_eq!(
            verify_svix(&secret, "msg_1", &now.to_string(), BODY, &header, now),
            Ok(())
        );
        // Rotated secrets send several signatures
        let rotated = format!("v1,AAAA {header}");
        assert_eq!(
            verify_svix(&secret, "msg_1", &now.to_string(), BODY, &rotated, now),
            Ok(())
        );
        assert_eq!(
            verify_svix(&secret, "msg_2", &now.to_string(), BODY, &header, now),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_svix_timestamp_tolerance() {
        let key = b"identity-signing-key";
        let secret = format!("whsec_{}", BASE64.encode(key));
        let signed_at = 1_700_000_000;
        let header = sign_svix(key, "msg_1", signed_at, BODY);

        let late = signed_at + TIMESTAMP_TOLERANCE_SECONDS + 1;
        assert_eq!(
            verify_svix(&secret, "msg_1", &signed_at.to_string(), BODY, &header, late),
            Err(SignatureError::Expired)
        );
        let edge = signed_at + TIMESTAMP_TOLERANCE_SECONDS;
        assert_eq!(
            verify_svix(&secret, "msg_1", &signed_at.to_string(), BODY, &header, edge),
            Ok(())
        );
    }

    #[test]
    fn test_extreme_timestamps_expire() {
        let key = b"identity-signing-key";
        let secret = format!("whsec_{}", BASE64.encode(key));
        let now = 1_700_000_000;

        for timestamp in [i64::MIN, i64::MAX] {
            assert_eq!(
                verify_svix(&secret, "msg_1", &timestamp.to_string(), BODY, "v1,AAAA", now),
                Err(SignatureError::Expired)
            );
            assert_eq!(
                verify_mux("mux_secret", &format!("t={timestamp},v1=00"), BODY, now),
                Err(SignatureError::Expired)
            );
        }
        assert_eq!(
            verify_svix(&secret, "msg_1", "-9223372036854775808", BODY, "v1,AAAA", i64::MAX),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_mux_signature() {
        let now = 1_700_000_000;
        let header = sign_mux("mux_secret", now, BODY);

        assert_eq!(verify_mux("mux_secret", &header, BODY, now), Ok(()));
        assert_eq!(
            verify_mux("other", &header, BODY, now),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify_mux("mux_secret", &header, BODY, now + 3600),
            Err(SignatureError::Expired)
        );
        assert_eq!(
            verify_mux("mux_secret", "v1=abcd", BODY, now),
            Err(SignatureError::Malformed)
        );
    }
}
