//! Payment callback signature verification.
//!
//! The gateway signs `order_id|payment_id` with the shared key secret.
//! The callback arrives through the customer's browser, so the signature
//! is the only thing standing between a forged confirmation and a real
//! one.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected hex signature for an order/payment pair.
pub fn payment_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex_encode(&mac.finalize().into_bytes())
}

/// Verify a supplied signature in constant time.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, supplied: &str) -> bool {
    let expected = payment_signature(secret, order_id, payment_id);
    constant_time_eq(expected.as_bytes(), supplied.as_bytes())
}

/// Encode bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_gateway_secret";

    #[test]
    fn test_signature_is_deterministic() {
        let a = payment_signature(SECRET, "ord_1", "pay_1");
        let b = payment_signature(SECRET, "ord_1", "pay_1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_valid_signature_accepted() {
        let sig = payment_signature(SECRET, "ord_1", "pay_1");
        assert!(verify_signature(SECRET, "ord_1", "pay_1", &sig));
    }

    #[test]
    fn test_tampered_ids_rejected() {
        let sig = payment_signature(SECRET, "ord_1", "pay_1");
        assert!(!verify_signature(SECRET, "ord_2", "pay_1", &sig));
        assert!(!verify_signature(SECRET, "ord_1", "pay_2", &sig));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sig = payment_signature("other_secret", "ord_1", "pay_1");
        assert!(!verify_signature(SECRET, "ord_1", "pay_1", &sig));
    }

    #[test]
    fn test_garbage_signature_rejected() {
        assert!(!verify_signature(SECRET, "ord_1", "pay_1", "deadbeef"));
        assert!(!verify_signature(SECRET, "ord_1", "pay_1", ""));
    }

    #[test]
    fn test_separator_is_part_of_the_message() {
        // "ab|c" and "a|bc" must not collide.
        let a = payment_signature(SECRET, "ab", "c");
        let b = payment_signature(SECRET, "a", "bc");
        assert_ne!(a, b);
    }
}
