//! HMAC primitives for webhook signature verification.
//!
//! The platform signs every webhook delivery with HMAC-SHA256 over the raw
//! request body, base64-encoded. Verification must run over the exact bytes
//! that arrived on the wire; computing a signature over re-serialized JSON
//! is a correctness bug, which is why [`compute_signature_base64`] takes
//! `&[u8]` and not a parsed value.
//!
//! # Security
//!
//! All signature comparisons use constant-time comparison to prevent timing
//! attacks.
//!
//! # Example
//!
//! ```rust
//! use shopsync::auth::hmac::{compute_signature_base64, constant_time_compare};
//!
//! let body = b"webhook payload";
//! let sig = compute_signature_base64(body, "secret-key");
//! assert_eq!(sig.len(), 44); // Base64 of 32 bytes
//! assert!(constant_time_compare(&sig, &compute_signature_base64(body, "secret-key")));
//! ```

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Computes an HMAC-SHA256 signature over raw bytes, base64-encoded.
///
/// This is the signature format the platform places in the
/// `X-Shopify-Hmac-SHA256` header.
///
/// # Arguments
///
/// * `message` - The raw message bytes to sign (webhook request body)
/// * `secret` - The app's API secret key
///
/// # Returns
///
/// A base64-encoded HMAC-SHA256 signature (RFC 4648 standard base64).
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    let result = mac.finalize();
    BASE64_STANDARD.encode(result.into_bytes())
}

/// Performs constant-time comparison of two strings.
///
/// Used for signature comparison to prevent timing attacks. A length
/// mismatch returns `false`, never an error.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // ConstantTimeEq handles different lengths securely
    a_bytes.ct_eq(b_bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_signature_base64_produces_correct_length() {
        // SHA256 produces 32 bytes, base64 of 32 bytes = ceil(32/3)*4 = 44 characters
        let sig = compute_signature_base64(b"test", "secret");
        assert_eq!(sig.len(), 44);
    }

    #[test]
    fn test_compute_signature_base64_matches_known_value() {
        // Known HMAC-SHA256 test vector, base64-encoded
        // HMAC-SHA256("message", "key") in hex: 6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a
        let sig = compute_signature_base64(b"message", "key");
        assert_eq!(sig, "bp7ym3X//Ft6uuUn1Y/a2y/kLnIZARl2kXNDBl9Y7Uo=");
    }

    #[test]
    fn test_compute_signature_base64_platform_reference_vector() {
        // Fixed known-answer vector: secret "shhh" over the exact body bytes
        let sig = compute_signature_base64(br#"{"topic":"test"}"#, "shhh");
        assert_eq!(sig, "hU7JVgo4zhKfLTIPeT8jvWUfqbHChfWpLqpmt2qW1HY=");
    }

    #[test]
    fn test_compute_signature_base64_with_empty_message() {
        let sig = compute_signature_base64(b"", "secret");
        assert_eq!(sig.len(), 44);
    }

    #[test]
    fn test_compute_signature_base64_with_non_utf8_bytes() {
        let non_utf8_bytes: &[u8] = &[0x80, 0x81, 0x82, 0xff, 0xfe];
        let sig = compute_signature_base64(non_utf8_bytes, "secret");
        assert_eq!(sig.len(), 44);
        assert!(sig
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
    }

    #[test]
    fn test_constant_time_compare_equal_strings() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_constant_time_compare_different_strings() {
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("ABC", "abc"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "longer string"));
        assert!(!constant_time_compare("a", ""));
    }
}
