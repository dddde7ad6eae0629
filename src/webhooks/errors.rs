//! Webhook-specific error types.

use thiserror::Error;

/// Error type for webhook verification and processing.
///
/// Only one failure class here rejects a delivery outright: a bad
/// signature. Everything downstream of the signature gate is reported
/// through [`crate::webhooks::WebhookOutcome`] so the platform does not
/// redeliver an event the service has already seen.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    ///
    /// The error message is intentionally generic to avoid leaking
    /// security details.
    #[error("Webhook signature verification failed")]
    InvalidHmac,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_hmac_error_message() {
        let error = WebhookError::InvalidHmac;
        let message = error.to_string();
        assert_eq!(message, "Webhook signature verification failed");
        // Ensure the message is generic and doesn't leak security details
        assert!(!message.contains("key"));
        assert!(!message.contains("secret"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error: &dyn std::error::Error = &WebhookError::InvalidHmac;
        let _ = error;
    }
}
