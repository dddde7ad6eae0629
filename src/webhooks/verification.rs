//! Webhook signature verification.
//!
//! The platform signs every webhook delivery with HMAC-SHA256 over the raw
//! request body, using the app's API secret key, and sends the signature
//! base64-encoded in a header. This module verifies those signatures:
//!
//! - [`verify_webhook`]: high-level entry that uses [`SyncConfig`] and
//!   supports key rotation
//! - [`verify_hmac`]: low-level single-key check for custom integrations
//!
//! Verification always operates on the exact raw bytes as received. There
//! is deliberately no API that verifies a parsed JSON value: re-serialized
//! JSON need not be byte-identical to the wire form, and a signature over
//! anything but the wire bytes is meaningless.
//!
//! # Example
//!
//! ```rust
//! use shopsync::webhooks::{WebhookRequest, verify_webhook, verify_hmac};
//! use shopsync::SyncConfig;
//! use shopsync::auth::hmac::compute_signature_base64;
//! use shopsync::config::ApiSecretKey;
//!
//! let config = SyncConfig::builder()
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = br#"{"id":1}"#;
//! let hmac = compute_signature_base64(body, "my-secret");
//!
//! let request = WebhookRequest::new(
//!     body.to_vec(),
//!     hmac,
//!     Some("products/update".to_string()),
//!     Some("example.myshopify.com".to_string()),
//!     None,
//!     None,
//! );
//!
//! let context = verify_webhook(&config, &request).expect("verification failed");
//! assert_eq!(context.shop_domain(), Some("example.myshopify.com"));
//! ```
//!
//! # Security
//!
//! All HMAC comparisons use constant-time comparison to prevent timing
//! attacks. The high-level function supports key rotation by trying the
//! primary secret key first, then falling back to the old secret key.

use crate::auth::hmac::{compute_signature_base64, constant_time_compare};
use crate::config::SyncConfig;
use crate::webhooks::topic::WebhookTopic;
use crate::webhooks::WebhookError;

// ============================================================================
// Header Constants
// ============================================================================

/// HTTP header name for the HMAC-SHA256 signature.
///
/// The value is a base64-encoded HMAC-SHA256 signature of the raw request
/// body.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// HTTP header name for the webhook topic (e.g., "products/update").
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// HTTP header name for the shop domain that triggered the webhook
/// (e.g., "example.myshopify.com").
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// HTTP header name for the API version used for the payload format.
pub const HEADER_API_VERSION: &str = "X-Shopify-API-Version";

/// HTTP header name for the unique webhook delivery id.
pub const HEADER_WEBHOOK_ID: &str = "X-Shopify-Webhook-Id";

// ============================================================================
// WebhookRequest
// ============================================================================

/// An incoming webhook delivery.
///
/// Holds the raw request body and the headers needed for verification and
/// dispatch. The body is stored as raw bytes to preserve the exact payload
/// for HMAC computation.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Raw request body as bytes.
    body: Vec<u8>,
    /// HMAC signature from the X-Shopify-Hmac-SHA256 header.
    hmac_header: String,
    /// Webhook topic from the X-Shopify-Topic header.
    topic: Option<String>,
    /// Shop domain from the X-Shopify-Shop-Domain header.
    shop_domain: Option<String>,
    /// API version from the X-Shopify-API-Version header.
    api_version: Option<String>,
    /// Webhook ID from the X-Shopify-Webhook-Id header.
    webhook_id: Option<String>,
}

impl WebhookRequest {
    /// Creates a webhook request from the body and header values.
    #[must_use]
    pub fn new(
        body: Vec<u8>,
        hmac_header: String,
        topic: Option<String>,
        shop_domain: Option<String>,
        api_version: Option<String>,
        webhook_id: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac_header,
            topic,
            shop_domain,
            api_version,
            webhook_id,
        }
    }

    /// Returns the raw request body as a byte slice.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the HMAC signature header value.
    #[must_use]
    pub fn hmac_header(&self) -> &str {
        &self.hmac_header
    }

    /// Returns the topic header value, if present.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Returns the shop domain header value, if present.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    /// Returns the API version header value, if present.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Returns the webhook ID header value, if present.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

// ============================================================================
// WebhookContext
// ============================================================================

/// Verified webhook metadata after successful signature verification.
///
/// Returned by [`verify_webhook`]. Carries the parsed topic (unknown
/// topics are kept with their raw string) and the remaining headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookContext {
    /// Parsed topic; `Unknown` for topics without a handler.
    topic: WebhookTopic,
    /// Shop domain from the header.
    shop_domain: Option<String>,
    /// API version from the header.
    api_version: Option<String>,
    /// Webhook ID from the header.
    webhook_id: Option<String>,
}

impl WebhookContext {
    fn new(
        topic: WebhookTopic,
        shop_domain: Option<String>,
        api_version: Option<String>,
        webhook_id: Option<String>,
    ) -> Self {
        Self {
            topic,
            shop_domain,
            api_version,
            webhook_id,
        }
    }

    /// Returns the parsed webhook topic.
    #[must_use]
    pub fn topic(&self) -> &WebhookTopic {
        &self.topic
    }

    /// Returns the shop domain, if present in the webhook headers.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    /// Returns the API version, if present in the webhook headers.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Returns the webhook ID, if present in the webhook headers.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

// ============================================================================
// Verification Functions
// ============================================================================

/// Verifies the HMAC signature of a webhook request body.
///
/// This is a low-level function that performs HMAC verification with a
/// single secret key. For most use cases, prefer [`verify_webhook`] which
/// supports key rotation.
///
/// # Example
///
/// ```rust
/// use shopsync::webhooks::verify_hmac;
/// use shopsync::auth::hmac::compute_signature_base64;
///
/// let body = b"webhook payload";
/// let secret = "my-secret-key";
/// let hmac = compute_signature_base64(body, secret);
///
/// assert!(verify_hmac(body, &hmac, secret));
/// assert!(!verify_hmac(body, "invalid", secret));
/// ```
#[must_use]
pub fn verify_hmac(raw_body: &[u8], hmac_header: &str, secret: &str) -> bool {
    let computed = compute_signature_base64(raw_body, secret);
    constant_time_compare(&computed, hmac_header)
}

/// Verifies a webhook request and returns the verified context.
///
/// Validates the HMAC signature using the config's API secret key, with
/// automatic fallback to the old API secret key for key rotation support:
/// if the primary `api_secret_key` fails verification, the old key is
/// tried when configured, so in-flight webhooks survive a rotation.
///
/// # Errors
///
/// Returns [`WebhookError::InvalidHmac`] if no configured key verifies
/// the signature.
pub fn verify_webhook(
    config: &SyncConfig,
    request: &WebhookRequest,
) -> Result<WebhookContext, WebhookError> {
    let body = request.body();
    let hmac_header = request.hmac_header();

    // Try primary secret key first
    let mut verified = verify_hmac(body, hmac_header, config.api_secret_key().as_ref());

    // Fall back to old secret key if configured and primary fails
    if !verified {
        if let Some(old_secret) = config.old_api_secret_key() {
            verified = verify_hmac(body, hmac_header, old_secret.as_ref());
        }
    }

    if !verified {
        return Err(WebhookError::InvalidHmac);
    }

    let topic = WebhookTopic::parse(request.topic().unwrap_or(""));

    Ok(WebhookContext::new(
        topic,
        request.shop_domain().map(String::from),
        request.api_version().map(String::from),
        request.webhook_id().map(String::from),
    ))
}
