//! Webhook verification and event processing.
//!
//! Two layers live here. [`verification`] checks the HMAC signature the
//! platform attaches to every delivery, including key-rotation fallback.
//! [`processor`] sits on top: [`WebhookProcessor::process`] verifies a
//! delivery and applies it to the stores, acknowledging everything past
//! the signature gate so the platform never redelivers an event the
//! service has already seen.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shopsync::config::ApiSecretKey;
//! use shopsync::storage::MemoryBackend;
//! use shopsync::webhooks::{WebhookProcessor, WebhookRequest};
//! use shopsync::SyncConfig;
//!
//! # async fn handle(raw_body: Vec<u8>, hmac_header: String) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::builder()
//!     .api_secret_key(ApiSecretKey::new("secret")?)
//!     .build()?;
//! let processor = WebhookProcessor::from_backend(config, Arc::new(MemoryBackend::new()));
//!
//! let request = WebhookRequest::new(
//!     raw_body,
//!     hmac_header,
//!     Some("products/update".to_string()),
//!     Some("example.myshopify.com".to_string()),
//!     None,
//!     None,
//! );
//! let outcome = processor.process(&request).await?;
//! # Ok(())
//! # }
//! ```

mod errors;
pub mod processor;
pub mod topic;
pub mod verification;

pub use errors::WebhookError;
pub use processor::{RedactSummary, WebhookOutcome, WebhookProcessor};
pub use topic::WebhookTopic;
pub use verification::{
    verify_hmac, verify_webhook, WebhookContext, WebhookRequest, HEADER_API_VERSION, HEADER_HMAC,
    HEADER_SHOP_DOMAIN, HEADER_TOPIC, HEADER_WEBHOOK_ID,
};
