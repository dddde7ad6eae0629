//! # shopsync
//!
//! Backend core for a commerce-platform integration service: session
//! persistence for OAuth-authenticated stores, store registration and
//! lifecycle tracking, a local product mirror, and a webhook event
//! processor with HMAC signature verification and compliance handling.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`SyncConfig`] and [`SyncConfigBuilder`]
//! - Validated newtypes for the API secret, shop domains, and host URLs
//! - [`Session`] persistence with opaque-payload round-tripping
//! - Store registry, product mirror, callback audit log, and compliance
//!   log behind async storage traits, with an in-memory backend
//! - Webhook verification (constant-time HMAC with key rotation) and a
//!   topic dispatcher covering uninstall, compliance, and product events
//! - OAuth callback orchestration and full product sync against the
//!   platform's Admin REST API
//!
//! ## Quick Start
//!
//! ```rust
//! use shopsync::{SyncConfig, ApiSecretKey};
//!
//! // Create configuration using the builder pattern
//! let config = SyncConfig::builder()
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .scopes("read_products,write_products")
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Processing Webhooks
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shopsync::{SyncConfig, ApiSecretKey};
//! use shopsync::storage::MemoryBackend;
//! use shopsync::webhooks::{WebhookProcessor, WebhookRequest};
//!
//! # async fn handle(body: Vec<u8>, hmac: String, topic: Option<String>, shop: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::builder()
//!     .api_secret_key(ApiSecretKey::new("your-api-secret")?)
//!     .build()?;
//! let processor = WebhookProcessor::from_backend(config, Arc::new(MemoryBackend::new()));
//!
//! // Body must be the raw bytes as received; the signature covers them
//! let request = WebhookRequest::new(body, hmac, topic, shop, None, None);
//! match processor.process(&request).await {
//!     Ok(outcome) => { /* acknowledged; outcome says what was applied */ }
//!     Err(_) => { /* invalid signature; respond 401 */ }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Session Management
//!
//! Sessions represent authenticated connections to a store, offline
//! (app-level) or online (user-specific):
//!
//! ```rust
//! use shopsync::{Session, ShopDomain};
//!
//! let shop = ShopDomain::new("my-store").unwrap();
//! let offline_session = Session::new(
//!     Session::offline_id(&shop),
//!     shop,
//!     "access-token".to_string(),
//!     Some("read_products".to_string()),
//!     false,
//!     None,
//! );
//!
//! // Sessions serialize for storage
//! let json = serde_json::to_string(&offline_session).unwrap();
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed
//!   explicitly
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Thread-safe**: all types are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime
//! - **Acknowledge after the gate**: only a bad webhook signature rejects
//!   a delivery; every later failure is logged and acknowledged

pub mod auth;
pub mod callback;
pub mod config;
pub mod error;
pub mod remote;
pub mod storage;
pub mod sync;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use auth::Session;
pub use callback::{complete_callback, CallbackDeps, CallbackError, CallbackSummary};
pub use config::{ApiSecretKey, HostUrl, ShopDomain, SyncConfig, SyncConfigBuilder};
pub use error::ConfigError;
pub use remote::{AdminRestApi, RemoteStoreApi, UpstreamError};
pub use sync::{sync_products, SyncError, SyncReport};
pub use webhooks::{WebhookError, WebhookOutcome, WebhookProcessor, WebhookRequest};
