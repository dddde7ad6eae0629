//! Storage traits and persisted record types.
//!
//! The persistence engine is a collaborator, not part of this crate: every
//! collection sits behind a narrow async trait (find/upsert/delete-by-filter
//! semantics) that a document store backend implements. [`MemoryBackend`]
//! provides an in-process implementation used by tests and embedded
//! deployments.
//!
//! # Traits
//!
//! - [`SessionStorage`]: OAuth session records, keyed by session id
//! - [`StoreRegistry`]: per-store installation state, keyed by store domain
//! - [`ProductMirror`]: local copies of remote products, keyed by
//!   `(store, product id)`
//! - [`CallbackRecorder`]: append-only OAuth callback audit log
//! - [`ComplianceLog`]: durably recorded compliance requests
//!
//! # Error Handling
//!
//! Backends map their failures into [`StorageError`]: driver/transport
//! problems become `Backend`, serialization problems become `Encode` /
//! `Decode`. Callers decide whether a failure is recoverable — bulk
//! compliance sweeps catch and log per sub-operation, primary paths
//! propagate with `?`.

mod memory;
mod records;

pub use memory::MemoryBackend;
pub use records::{
    CallbackOutcome, CallbackRecord, ComplianceKind, ComplianceRequest, NewCallback, NewStore,
    ProductRecord, ProductStats, ProductStatus, SessionDocument, StoreRecord, StoreSummary,
};

use crate::auth::Session;
use crate::config::ShopDomain;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage backend failed (connection, query, constraint).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A record could not be serialized for storage.
    #[error("failed to encode record: {0}")]
    Encode(String),

    /// A stored record could not be deserialized.
    #[error("failed to decode record: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

/// Persistence for OAuth session records.
///
/// This is the narrow interface the OAuth capability is configured to call;
/// the protocol itself lives outside this crate. Every write is an upsert
/// by session id and every delete is idempotent, so redelivered or
/// replayed flows cannot corrupt state.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Upserts a session by id, persisting both the structured fields and
    /// the full opaque payload.
    async fn store_session(&self, session: &Session) -> Result<(), StorageError>;

    /// Loads a session by id. Returns `Ok(None)` when no record exists.
    async fn load_session(&self, id: &str) -> Result<Option<Session>, StorageError>;

    /// Deletes a session by id. Deleting a missing id is not an error.
    async fn delete_session(&self, id: &str) -> Result<(), StorageError>;

    /// Deletes every session in `ids`. Missing ids are skipped.
    async fn delete_sessions(&self, ids: &[String]) -> Result<(), StorageError>;

    /// Returns every session belonging to a store.
    async fn find_sessions_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<Session>, StorageError>;

    /// Deletes every session belonging to a store, returning the count.
    ///
    /// Used by the uninstall and redact flows.
    async fn delete_sessions_for_shop(&self, shop: &ShopDomain) -> Result<u64, StorageError>;
}

/// Persistence for per-store installation state.
#[async_trait]
pub trait StoreRegistry: Send + Sync {
    /// Creates or updates the store record.
    ///
    /// On (re)installation this sets `is_active = true` and clears any
    /// prior `uninstalled_at`. The upsert must be atomic from the caller's
    /// point of view: concurrent installs may race, and last-writer-wins is
    /// acceptable, but a partial write is not.
    async fn upsert_store(&self, store: NewStore) -> Result<StoreRecord, StorageError>;

    /// Returns the store record, if present.
    async fn get_store(&self, shop: &ShopDomain) -> Result<Option<StoreRecord>, StorageError>;

    /// Returns summaries of every active store, most recently accessed
    /// first. Access tokens are projected away.
    async fn list_active_stores(&self) -> Result<Vec<StoreSummary>, StorageError>;

    /// Refreshes `last_access_at`. Best-effort: callers log and continue on
    /// failure rather than failing the surrounding request.
    async fn touch_last_access(&self, shop: &ShopDomain) -> Result<(), StorageError>;

    /// Marks the store uninstalled (`is_active = false`, `uninstalled_at =
    /// now`). Idempotent; a missing store is not an error.
    async fn mark_uninstalled(&self, shop: &ShopDomain) -> Result<(), StorageError>;

    /// Permanently removes the store record, returning the deleted count.
    async fn delete_store(&self, shop: &ShopDomain) -> Result<u64, StorageError>;
}

/// Persistence for the local product mirror.
#[async_trait]
pub trait ProductMirror: Send + Sync {
    /// Upserts a product by `(shop, product_id)`. Last writer wins;
    /// re-applying the same record leaves exactly one copy.
    async fn upsert_product(&self, product: ProductRecord) -> Result<(), StorageError>;

    /// Returns one mirrored product, if present.
    async fn get_product(
        &self,
        shop: &ShopDomain,
        product_id: i64,
    ) -> Result<Option<ProductRecord>, StorageError>;

    /// Returns every mirrored product for a store, most recently synced
    /// first.
    async fn list_products_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<ProductRecord>, StorageError>;

    /// Returns mirrored products for a store filtered by status.
    async fn list_products_by_status(
        &self,
        shop: &ShopDomain,
        status: ProductStatus,
    ) -> Result<Vec<ProductRecord>, StorageError>;

    /// Case-insensitive text search over title, vendor, and product type.
    async fn search_products(
        &self,
        shop: &ShopDomain,
        query: &str,
    ) -> Result<Vec<ProductRecord>, StorageError>;

    /// Returns per-status counts for a store.
    async fn product_stats(&self, shop: &ShopDomain) -> Result<ProductStats, StorageError>;

    /// Deletes every mirrored product for a store, returning the count.
    async fn delete_products_for_shop(&self, shop: &ShopDomain) -> Result<u64, StorageError>;
}

/// Append-only audit log of OAuth callback attempts.
#[async_trait]
pub trait CallbackRecorder: Send + Sync {
    /// Records the start of a callback attempt and returns a handle for
    /// attaching the outcome later.
    async fn record_callback(&self, callback: NewCallback) -> Result<String, StorageError>;

    /// Attaches the outcome to a previously recorded attempt. This is the
    /// only mutation a callback record ever receives.
    async fn attach_outcome(
        &self,
        handle: &str,
        outcome: CallbackOutcome,
    ) -> Result<(), StorageError>;

    /// Returns a recorded callback by handle.
    async fn get_callback(&self, handle: &str) -> Result<Option<CallbackRecord>, StorageError>;

    /// Returns every recorded callback for a store, newest first.
    async fn find_callbacks_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<CallbackRecord>, StorageError>;

    /// Deletes every callback record for a store, returning the count.
    /// Only the redact flow calls this.
    async fn delete_callbacks_for_shop(&self, shop: &ShopDomain) -> Result<u64, StorageError>;
}

/// Durable log of compliance requests awaiting external fulfillment.
///
/// Fulfillment (data export, erasure confirmation) is a process-level
/// obligation outside this service; recording the request durably is what
/// makes that process possible.
#[async_trait]
pub trait ComplianceLog: Send + Sync {
    /// Appends a compliance request.
    async fn record_request(&self, request: ComplianceRequest) -> Result<(), StorageError>;

    /// Returns every recorded request, oldest first.
    async fn list_requests(&self) -> Result<Vec<ComplianceRequest>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_messages() {
        let backend = StorageError::Backend("connection refused".to_string());
        assert!(backend.to_string().contains("connection refused"));

        let decode = StorageError::Decode("unexpected end of input".to_string());
        assert!(decode.to_string().contains("decode"));
    }

    #[test]
    fn test_serde_json_error_converts_to_encode() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json");
        let storage_err: StorageError = bad.unwrap_err().into();
        assert!(matches!(storage_err, StorageError::Encode(_)));
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn assert_object_safe(
            _: Option<&dyn SessionStorage>,
            _: Option<&dyn StoreRegistry>,
            _: Option<&dyn ProductMirror>,
            _: Option<&dyn CallbackRecorder>,
            _: Option<&dyn ComplianceLog>,
        ) {
        }
        assert_object_safe(None, None, None, None, None);
    }
}
