//! OAuth callback completion.
//!
//! [`complete_callback`] is the post-exchange orchestration: given the
//! session produced by the OAuth handshake, it audits the callback,
//! persists the session, registers the store, and stamps the outcome.
//! The audit record is written first and receives its outcome exactly
//! once, success or failure, so every attempt leaves one traceable
//! record.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::Session;
use crate::config::ShopDomain;
use crate::remote::RemoteStoreApi;
use crate::storage::{
    CallbackOutcome, CallbackRecorder, NewCallback, NewStore, SessionStorage, StorageError,
    StoreRegistry,
};

/// Errors that abort a callback flow.
///
/// Only the primary path fails the flow: persisting the session. Audit
/// recording, shop-metadata fetching, and registry bookkeeping degrade to
/// log lines and summary fields instead.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The session could not be persisted.
    #[error("Failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

/// Collaborators the callback flow writes through.
#[derive(Clone)]
pub struct CallbackDeps {
    pub sessions: Arc<dyn SessionStorage>,
    pub stores: Arc<dyn StoreRegistry>,
    pub callbacks: Arc<dyn CallbackRecorder>,
    pub remote: Arc<dyn RemoteStoreApi>,
}

/// What a completed callback flow did.
#[derive(Debug)]
pub struct CallbackSummary {
    /// Audit record handle; `None` when recording itself failed.
    pub handle: Option<String>,
    /// Id of the persisted session.
    pub session_id: String,
    /// Whether the store registry accepted the upsert.
    pub store_registered: bool,
    /// The upstream error text when shop metadata could not be fetched.
    /// The store is still registered without metadata in that case.
    pub upstream_error: Option<String>,
}

/// Completes an OAuth callback.
///
/// Steps, in order:
///
/// 1. Record the callback for audit. Failure is logged; the flow continues.
/// 2. Persist the session. This is the primary path: failure aborts the
///    flow (after the audit outcome is attached).
/// 3. Fetch shop metadata and upsert the store registry. Upstream failure
///    is logged and reported in the summary but never rolls back the
///    stored session; the store is registered without metadata.
/// 4. Refresh the store's `last_access_at`, best effort.
/// 5. Attach the outcome to the audit record, exactly once.
///
/// # Errors
///
/// Returns [`CallbackError::Storage`] when the session cannot be
/// persisted.
pub async fn complete_callback(
    params: NewCallback,
    session: &Session,
    deps: &CallbackDeps,
) -> Result<CallbackSummary, CallbackError> {
    let shop = session.shop.clone();

    let handle = match deps.callbacks.record_callback(params).await {
        Ok(handle) => Some(handle),
        Err(err) => {
            // Audit must never block the install itself
            warn!(shop = %shop, %err, "Failed to record OAuth callback");
            None
        }
    };

    let result = run_flow(session, deps).await;

    if let Some(handle) = &handle {
        let outcome = match &result {
            Ok(_) => CallbackOutcome::succeeded(session.id.clone()),
            Err(err) => CallbackOutcome::failed(err.to_string()),
        };
        if let Err(err) = deps.callbacks.attach_outcome(handle, outcome).await {
            warn!(shop = %shop, handle, %err, "Failed to attach callback outcome");
        }
    }

    result.map(|mut summary| {
        summary.handle = handle;
        summary
    })
}

async fn run_flow(
    session: &Session,
    deps: &CallbackDeps,
) -> Result<CallbackSummary, CallbackError> {
    let shop = &session.shop;

    deps.sessions.store_session(session).await?;
    info!(shop = %shop, session_id = session.id, "Stored OAuth session");

    let (shop_data, upstream_error) = match deps.remote.fetch_shop_metadata(session).await {
        Ok(data) => (Some(data), None),
        Err(err) => {
            warn!(shop = %shop, %err, "Failed to fetch shop metadata; registering store without it");
            (None, Some(err.to_string()))
        }
    };

    let store_registered = match deps
        .stores
        .upsert_store(NewStore::from_session(session, shop_data))
        .await
    {
        Ok(record) => {
            info!(shop = %shop, installed_at = %record.installed_at, "Registered store");
            true
        }
        Err(err) => {
            error!(shop = %shop, %err, "Failed to register store; session remains stored");
            false
        }
    };

    if let Err(err) = deps.stores.touch_last_access(shop).await {
        warn!(shop = %shop, %err, "Failed to refresh store last access");
    }

    Ok(CallbackSummary {
        handle: None,
        session_id: session.id.clone(),
        store_registered,
        upstream_error,
    })
}

/// Refreshes a store's `last_access_at` on an authenticated request.
///
/// Best effort: a storage failure is logged and swallowed so request
/// handling is never blocked by bookkeeping.
pub async fn authenticated_access(shop: &ShopDomain, stores: &dyn StoreRegistry) {
    if let Err(err) = stores.touch_last_access(shop).await {
        warn!(shop = %shop, %err, "Failed to refresh store last access");
    }
}
