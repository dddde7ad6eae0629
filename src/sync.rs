//! Product synchronization.
//!
//! Pulls the full product list for a store and mirrors it locally. Sync
//! stores what it can: a product that fails to map or upsert is counted
//! and logged, and the loop continues with the rest.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::Session;
use crate::remote::{RemoteStoreApi, UpstreamError};
use crate::storage::{ProductMirror, ProductRecord};

/// Errors that abort a product sync before any product is written.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The product list could not be fetched.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Counts from one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Products the remote API returned.
    pub fetched: usize,
    /// Products upserted into the mirror.
    pub upserted: usize,
    /// Payloads without a numeric id, skipped.
    pub skipped: usize,
    /// Upsert attempts that failed; logged, loop continued.
    pub failed: usize,
}

/// Fetches the store's products and upserts each into the mirror.
///
/// # Errors
///
/// Returns [`SyncError::Upstream`] when the product list cannot be
/// fetched; nothing has been written at that point. Per-product failures
/// never abort the run — they are counted in the report instead.
pub async fn sync_products(
    session: &Session,
    remote: &dyn RemoteStoreApi,
    mirror: &dyn ProductMirror,
) -> Result<SyncReport, SyncError> {
    let shop = &session.shop;
    let payloads = remote.fetch_product_list(session).await?;

    let mut report = SyncReport {
        fetched: payloads.len(),
        ..SyncReport::default()
    };

    for payload in &payloads {
        let Some(record) = ProductRecord::from_payload(shop, payload) else {
            warn!(shop = %shop, "Skipping product payload without a numeric id");
            report.skipped += 1;
            continue;
        };
        let product_id = record.product_id;

        match mirror.upsert_product(record).await {
            Ok(()) => report.upserted += 1,
            Err(err) => {
                warn!(shop = %shop, product_id, %err, "Failed to mirror product during sync");
                report.failed += 1;
            }
        }
    }

    info!(
        shop = %shop,
        fetched = report.fetched,
        upserted = report.upserted,
        skipped = report.skipped,
        failed = report.failed,
        "Product sync finished"
    );
    Ok(report)
}
