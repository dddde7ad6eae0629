//! In-memory storage backend.
//!
//! Implements every storage trait over `tokio::sync::RwLock`-guarded maps.
//! Each upsert runs inside a single write-lock critical section, so
//! concurrent installs for the same store converge to the last writer
//! without a torn record. Used by the test suites and by embedded
//! deployments that have no external document store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;

use crate::auth::Session;
use crate::config::ShopDomain;
use crate::storage::records::{
    CallbackOutcome, CallbackRecord, ComplianceRequest, NewCallback, NewStore, ProductRecord,
    ProductStats, ProductStatus, SessionDocument, StoreRecord, StoreSummary,
};
use crate::storage::{
    CallbackRecorder, ComplianceLog, ProductMirror, SessionStorage, StorageError, StoreRegistry,
};

/// In-memory document store backing all five collections.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use shopsync::storage::{MemoryBackend, SessionStorage};
/// use shopsync::{Session, ShopDomain};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let backend = Arc::new(MemoryBackend::new());
/// let shop = ShopDomain::new("my-store").unwrap();
/// let session = Session::new(
///     Session::offline_id(&shop),
///     shop,
///     "token".to_string(),
///     None,
///     false,
///     None,
/// );
///
/// backend.store_session(&session).await.unwrap();
/// assert!(backend.load_session(&session.id).await.unwrap().is_some());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    sessions: RwLock<HashMap<String, SessionDocument>>,
    stores: RwLock<HashMap<String, StoreRecord>>,
    products: RwLock<HashMap<(String, i64), ProductRecord>>,
    callbacks: RwLock<HashMap<String, CallbackRecord>>,
    compliance: RwLock<Vec<ComplianceRequest>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_handle() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect()
    }
}

#[async_trait]
impl SessionStorage for MemoryBackend {
    async fn store_session(&self, session: &Session) -> Result<(), StorageError> {
        let doc = SessionDocument::from_session(session)?;
        self.sessions.write().await.insert(session.id.clone(), doc);
        Ok(())
    }

    async fn load_session(&self, id: &str) -> Result<Option<Session>, StorageError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).cloned().map(SessionDocument::into_session))
    }

    async fn delete_session(&self, id: &str) -> Result<(), StorageError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn delete_sessions(&self, ids: &[String]) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write().await;
        for id in ids {
            sessions.remove(id);
        }
        Ok(())
    }

    async fn find_sessions_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<Session>, StorageError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|doc| &doc.shop == shop)
            .cloned()
            .map(SessionDocument::into_session)
            .collect())
    }

    async fn delete_sessions_for_shop(&self, shop: &ShopDomain) -> Result<u64, StorageError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, doc| &doc.shop != shop);
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl StoreRegistry for MemoryBackend {
    async fn upsert_store(&self, store: NewStore) -> Result<StoreRecord, StorageError> {
        let now = Utc::now();
        let mut stores = self.stores.write().await;

        let record = match stores.get(store.shop.as_ref()) {
            Some(existing) => StoreRecord {
                shop: store.shop.clone(),
                shop_domain: store.shop_domain,
                access_token: store.access_token,
                scope: store.scope,
                shop_data: store.shop_data.or_else(|| existing.shop_data.clone()),
                is_active: true,
                installed_at: existing.installed_at,
                last_access_at: now,
                // Re-installation clears the uninstall marker
                uninstalled_at: None,
            },
            None => StoreRecord {
                shop: store.shop.clone(),
                shop_domain: store.shop_domain,
                access_token: store.access_token,
                scope: store.scope,
                shop_data: store.shop_data,
                is_active: true,
                installed_at: now,
                last_access_at: now,
                uninstalled_at: None,
            },
        };

        stores.insert(record.shop.as_ref().to_string(), record.clone());
        Ok(record)
    }

    async fn get_store(&self, shop: &ShopDomain) -> Result<Option<StoreRecord>, StorageError> {
        let stores = self.stores.read().await;
        Ok(stores.get(shop.as_ref()).cloned())
    }

    async fn list_active_stores(&self) -> Result<Vec<StoreSummary>, StorageError> {
        let stores = self.stores.read().await;
        let mut active: Vec<StoreSummary> = stores
            .values()
            .filter(|record| record.is_active)
            .cloned()
            .map(StoreSummary::from)
            .collect();
        active.sort_by(|a, b| b.last_access_at.cmp(&a.last_access_at));
        Ok(active)
    }

    async fn touch_last_access(&self, shop: &ShopDomain) -> Result<(), StorageError> {
        let mut stores = self.stores.write().await;
        if let Some(record) = stores.get_mut(shop.as_ref()) {
            record.last_access_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_uninstalled(&self, shop: &ShopDomain) -> Result<(), StorageError> {
        let mut stores = self.stores.write().await;
        if let Some(record) = stores.get_mut(shop.as_ref()) {
            record.is_active = false;
            if record.uninstalled_at.is_none() {
                record.uninstalled_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn delete_store(&self, shop: &ShopDomain) -> Result<u64, StorageError> {
        let removed = self.stores.write().await.remove(shop.as_ref());
        Ok(u64::from(removed.is_some()))
    }
}

#[async_trait]
impl ProductMirror for MemoryBackend {
    async fn upsert_product(&self, product: ProductRecord) -> Result<(), StorageError> {
        let key = (product.shop.as_ref().to_string(), product.product_id);
        self.products.write().await.insert(key, product);
        Ok(())
    }

    async fn get_product(
        &self,
        shop: &ShopDomain,
        product_id: i64,
    ) -> Result<Option<ProductRecord>, StorageError> {
        let products = self.products.read().await;
        Ok(products
            .get(&(shop.as_ref().to_string(), product_id))
            .cloned())
    }

    async fn list_products_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let products = self.products.read().await;
        let mut matching: Vec<ProductRecord> = products
            .values()
            .filter(|record| &record.shop == shop)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.synced_at.cmp(&a.synced_at));
        Ok(matching)
    }

    async fn list_products_by_status(
        &self,
        shop: &ShopDomain,
        status: ProductStatus,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let mut matching = self.list_products_for_shop(shop).await?;
        matching.retain(|record| record.status == status);
        Ok(matching)
    }

    async fn search_products(
        &self,
        shop: &ShopDomain,
        query: &str,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let needle = query.to_lowercase();
        let mut matching = self.list_products_for_shop(shop).await?;
        matching.retain(|record| {
            record.title.to_lowercase().contains(&needle)
                || record
                    .vendor
                    .as_deref()
                    .is_some_and(|v| v.to_lowercase().contains(&needle))
                || record
                    .product_type
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
        });
        Ok(matching)
    }

    async fn product_stats(&self, shop: &ShopDomain) -> Result<ProductStats, StorageError> {
        let products = self.products.read().await;
        let mut stats = ProductStats::default();
        for record in products.values().filter(|record| &record.shop == shop) {
            stats.total += 1;
            match record.status {
                ProductStatus::Active => stats.active += 1,
                ProductStatus::Archived => stats.archived += 1,
                ProductStatus::Draft => stats.draft += 1,
            }
        }
        Ok(stats)
    }

    async fn delete_products_for_shop(&self, shop: &ShopDomain) -> Result<u64, StorageError> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|_, record| &record.shop != shop);
        Ok((before - products.len()) as u64)
    }
}

#[async_trait]
impl CallbackRecorder for MemoryBackend {
    async fn record_callback(&self, callback: NewCallback) -> Result<String, StorageError> {
        let handle = Self::generate_handle();
        let record = CallbackRecord {
            handle: handle.clone(),
            shop: callback.shop,
            code: callback.code,
            state: callback.state,
            hmac: callback.hmac,
            host: callback.host,
            timestamp: callback.timestamp,
            callback_data: callback.callback_data,
            session_id: None,
            success: None,
            error: None,
            created_at: Utc::now(),
        };
        self.callbacks.write().await.insert(handle.clone(), record);
        Ok(handle)
    }

    async fn attach_outcome(
        &self,
        handle: &str,
        outcome: CallbackOutcome,
    ) -> Result<(), StorageError> {
        let mut callbacks = self.callbacks.write().await;
        match callbacks.get_mut(handle) {
            Some(record) => {
                record.session_id = outcome.session_id;
                record.success = Some(outcome.success);
                record.error = outcome.error;
                Ok(())
            }
            None => Err(StorageError::Backend(format!(
                "no callback record for handle '{handle}'"
            ))),
        }
    }

    async fn get_callback(&self, handle: &str) -> Result<Option<CallbackRecord>, StorageError> {
        let callbacks = self.callbacks.read().await;
        Ok(callbacks.get(handle).cloned())
    }

    async fn find_callbacks_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<CallbackRecord>, StorageError> {
        let callbacks = self.callbacks.read().await;
        let mut matching: Vec<CallbackRecord> = callbacks
            .values()
            .filter(|record| &record.shop == shop)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn delete_callbacks_for_shop(&self, shop: &ShopDomain) -> Result<u64, StorageError> {
        let mut callbacks = self.callbacks.write().await;
        let before = callbacks.len();
        callbacks.retain(|_, record| &record.shop != shop);
        Ok((before - callbacks.len()) as u64)
    }
}

#[async_trait]
impl ComplianceLog for MemoryBackend {
    async fn record_request(&self, request: ComplianceRequest) -> Result<(), StorageError> {
        self.compliance.write().await.push(request);
        Ok(())
    }

    async fn list_requests(&self) -> Result<Vec<ComplianceRequest>, StorageError> {
        Ok(self.compliance.read().await.clone())
    }
}
