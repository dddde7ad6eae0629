//! Webhook event processor.
//!
//! [`WebhookProcessor`] is the single entry point for incoming webhook
//! deliveries: it gates on the HMAC signature, dispatches on topic, and
//! applies the event to the stores. The acknowledgement contract follows
//! the platform's redelivery semantics:
//!
//! - A bad signature is the only outright rejection
//!   ([`WebhookError::InvalidHmac`], the HTTP 401 case). Nothing is
//!   mutated on that path.
//! - Everything after the signature gate acknowledges the delivery.
//!   Malformed payloads, missing headers, and storage failures are logged
//!   and reported through [`WebhookOutcome`] rather than returned as
//!   errors, so the platform does not redeliver an event the service has
//!   already seen.
//!
//! Every handler is idempotent under redelivery: uninstall marks and
//! deletions converge, product events upsert by id.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::{ShopDomain, SyncConfig};
use crate::storage::{
    CallbackRecorder, ComplianceKind, ComplianceLog, ComplianceRequest, ProductMirror,
    ProductRecord, SessionStorage, StorageError, StoreRegistry,
};
use crate::webhooks::topic::WebhookTopic;
use crate::webhooks::verification::{verify_webhook, WebhookRequest};
use crate::webhooks::WebhookError;

// ============================================================================
// Outcomes
// ============================================================================

/// What processing a verified delivery did.
///
/// Returned for every acknowledged delivery; the variants cover both the
/// applied mutations and the logged-and-skipped cases.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// `app/uninstalled` was applied.
    Uninstalled {
        shop: ShopDomain,
        /// `None` when the session store failed; the failure is logged and
        /// does not prevent the registry update.
        sessions_deleted: Option<u64>,
        /// Whether the registry accepted the uninstall mark.
        store_marked: bool,
    },
    /// A compliance event was durably recorded.
    ComplianceRecorded {
        shop: ShopDomain,
        kind: ComplianceKind,
    },
    /// `shop/redact` ran its four-category sweep.
    ShopRedacted(RedactSummary),
    /// A product create/update event was mirrored.
    ProductUpserted { shop: ShopDomain, product_id: i64 },
    /// The topic has no handler; acknowledged without mutation.
    Ignored { topic: String },
    /// The body did not parse into what the topic requires.
    MalformedPayload { topic: String },
    /// The topic needs a shop-domain header and none (or an invalid one)
    /// was present.
    MissingShopDomain { topic: String },
    /// A storage write failed after the signature gate; logged, delivery
    /// still acknowledged.
    StorageFailed { topic: String, message: String },
}

/// Per-category results of a `shop/redact` sweep.
///
/// The four deletions run independently: one category failing never stops
/// the others. Each slot holds the deleted count or the captured error.
#[derive(Debug)]
pub struct RedactSummary {
    pub shop: ShopDomain,
    pub stores: Result<u64, StorageError>,
    pub products: Result<u64, StorageError>,
    pub sessions: Result<u64, StorageError>,
    pub callbacks: Result<u64, StorageError>,
}

impl RedactSummary {
    /// Whether all four categories deleted without error.
    #[must_use]
    pub fn fully_succeeded(&self) -> bool {
        self.stores.is_ok()
            && self.products.is_ok()
            && self.sessions.is_ok()
            && self.callbacks.is_ok()
    }
}

// ============================================================================
// Processor
// ============================================================================

/// Applies verified webhook deliveries to the stores.
pub struct WebhookProcessor {
    config: SyncConfig,
    sessions: Arc<dyn SessionStorage>,
    stores: Arc<dyn StoreRegistry>,
    products: Arc<dyn ProductMirror>,
    callbacks: Arc<dyn CallbackRecorder>,
    compliance: Arc<dyn ComplianceLog>,
}

// Verify WebhookProcessor is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookProcessor>();
};

impl WebhookProcessor {
    /// Creates a processor over explicit store handles.
    #[must_use]
    pub fn new(
        config: SyncConfig,
        sessions: Arc<dyn SessionStorage>,
        stores: Arc<dyn StoreRegistry>,
        products: Arc<dyn ProductMirror>,
        callbacks: Arc<dyn CallbackRecorder>,
        compliance: Arc<dyn ComplianceLog>,
    ) -> Self {
        Self {
            config,
            sessions,
            stores,
            products,
            callbacks,
            compliance,
        }
    }

    /// Creates a processor over a single backend implementing all five
    /// store traits, such as [`crate::storage::MemoryBackend`].
    #[must_use]
    pub fn from_backend<B>(config: SyncConfig, backend: Arc<B>) -> Self
    where
        B: SessionStorage
            + StoreRegistry
            + ProductMirror
            + CallbackRecorder
            + ComplianceLog
            + 'static,
    {
        Self {
            config,
            sessions: backend.clone(),
            stores: backend.clone(),
            products: backend.clone(),
            callbacks: backend.clone(),
            compliance: backend,
        }
    }

    /// Verifies and processes one webhook delivery.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidHmac`] when the signature does not
    /// verify; no store is touched on that path. All post-verification
    /// failures are folded into the returned [`WebhookOutcome`].
    pub async fn process(&self, request: &WebhookRequest) -> Result<WebhookOutcome, WebhookError> {
        let context = verify_webhook(&self.config, request)?;
        let topic = context.topic().clone();

        info!(
            topic = %topic,
            shop = context.shop_domain().unwrap_or("<none>"),
            webhook_id = context.webhook_id().unwrap_or("<none>"),
            "Processing webhook delivery"
        );

        match topic {
            WebhookTopic::AppUninstalled => {
                let Some(shop) = Self::shop_from_header(&topic, context.shop_domain()) else {
                    return Ok(Self::missing_shop(&topic));
                };
                Ok(self.handle_uninstalled(shop).await)
            }
            WebhookTopic::CustomersDataRequest => Ok(self
                .handle_compliance(
                    &topic,
                    context.shop_domain(),
                    request.body(),
                    ComplianceKind::DataRequest,
                )
                .await),
            WebhookTopic::CustomersRedact => Ok(self
                .handle_compliance(
                    &topic,
                    context.shop_domain(),
                    request.body(),
                    ComplianceKind::CustomerRedact,
                )
                .await),
            WebhookTopic::ShopRedact => {
                let Some(shop) = Self::shop_from_header(&topic, context.shop_domain()) else {
                    return Ok(Self::missing_shop(&topic));
                };
                Ok(WebhookOutcome::ShopRedacted(self.handle_shop_redact(shop).await))
            }
            WebhookTopic::ProductsCreate | WebhookTopic::ProductsUpdate => {
                let Some(shop) = Self::shop_from_header(&topic, context.shop_domain()) else {
                    return Ok(Self::missing_shop(&topic));
                };
                Ok(self.handle_product_event(&topic, shop, request.body()).await)
            }
            WebhookTopic::Unknown(raw) => {
                info!(topic = %raw, "Ignoring webhook with unhandled topic");
                Ok(WebhookOutcome::Ignored { topic: raw })
            }
        }
    }

    fn shop_from_header(topic: &WebhookTopic, header: Option<&str>) -> Option<ShopDomain> {
        let raw = header?;
        match ShopDomain::new(raw) {
            Ok(shop) => Some(shop),
            Err(err) => {
                warn!(topic = %topic, domain = raw, %err, "Webhook carries an invalid shop domain");
                None
            }
        }
    }

    fn missing_shop(topic: &WebhookTopic) -> WebhookOutcome {
        warn!(topic = %topic, "Webhook requires a shop domain header; acknowledged without processing");
        WebhookOutcome::MissingShopDomain {
            topic: topic.as_str().to_string(),
        }
    }

    /// `app/uninstalled`: drop the shop's sessions and mark the store
    /// inactive. The two writes are independent; either failing is logged
    /// and does not prevent the other. Redelivery converges on the same
    /// state.
    async fn handle_uninstalled(&self, shop: ShopDomain) -> WebhookOutcome {
        let sessions_deleted = match self.sessions.delete_sessions_for_shop(&shop).await {
            Ok(count) => {
                info!(shop = %shop, count, "Deleted sessions for uninstalled shop");
                Some(count)
            }
            Err(err) => {
                error!(shop = %shop, %err, "Failed to delete sessions on uninstall");
                None
            }
        };

        let store_marked = match self.stores.mark_uninstalled(&shop).await {
            Ok(()) => true,
            Err(err) => {
                error!(shop = %shop, %err, "Failed to mark store uninstalled");
                false
            }
        };

        WebhookOutcome::Uninstalled {
            shop,
            sessions_deleted,
            store_marked,
        }
    }

    /// `customers/data_request` and `customers/redact`: record durably so
    /// an external process can fulfill them within the compliance window.
    /// The product mirror is shop-scoped, so a customer redact mutates
    /// nothing here.
    async fn handle_compliance(
        &self,
        topic: &WebhookTopic,
        shop_header: Option<&str>,
        body: &[u8],
        kind: ComplianceKind,
    ) -> WebhookOutcome {
        let payload: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(err) => {
                warn!(topic = %topic, %err, "Malformed compliance payload; acknowledged");
                return WebhookOutcome::MalformedPayload {
                    topic: topic.as_str().to_string(),
                };
            }
        };

        // The compliance payload names the shop in the body as well as the
        // header; accept either.
        let shop = Self::shop_from_header(topic, shop_header).or_else(|| {
            payload
                .get("shop_domain")
                .and_then(Value::as_str)
                .and_then(|raw| ShopDomain::new(raw).ok())
        });
        let Some(shop) = shop else {
            return Self::missing_shop(topic);
        };

        let customer = payload.get("customer");
        let request = ComplianceRequest {
            shop: shop.clone(),
            kind,
            customer_id: customer.and_then(|c| c.get("id")).and_then(Value::as_i64),
            customer_email: customer
                .and_then(|c| c.get("email"))
                .and_then(Value::as_str)
                .map(ToString::to_string),
            payload,
            received_at: chrono::Utc::now(),
        };

        match self.compliance.record_request(request).await {
            Ok(()) => {
                info!(shop = %shop, topic = %topic, "Recorded compliance request");
                WebhookOutcome::ComplianceRecorded { shop, kind }
            }
            Err(err) => {
                error!(shop = %shop, topic = %topic, %err, "Failed to record compliance request");
                WebhookOutcome::StorageFailed {
                    topic: topic.as_str().to_string(),
                    message: err.to_string(),
                }
            }
        }
    }

    /// `shop/redact`: delete everything held for the shop. Four
    /// independent deletions; each failure is captured in the summary and
    /// never stops the sweep.
    async fn handle_shop_redact(&self, shop: ShopDomain) -> RedactSummary {
        let stores = self.stores.delete_store(&shop).await;
        let products = self.products.delete_products_for_shop(&shop).await;
        let sessions = self.sessions.delete_sessions_for_shop(&shop).await;
        let callbacks = self.callbacks.delete_callbacks_for_shop(&shop).await;

        for (category, result) in [
            ("stores", &stores),
            ("products", &products),
            ("sessions", &sessions),
            ("callbacks", &callbacks),
        ] {
            match result {
                Ok(count) => info!(shop = %shop, category, count, "Redacted shop data"),
                Err(err) => error!(shop = %shop, category, %err, "Redact sweep failed for category"),
            }
        }

        RedactSummary {
            shop,
            stores,
            products,
            sessions,
            callbacks,
        }
    }

    /// `products/create` / `products/update`: map the payload and upsert
    /// by `(shop, product_id)`. Duplicate deliveries land on one record.
    async fn handle_product_event(
        &self,
        topic: &WebhookTopic,
        shop: ShopDomain,
        body: &[u8],
    ) -> WebhookOutcome {
        let payload: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(err) => {
                warn!(topic = %topic, shop = %shop, %err, "Malformed product payload; acknowledged");
                return WebhookOutcome::MalformedPayload {
                    topic: topic.as_str().to_string(),
                };
            }
        };

        let Some(record) = ProductRecord::from_payload(&shop, &payload) else {
            warn!(topic = %topic, shop = %shop, "Product payload has no numeric id; acknowledged");
            return WebhookOutcome::MalformedPayload {
                topic: topic.as_str().to_string(),
            };
        };
        let product_id = record.product_id;

        match self.products.upsert_product(record).await {
            Ok(()) => {
                info!(shop = %shop, product_id, topic = %topic, "Mirrored product event");
                WebhookOutcome::ProductUpserted { shop, product_id }
            }
            Err(err) => {
                error!(shop = %shop, product_id, %err, "Failed to mirror product event");
                WebhookOutcome::StorageFailed {
                    topic: topic.as_str().to_string(),
                    message: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hmac::compute_signature_base64;
    use crate::auth::Session;
    use crate::config::ApiSecretKey;
    use crate::storage::MemoryBackend;
    use serde_json::json;

    const SECRET: &str = "test-webhook-secret";

    fn processor(backend: Arc<MemoryBackend>) -> WebhookProcessor {
        let config = SyncConfig::builder()
            .api_secret_key(ApiSecretKey::new(SECRET).unwrap())
            .build()
            .unwrap();
        WebhookProcessor::from_backend(config, backend)
    }

    fn signed_request(topic: &str, shop: Option<&str>, body: &[u8]) -> WebhookRequest {
        WebhookRequest::new(
            body.to_vec(),
            compute_signature_base64(body, SECRET),
            Some(topic.to_string()),
            shop.map(ToString::to_string),
            None,
            None,
        )
    }

    fn shop(name: &str) -> ShopDomain {
        ShopDomain::new(name).unwrap()
    }

    async fn seed_store(backend: &MemoryBackend, shop_name: &str) {
        let session = Session::new(
            Session::offline_id(&shop(shop_name)),
            shop(shop_name),
            "token".to_string(),
            None,
            false,
            None,
        );
        backend.store_session(&session).await.unwrap();
        backend
            .upsert_store(crate::storage::NewStore::from_session(&session, None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_signature_rejected_without_mutation() {
        let backend = Arc::new(MemoryBackend::new());
        seed_store(&backend, "victim-shop").await;
        let processor = processor(backend.clone());

        let body = br#"{"id":1}"#;
        let request = WebhookRequest::new(
            body.to_vec(),
            compute_signature_base64(body, "wrong-secret"),
            Some("app/uninstalled".to_string()),
            Some("victim-shop.myshopify.com".to_string()),
            None,
            None,
        );

        let result = processor.process(&request).await;
        assert!(matches!(result, Err(WebhookError::InvalidHmac)));

        // Nothing was touched
        let record = backend.get_store(&shop("victim-shop")).await.unwrap().unwrap();
        assert!(record.is_active);
        assert_eq!(
            backend
                .find_sessions_for_shop(&shop("victim-shop"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_app_uninstalled_clears_sessions_and_marks_store() {
        let backend = Arc::new(MemoryBackend::new());
        seed_store(&backend, "leaving-shop").await;
        let processor = processor(backend.clone());

        let request = signed_request(
            "app/uninstalled",
            Some("leaving-shop.myshopify.com"),
            b"{}",
        );

        let outcome = processor.process(&request).await.unwrap();
        match outcome {
            WebhookOutcome::Uninstalled {
                sessions_deleted,
                store_marked,
                ..
            } => {
                assert_eq!(sessions_deleted, Some(1));
                assert!(store_marked);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let record = backend
            .get_store(&shop("leaving-shop"))
            .await
            .unwrap()
            .unwrap();
        assert!(!record.is_active);
        assert!(record.uninstalled_at.is_some());

        // Redelivery converges: no sessions left, store stays marked
        let outcome = processor.process(&request).await.unwrap();
        match outcome {
            WebhookOutcome::Uninstalled {
                sessions_deleted, ..
            } => assert_eq!(sessions_deleted, Some(0)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_data_request_recorded_durably() {
        let backend = Arc::new(MemoryBackend::new());
        let processor = processor(backend.clone());

        let body = json!({
            "shop_domain": "curious-shop.myshopify.com",
            "customer": {"id": 4321, "email": "customer@example.com"},
            "orders_requested": [99]
        })
        .to_string();
        let request = signed_request(
            "customers/data_request",
            Some("curious-shop.myshopify.com"),
            body.as_bytes(),
        );

        let outcome = processor.process(&request).await.unwrap();
        assert!(matches!(
            outcome,
            WebhookOutcome::ComplianceRecorded {
                kind: ComplianceKind::DataRequest,
                ..
            }
        ));

        let requests = backend.list_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].customer_id, Some(4321));
        assert_eq!(
            requests[0].customer_email.as_deref(),
            Some("customer@example.com")
        );
        // Full payload kept for fulfillment
        assert!(requests[0].payload.get("orders_requested").is_some());
    }

    #[tokio::test]
    async fn test_customer_redact_records_without_touching_mirror() {
        let backend = Arc::new(MemoryBackend::new());
        let s = shop("steady-shop");
        let record = ProductRecord::from_payload(&s, &json!({"id": 7, "title": "Keep me"})).unwrap();
        backend.upsert_product(record).await.unwrap();
        let processor = processor(backend.clone());

        let body = json!({"shop_domain": "steady-shop.myshopify.com", "customer": {"id": 1}})
            .to_string();
        let request = signed_request(
            "customers/redact",
            Some("steady-shop.myshopify.com"),
            body.as_bytes(),
        );

        let outcome = processor.process(&request).await.unwrap();
        assert!(matches!(
            outcome,
            WebhookOutcome::ComplianceRecorded {
                kind: ComplianceKind::CustomerRedact,
                ..
            }
        ));

        // Product data is shop-scoped, not customer-scoped
        assert_eq!(backend.list_products_for_shop(&s).await.unwrap().len(), 1);
        assert_eq!(backend.list_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shop_redact_sweeps_all_categories() {
        let backend = Arc::new(MemoryBackend::new());
        seed_store(&backend, "gone-shop").await;
        let s = shop("gone-shop");
        let record = ProductRecord::from_payload(&s, &json!({"id": 1, "title": "p"})).unwrap();
        backend.upsert_product(record).await.unwrap();
        backend
            .record_callback(crate::storage::NewCallback {
                shop: s.clone(),
                code: "c".to_string(),
                state: "st".to_string(),
                hmac: None,
                host: None,
                timestamp: None,
                callback_data: json!({}),
            })
            .await
            .unwrap();
        let processor = processor(backend.clone());

        let request = signed_request("shop/redact", Some("gone-shop.myshopify.com"), b"{}");
        let outcome = processor.process(&request).await.unwrap();

        match outcome {
            WebhookOutcome::ShopRedacted(summary) => {
                assert!(summary.fully_succeeded());
                assert_eq!(summary.stores.unwrap(), 1);
                assert_eq!(summary.products.unwrap(), 1);
                assert_eq!(summary.sessions.unwrap(), 1);
                assert_eq!(summary.callbacks.unwrap(), 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert!(backend.get_store(&s).await.unwrap().is_none());
        assert!(backend.list_products_for_shop(&s).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_product_update_yields_one_record() {
        let backend = Arc::new(MemoryBackend::new());
        let processor = processor(backend.clone());

        let body = json!({"id": 55, "title": "Widget", "status": "active"}).to_string();
        let request = signed_request(
            "products/update",
            Some("busy-shop.myshopify.com"),
            body.as_bytes(),
        );

        for _ in 0..2 {
            let outcome = processor.process(&request).await.unwrap();
            assert!(matches!(
                outcome,
                WebhookOutcome::ProductUpserted { product_id: 55, .. }
            ));
        }

        let products = backend
            .list_products_for_shop(&shop("busy-shop"))
            .await
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "Widget");
    }

    #[tokio::test]
    async fn test_unknown_topic_is_acknowledged_noop() {
        let backend = Arc::new(MemoryBackend::new());
        let processor = processor(backend);

        let request = signed_request("orders/create", Some("shop.myshopify.com"), b"{}");
        let outcome = processor.process(&request).await.unwrap();

        match outcome {
            WebhookOutcome::Ignored { topic } => assert_eq!(topic, "orders/create"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_product_payload_acknowledged() {
        let backend = Arc::new(MemoryBackend::new());
        let processor = processor(backend.clone());

        // Valid signature over a body that is not JSON
        let request = signed_request(
            "products/update",
            Some("shop.myshopify.com"),
            b"not json at all",
        );
        let outcome = processor.process(&request).await.unwrap();
        assert!(matches!(outcome, WebhookOutcome::MalformedPayload { .. }));

        // Valid JSON without a numeric id
        let request = signed_request(
            "products/update",
            Some("shop.myshopify.com"),
            br#"{"title":"no id"}"#,
        );
        let outcome = processor.process(&request).await.unwrap();
        assert!(matches!(outcome, WebhookOutcome::MalformedPayload { .. }));

        assert!(backend
            .list_products_for_shop(&shop("shop"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_missing_shop_domain_header_acknowledged() {
        let backend = Arc::new(MemoryBackend::new());
        let processor = processor(backend);

        let request = signed_request("app/uninstalled", None, b"{}");
        let outcome = processor.process(&request).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::MissingShopDomain { .. }));
    }
}
