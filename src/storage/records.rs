//! Persisted record shapes for the four collections.
//!
//! These are the documents the storage traits read and write: store
//! registrations, mirrored products, OAuth callback audit entries, and
//! compliance requests. Opaque platform payloads (full shop objects, full
//! product objects) are kept as raw [`Value`]s rather than strongly typed —
//! their shape belongs to the platform, not to this service.

use crate::auth::Session;
use crate::config::ShopDomain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Sessions
// ============================================================================

/// The persisted form of a [`Session`].
///
/// Both the structured fields (for querying) and the full opaque payload
/// (for faithful round-tripping) are stored. Legacy documents written before
/// the payload field existed carry only the structured fields, so
/// [`SessionDocument::into_session`] reconstructs from those when the
/// payload is absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionDocument {
    pub id: String,
    pub shop: ShopDomain,
    pub is_online: bool,
    pub scope: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub access_token: String,
    /// The complete session object, stored verbatim.
    pub session_data: Option<Value>,
}

impl SessionDocument {
    /// Builds the persisted document from a session, capturing the full
    /// session as the opaque payload alongside the structured fields.
    ///
    /// # Errors
    ///
    /// Returns an encoding error if the session cannot be serialized.
    pub fn from_session(session: &Session) -> Result<Self, serde_json::Error> {
        let session_data = serde_json::to_value(session)?;
        Ok(Self {
            id: session.id.clone(),
            shop: session.shop.clone(),
            is_online: session.is_online,
            scope: session.scope.clone(),
            expires: session.expires,
            access_token: session.access_token.clone(),
            session_data: Some(session_data),
        })
    }

    /// Reconstructs the session this document was written from.
    ///
    /// Prefers the full opaque payload when present; legacy documents
    /// without one are rebuilt from the structured fields. Fields missing
    /// from the payload (id, shop, access token) are patched from the
    /// structured columns so a partially written payload still yields a
    /// usable session.
    #[must_use]
    pub fn into_session(self) -> Session {
        if let Some(data) = self.session_data.clone() {
            if let Ok(mut session) = serde_json::from_value::<Session>(data) {
                if session.id.is_empty() {
                    session.id = self.id;
                }
                if session.access_token.is_empty() && !self.access_token.is_empty() {
                    session.access_token = self.access_token;
                }
                return session;
            }
        }

        // Legacy document: rebuild from structured fields
        Session::new(
            self.id,
            self.shop,
            self.access_token,
            self.scope,
            self.is_online,
            self.expires,
        )
    }
}

// ============================================================================
// Stores
// ============================================================================

/// One merchant installation, keyed by store domain.
///
/// At most one record exists per store: re-installation upserts the
/// existing record rather than inserting a duplicate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Unique store identifier (the full myshopify domain).
    pub shop: ShopDomain,
    /// The store's public-facing domain, as reported by the platform.
    pub shop_domain: String,
    /// Access token for the store. Never exposed through [`StoreSummary`].
    pub access_token: String,
    /// Comma-separated granted scope string.
    pub scope: Option<String>,
    /// The complete shop object from the platform, stored verbatim.
    pub shop_data: Option<Value>,
    /// Whether the app is currently installed on this store.
    pub is_active: bool,
    pub installed_at: DateTime<Utc>,
    pub last_access_at: DateTime<Utc>,
    /// Set when an uninstall webhook arrives; cleared on re-install.
    pub uninstalled_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::storage::StoreRegistry::upsert_store`].
///
/// Carries the fields a (re)installation writes; timestamps and the active
/// flag are managed by the registry itself.
#[derive(Clone, Debug)]
pub struct NewStore {
    pub shop: ShopDomain,
    pub shop_domain: String,
    pub access_token: String,
    pub scope: Option<String>,
    pub shop_data: Option<Value>,
}

impl NewStore {
    /// Builds an upsert input from a session, the way the OAuth callback
    /// flow does: the session's shop doubles as the domain until shop
    /// metadata says otherwise.
    #[must_use]
    pub fn from_session(session: &Session, shop_data: Option<Value>) -> Self {
        Self {
            shop: session.shop.clone(),
            shop_domain: session.shop.as_ref().to_string(),
            access_token: session.access_token.clone(),
            scope: session.scope.clone(),
            shop_data,
        }
    }
}

/// A store record with the access token projected away.
///
/// This is the only shape read paths hand to untrusted callers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreSummary {
    pub shop: ShopDomain,
    pub shop_domain: String,
    pub scope: Option<String>,
    pub shop_data: Option<Value>,
    pub is_active: bool,
    pub installed_at: DateTime<Utc>,
    pub last_access_at: DateTime<Utc>,
    pub uninstalled_at: Option<DateTime<Utc>>,
}

impl From<StoreRecord> for StoreSummary {
    fn from(record: StoreRecord) -> Self {
        Self {
            shop: record.shop,
            shop_domain: record.shop_domain,
            scope: record.scope,
            shop_data: record.shop_data,
            is_active: record.is_active,
            installed_at: record.installed_at,
            last_access_at: record.last_access_at,
            uninstalled_at: record.uninstalled_at,
        }
    }
}

// ============================================================================
// Products
// ============================================================================

/// Lifecycle status of a mirrored product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Archived,
    Draft,
}

impl ProductStatus {
    /// Parses the status string from a product payload, defaulting to
    /// `Active` for anything unrecognized or absent (the platform default).
    #[must_use]
    pub fn parse_or_default(status: Option<&str>) -> Self {
        match status {
            Some("archived") => Self::Archived,
            Some("draft") => Self::Draft,
            _ => Self::Active,
        }
    }
}

/// A locally mirrored copy of one remote product.
///
/// Unique per `(shop, product_id)`; sync always upserts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductRecord {
    pub shop: ShopDomain,
    /// The platform's product id, unique within a store.
    pub product_id: i64,
    pub title: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub handle: Option<String>,
    pub status: ProductStatus,
    /// The complete product object (variants, images, options, ...).
    pub product_data: Value,
    pub synced_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Maps a raw product payload into a mirror record.
    ///
    /// Returns `None` when the payload has no numeric `id` — there is
    /// nothing to key the upsert on.
    #[must_use]
    pub fn from_payload(shop: &ShopDomain, payload: &Value) -> Option<Self> {
        let product_id = payload.get("id")?.as_i64()?;
        let string_field = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .map(ToString::to_string)
        };

        Some(Self {
            shop: shop.clone(),
            product_id,
            title: string_field("title").unwrap_or_default(),
            vendor: string_field("vendor"),
            product_type: string_field("product_type"),
            handle: string_field("handle"),
            status: ProductStatus::parse_or_default(
                payload.get("status").and_then(Value::as_str),
            ),
            product_data: payload.clone(),
            synced_at: Utc::now(),
        })
    }
}

/// Per-store product counts, broken down by status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProductStats {
    pub total: u64,
    pub active: u64,
    pub archived: u64,
    pub draft: u64,
}

// ============================================================================
// OAuth callback audit log
// ============================================================================

/// One OAuth callback attempt, successful or not.
///
/// Append-only: the only permitted mutation is attaching the outcome once
/// the flow finishes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallbackRecord {
    /// Opaque handle identifying this record for outcome attachment.
    pub handle: String,
    pub shop: ShopDomain,
    pub code: String,
    pub state: String,
    pub hmac: Option<String>,
    pub host: Option<String>,
    pub timestamp: Option<String>,
    /// The full raw callback payload (query, headers, cookies).
    pub callback_data: Value,
    /// Set after a successful flow.
    pub session_id: Option<String>,
    /// `None` until the outcome is attached.
    pub success: Option<bool>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input to [`crate::storage::CallbackRecorder::record_callback`].
#[derive(Clone, Debug)]
pub struct NewCallback {
    pub shop: ShopDomain,
    pub code: String,
    pub state: String,
    pub hmac: Option<String>,
    pub host: Option<String>,
    pub timestamp: Option<String>,
    pub callback_data: Value,
}

/// Outcome attached to a callback record after the flow completes.
#[derive(Clone, Debug)]
pub struct CallbackOutcome {
    pub session_id: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

impl CallbackOutcome {
    /// A successful outcome linked to the stored session.
    #[must_use]
    pub fn succeeded(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            success: true,
            error: None,
        }
    }

    /// A failed outcome carrying the error text.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            session_id: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// Compliance requests
// ============================================================================

/// The kind of compliance request a webhook delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceKind {
    /// `customers/data_request`: the customer asked for their data.
    DataRequest,
    /// `customers/redact`: the customer asked for erasure.
    CustomerRedact,
}

/// A durably recorded compliance request awaiting external fulfillment.
///
/// The service does not fulfill these itself; persisting them is what makes
/// the external process able to meet the compliance window.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComplianceRequest {
    pub shop: ShopDomain,
    pub kind: ComplianceKind,
    pub customer_id: Option<i64>,
    pub customer_email: Option<String>,
    /// The full webhook payload, kept for fulfillment.
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}
