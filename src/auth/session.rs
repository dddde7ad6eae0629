//! OAuth session records.
//!
//! This module provides the [`Session`] type representing one authorized
//! connection to a merchant store, produced by a successful OAuth callback
//! and persisted through [`crate::storage::SessionStorage`].

use crate::config::ShopDomain;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A credential-bearing session for a merchant store.
///
/// Sessions can be either offline (app-level, non-expiring) or online
/// (user-specific, expiring). Multiple sessions may exist for one store, but
/// a session id identifies exactly one record.
///
/// The `payload` field round-trips the full platform-supplied session
/// document so fields this service does not model survive a store/load
/// cycle unchanged.
///
/// # Example
///
/// ```rust
/// use shopsync::{Session, ShopDomain};
///
/// let shop = ShopDomain::new("my-store").unwrap();
/// let session = Session::new(
///     Session::offline_id(&shop),
///     shop,
///     "access-token".to_string(),
///     Some("read_products".to_string()),
///     false,
///     None,
/// );
///
/// assert!(session.is_active());
/// assert!(!session.expired());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    pub id: String,

    /// The store this session is for.
    pub shop: ShopDomain,

    /// The access token for API authentication.
    pub access_token: String,

    /// The comma-separated OAuth scope string granted to this session.
    pub scope: Option<String>,

    /// Whether this is an online (user-specific) session.
    pub is_online: bool,

    /// When this session expires. Offline sessions have no expiry.
    pub expires: Option<DateTime<Utc>>,

    /// The full platform-supplied session document, stored verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Session {
    /// Creates a new session with the specified parameters.
    #[must_use]
    pub const fn new(
        id: String,
        shop: ShopDomain,
        access_token: String,
        scope: Option<String>,
        is_online: bool,
        expires: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            shop,
            access_token,
            scope,
            is_online,
            expires,
            payload: None,
        }
    }

    /// Attaches the full opaque session payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Returns the canonical id for a store's offline session.
    ///
    /// Offline sessions are one-per-store, so the id is derived from the
    /// store domain rather than generated.
    #[must_use]
    pub fn offline_id(shop: &ShopDomain) -> String {
        format!("offline_{}", shop.as_ref())
    }

    /// Generates an id for an online (user-specific) session.
    ///
    /// Online sessions are per-user, so the id carries a random suffix to
    /// keep concurrent users of the same store distinct.
    #[must_use]
    pub fn generate_online_id(shop: &ShopDomain) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        format!("online_{}_{}", shop.as_ref(), suffix)
    }

    /// Returns `true` if this session has expired.
    ///
    /// Sessions without an expiration time are considered never expired.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if this session is active (not expired and has an
    /// access token).
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.access_token.is_empty() && !self.expired()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn shop() -> ShopDomain {
        ShopDomain::new("test-shop").unwrap()
    }

    #[test]
    fn test_session_expired() {
        let expired = Session::new(
            "id".to_string(),
            shop(),
            "token".to_string(),
            None,
            true,
            Some(Utc::now() - Duration::hours(1)),
        );
        assert!(expired.expired());

        let valid = Session::new(
            "id".to_string(),
            shop(),
            "token".to_string(),
            None,
            true,
            Some(Utc::now() + Duration::hours(1)),
        );
        assert!(!valid.expired());

        let no_expiry = Session::new(
            "id".to_string(),
            shop(),
            "token".to_string(),
            None,
            false,
            None,
        );
        assert!(!no_expiry.expired());
    }

    #[test]
    fn test_session_is_active() {
        let active = Session::new(
            "id".to_string(),
            shop(),
            "token".to_string(),
            None,
            false,
            None,
        );
        assert!(active.is_active());

        let no_token = Session::new(
            "id".to_string(),
            shop(),
            String::new(),
            None,
            false,
            None,
        );
        assert!(!no_token.is_active());
    }

    #[test]
    fn test_offline_id_is_deterministic() {
        assert_eq!(
            Session::offline_id(&shop()),
            "offline_test-shop.myshopify.com"
        );
        assert_eq!(Session::offline_id(&shop()), Session::offline_id(&shop()));
    }

    #[test]
    fn test_online_ids_are_distinct() {
        let a = Session::generate_online_id(&shop());
        let b = Session::generate_online_id(&shop());
        assert!(a.starts_with("online_test-shop.myshopify.com_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let session = Session::new(
            "offline_test-shop.myshopify.com".to_string(),
            shop(),
            "token".to_string(),
            Some("read_products".to_string()),
            false,
            None,
        )
        .with_payload(json!({"onlineAccessInfo": {"associated_user": {"id": 42}}}));

        let encoded = serde_json::to_string(&session).unwrap();
        let decoded: Session = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.id, session.id);
        assert_eq!(decoded.shop, session.shop);
        assert_eq!(decoded.access_token, "token");
        assert_eq!(decoded.payload, session.payload);
    }

    #[test]
    fn test_session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session>();
    }
}
