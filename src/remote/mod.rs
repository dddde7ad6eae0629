//! Upstream platform API access.
//!
//! The [`RemoteStoreApi`] trait is the seam between orchestration code and
//! the platform's Admin REST API: the OAuth callback flow fetches shop
//! metadata through it, and product sync fetches the product list. The
//! production implementation is [`AdminRestApi`]; tests substitute their
//! own implementations to exercise failure paths without a network.

mod admin_rest;

pub use admin_rest::AdminRestApi;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::auth::Session;

/// Errors from upstream API calls.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request never produced a response.
    #[error("Upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The platform answered with a non-2xx status.
    #[error("Upstream responded with status {code}: {message}")]
    Response { code: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected upstream response shape: {0}")]
    UnexpectedShape(String),
}

/// Read access to the platform on behalf of an authenticated session.
#[async_trait]
pub trait RemoteStoreApi: Send + Sync {
    /// Fetches the shop metadata object for the session's store.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the request fails or the response
    /// has no `shop` object.
    async fn fetch_shop_metadata(&self, session: &Session) -> Result<Value, UpstreamError>;

    /// Fetches the store's product list as raw product payloads.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the request fails or the response
    /// has no `products` array.
    async fn fetch_product_list(&self, session: &Session) -> Result<Vec<Value>, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_display() {
        let err = UpstreamError::Response {
            code: 401,
            message: "Invalid API key or access token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Upstream responded with status 401: Invalid API key or access token"
        );

        let err = UpstreamError::UnexpectedShape("missing 'shop' object".to_string());
        assert!(err.to_string().contains("missing 'shop' object"));
    }
}
