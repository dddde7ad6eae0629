//! Admin REST API client.

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::Session;
use crate::remote::{RemoteStoreApi, UpstreamError};

/// Library version from Cargo.toml.
const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");

/// [`RemoteStoreApi`] implementation over the platform's Admin REST API.
///
/// Requests go to `https://{shop}/admin/api/{version}/...` with the
/// session's access token in the `X-Shopify-Access-Token` header. The
/// base URI can be overridden to point at a local mock server in tests.
///
/// # Thread Safety
///
/// `AdminRestApi` is `Send + Sync`, making it safe to share across async
/// tasks.
#[derive(Debug, Clone)]
pub struct AdminRestApi {
    client: reqwest::Client,
    api_version: String,
    /// Overrides `https://{shop}` when set.
    base_uri_override: Option<String>,
}

// Verify AdminRestApi is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AdminRestApi>();
};

impl AdminRestApi {
    /// Creates a client for the given API version.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS
    /// initialization failure).
    #[must_use]
    pub fn new(api_version: impl Into<String>) -> Self {
        let user_agent = format!("shopsync v{LIB_VERSION}");
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_version: api_version.into(),
            base_uri_override: None,
        }
    }

    /// Directs all requests at `base_uri` instead of the session's shop
    /// domain. Intended for tests against a local mock server.
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri_override = Some(base_uri.into());
        self
    }

    /// Returns the API version this client addresses.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn url_for(&self, session: &Session, resource: &str) -> String {
        let base = self.base_uri_override.as_ref().map_or_else(
            || format!("https://{}", session.shop.as_ref()),
            String::clone,
        );
        format!("{base}/admin/api/{}/{resource}", self.api_version)
    }

    async fn get_json(&self, session: &Session, resource: &str) -> Result<Value, UpstreamError> {
        let url = self.url_for(session, resource);

        let response = self
            .client
            .get(&url)
            .header("X-Shopify-Access-Token", &session.access_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if !(200..300).contains(&code) {
            return Err(UpstreamError::Response {
                code,
                message: body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|err| UpstreamError::UnexpectedShape(format!("invalid JSON body: {err}")))
    }
}

#[async_trait]
impl RemoteStoreApi for AdminRestApi {
    async fn fetch_shop_metadata(&self, session: &Session) -> Result<Value, UpstreamError> {
        let body = self.get_json(session, "shop.json").await?;
        body.get("shop").cloned().ok_or_else(|| {
            UpstreamError::UnexpectedShape("response has no 'shop' object".to_string())
        })
    }

    async fn fetch_product_list(&self, session: &Session) -> Result<Vec<Value>, UpstreamError> {
        let body = self.get_json(session, "products.json").await?;
        match body.get("products").and_then(Value::as_array) {
            Some(products) => Ok(products.clone()),
            None => Err(UpstreamError::UnexpectedShape(
                "response has no 'products' array".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShopDomain;

    fn test_session() -> Session {
        Session::new(
            "test-session".to_string(),
            ShopDomain::new("test-shop").unwrap(),
            "test-access-token".to_string(),
            None,
            false,
            None,
        )
    }

    #[test]
    fn test_url_defaults_to_shop_domain() {
        let api = AdminRestApi::new("2024-04");
        let url = api.url_for(&test_session(), "shop.json");
        assert_eq!(
            url,
            "https://test-shop.myshopify.com/admin/api/2024-04/shop.json"
        );
    }

    #[test]
    fn test_url_uses_base_uri_override() {
        let api = AdminRestApi::new("2024-04").with_base_uri("http://127.0.0.1:9999");
        let url = api.url_for(&test_session(), "products.json");
        assert_eq!(url, "http://127.0.0.1:9999/admin/api/2024-04/products.json");
    }

    #[test]
    fn test_api_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AdminRestApi>();
    }
}
