//! Service configuration.
//!
//! The main types in this module are:
//!
//! - [`SyncConfig`]: The configuration struct holding credentials and settings
//! - [`SyncConfigBuilder`]: A builder for constructing [`SyncConfig`] instances
//! - [`ApiSecretKey`]: A validated secret key newtype with masked debug output
//! - [`ShopDomain`]: A validated merchant store domain
//! - [`HostUrl`]: A validated application host URL
//!
//! # Example
//!
//! ```rust
//! use shopsync::{SyncConfig, ApiSecretKey};
//!
//! let config = SyncConfig::builder()
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .scopes("read_products,write_products")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.scopes(), Some("read_products,write_products"));
//! ```

mod newtypes;

pub use newtypes::{ApiSecretKey, HostUrl, ShopDomain};

use crate::error::ConfigError;

/// Default Admin API version, matching what the service was built against.
pub const DEFAULT_API_VERSION: &str = "2024-04";

/// Configuration for the sync service.
///
/// Holds the webhook signing secret, optional app credentials, and the host
/// URL the app is reachable at. The secret key is the single input to
/// webhook signature verification; everything else is plumbing for the OAuth
/// callback flow and the remote store API.
///
/// # Key Rotation
///
/// The `old_api_secret_key` field supports seamless key rotation. When
/// verifying webhook signatures, the primary key is tried first, then the
/// old key if configured, so in-flight deliveries keep verifying while a
/// rotation propagates.
///
/// # Thread Safety
///
/// `SyncConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    api_key: Option<String>,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<String>,
    host: Option<HostUrl>,
    api_version: String,
}

impl SyncConfig {
    /// Creates a new builder for constructing a `SyncConfig`.
    #[must_use]
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::new()
    }

    /// Loads the configuration from the environment.
    ///
    /// Reads `SHOPIFY_API_SECRET` (required), `SHOPIFY_API_KEY`,
    /// `SHOPIFY_APP_URL`, `SHOPIFY_SCOPES`, and `SHOPIFY_API_VERSION`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `SHOPIFY_API_SECRET` is
    /// unset, or [`ConfigError::InvalidHostUrl`] if `SHOPIFY_APP_URL` does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("SHOPIFY_API_SECRET").map_err(|_| ConfigError::MissingEnvVar {
            name: "SHOPIFY_API_SECRET",
        })?;

        let mut builder = Self::builder().api_secret_key(ApiSecretKey::new(secret)?);

        if let Ok(key) = std::env::var("SHOPIFY_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Ok(url) = std::env::var("SHOPIFY_APP_URL") {
            builder = builder.host(HostUrl::new(url)?);
        }
        if let Ok(scopes) = std::env::var("SHOPIFY_SCOPES") {
            builder = builder.scopes(scopes);
        }
        if let Ok(version) = std::env::var("SHOPIFY_API_VERSION") {
            builder = builder.api_version(version);
        }

        builder.build()
    }

    /// Returns the API key, if configured.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the old API secret key, if configured.
    ///
    /// This is used during key rotation to verify webhook signatures
    /// created with the previous secret key.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the comma-separated OAuth scope string, if configured.
    #[must_use]
    pub fn scopes(&self) -> Option<&str> {
        self.scopes.as_deref()
    }

    /// Returns the host URL, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }

    /// Returns the Admin API version string.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

// Verify SyncConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SyncConfig>();
};

/// Builder for constructing [`SyncConfig`] instances.
///
/// The only required field is `api_secret_key`; everything else has a
/// sensible default.
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    api_key: Option<String>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<String>,
    host: Option<HostUrl>,
    api_version: Option<String>,
}

impl SyncConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the old API secret key for key rotation support.
    ///
    /// When verifying webhook signatures, the primary secret key is tried
    /// first, then this one if verification fails.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the comma-separated OAuth scope string.
    #[must_use]
    pub fn scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = Some(scopes.into());
        self
    }

    /// Sets the host URL.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the Admin API version.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Builds the [`SyncConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_secret_key` is
    /// not set.
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;

        Ok(SyncConfig {
            api_key: self.api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes: self.scopes,
            host: self.host,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_api_secret_key() {
        let result = SyncConfigBuilder::new().api_key("key").build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "api_secret_key"
            })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = SyncConfig::builder()
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .build()
            .unwrap();

        assert_eq!(config.api_version(), DEFAULT_API_VERSION);
        assert!(config.api_key().is_none());
        assert!(config.scopes().is_none());
        assert!(config.host().is_none());
        assert!(config.old_api_secret_key().is_none());
    }

    #[test]
    fn test_builder_with_all_optional_fields() {
        let host = HostUrl::new("https://myapp.example.com").unwrap();

        let config = SyncConfig::builder()
            .api_key("key")
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .old_api_secret_key(ApiSecretKey::new("old-secret").unwrap())
            .scopes("read_products,write_products")
            .host(host.clone())
            .api_version("2024-07")
            .build()
            .unwrap();

        assert_eq!(config.api_key(), Some("key"));
        assert_eq!(config.scopes(), Some("read_products,write_products"));
        assert_eq!(config.host(), Some(&host));
        assert_eq!(config.api_version(), "2024-07");
        assert_eq!(config.old_api_secret_key().unwrap().as_ref(), "old-secret");
    }

    #[test]
    fn test_config_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncConfig>();
    }
}
