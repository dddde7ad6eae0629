//! Configuration error types.
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use shopsync::{ApiSecretKey, ConfigError};
//!
//! let result = ApiSecretKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiSecretKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building or loading the service configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API secret key cannot be empty.
    #[error("API secret key cannot be empty. Please provide the app's webhook signing secret.")]
    EmptyApiSecretKey,

    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name' or 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://myapp.example.com').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A required field is missing from the builder.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// A required environment variable is not set.
    #[error("Missing required environment variable: '{name}'. Set it before starting the service.")]
    MissingEnvVar {
        /// The name of the missing variable.
        name: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_shop_domain_error_message() {
        let error = ConfigError::InvalidShopDomain {
            domain: "bad domain!".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("bad domain!"));
        assert!(message.contains("Expected format"));
    }

    #[test]
    fn test_missing_env_var_error_message() {
        let error = ConfigError::MissingEnvVar {
            name: "SHOPIFY_API_SECRET",
        };
        let message = error.to_string();
        assert!(message.contains("SHOPIFY_API_SECRET"));
        assert!(message.contains("environment variable"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyApiSecretKey;
        let _: &dyn std::error::Error = &error;
    }
}
