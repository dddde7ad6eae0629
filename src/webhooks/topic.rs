//! Webhook topic identifiers.

use std::fmt;

/// The topics this service reacts to.
///
/// Parsed from the `X-Shopify-Topic` header. Anything else is carried as
/// [`WebhookTopic::Unknown`] with the raw string preserved, so the
/// processor can acknowledge deliveries it has no handler for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookTopic {
    /// `app/uninstalled`
    AppUninstalled,
    /// `customers/data_request` (compliance)
    CustomersDataRequest,
    /// `customers/redact` (compliance)
    CustomersRedact,
    /// `shop/redact` (compliance)
    ShopRedact,
    /// `products/create`
    ProductsCreate,
    /// `products/update`
    ProductsUpdate,
    /// Any topic without a handler; the raw header value is kept.
    Unknown(String),
}

impl WebhookTopic {
    /// Parses the raw topic header value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "app/uninstalled" => Self::AppUninstalled,
            "customers/data_request" => Self::CustomersDataRequest,
            "customers/redact" => Self::CustomersRedact,
            "shop/redact" => Self::ShopRedact,
            "products/create" => Self::ProductsCreate,
            "products/update" => Self::ProductsUpdate,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The topic string as it appears on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AppUninstalled => "app/uninstalled",
            Self::CustomersDataRequest => "customers/data_request",
            Self::CustomersRedact => "customers/redact",
            Self::ShopRedact => "shop/redact",
            Self::ProductsCreate => "products/create",
            Self::ProductsUpdate => "products/update",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_topics() {
        assert_eq!(
            WebhookTopic::parse("app/uninstalled"),
            WebhookTopic::AppUninstalled
        );
        assert_eq!(
            WebhookTopic::parse("customers/data_request"),
            WebhookTopic::CustomersDataRequest
        );
        assert_eq!(
            WebhookTopic::parse("customers/redact"),
            WebhookTopic::CustomersRedact
        );
        assert_eq!(WebhookTopic::parse("shop/redact"), WebhookTopic::ShopRedact);
        assert_eq!(
            WebhookTopic::parse("products/create"),
            WebhookTopic::ProductsCreate
        );
        assert_eq!(
            WebhookTopic::parse("products/update"),
            WebhookTopic::ProductsUpdate
        );
    }

    #[test]
    fn test_parse_unknown_topic_preserves_raw_value() {
        let topic = WebhookTopic::parse("orders/fulfilled");
        assert_eq!(topic, WebhookTopic::Unknown("orders/fulfilled".to_string()));
        assert_eq!(topic.as_str(), "orders/fulfilled");
    }

    #[test]
    fn test_round_trip_through_as_str() {
        for raw in [
            "app/uninstalled",
            "customers/data_request",
            "customers/redact",
            "shop/redact",
            "products/create",
            "products/update",
            "something/else",
        ] {
            assert_eq!(WebhookTopic::parse(raw).as_str(), raw);
        }
    }
}
