//! # Domain Types
//!
//! Core domain types used throughout the catalog service.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Offer      │   │  AccessToken    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_id     │   │  token          │       │
//! │  │  name?          │   │  id (partner)   │   │  acquired_at    │       │
//! │  │  description?   │   │  price?         │   │                 │       │
//! │  │                 │   │  items_in_stock?│   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Request shapes: NewProduct, ProductChanges                            │
//! │  Partner shapes: PartnerOffer (offer as the partner sends it)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! The product UUID is the same locally and at the partner service, so
//! the id is fixed before registration and never reassigned.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier, shared with the partner service.
    pub id: Uuid,

    /// Display name.
    pub name: Option<String>,

    /// Free-form description.
    pub description: Option<String>,
}

impl Product {
    /// Builds a candidate product, generating a v4 id when none was supplied.
    pub fn from_new(new: NewProduct) -> Self {
        Product {
            id: new.id.unwrap_or_else(Uuid::new_v4),
            name: new.name,
            description: new.description,
        }
    }

    /// Returns the body sent to the partner's register endpoint.
    ///
    /// Every column is rendered as a string; absent text becomes `""`.
    ///
    /// ```text
    /// {"id": "5f0c…", "name": "Widget", "description": ""}
    /// ```
    pub fn registration_payload(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(self.id.to_string()));
        fields.insert(
            "name".to_string(),
            Value::String(self.name.clone().unwrap_or_default()),
        );
        fields.insert(
            "description".to_string(),
            Value::String(self.description.clone().unwrap_or_default()),
        );
        Value::Object(fields)
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Caller-supplied id; generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Replacement text fields of a product.
///
/// Both fields are written on update; an omitted field clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductChanges {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Offer
// =============================================================================

/// A priced, stocked listing of a product, sourced from the partner service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Offer {
    /// Identifier assigned by the partner service.
    pub id: Uuid,

    /// Price in minor currency units.
    pub price: Option<i64>,

    /// Units available.
    pub items_in_stock: Option<i64>,

    /// The product this offer belongs to.
    pub product_id: Uuid,
}

impl Offer {
    /// Checks if at least one item is available.
    pub fn is_in_stock(&self) -> bool {
        self.items_in_stock.unwrap_or(0) > 0
    }
}

/// An offer as returned by the partner's offers endpoint.
///
/// The partner omits the product id; it is implied by the request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerOffer {
    pub id: Uuid,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub items_in_stock: Option<i64>,
}

impl PartnerOffer {
    /// Attaches the offer to a local product.
    pub fn into_offer(self, product_id: Uuid) -> Offer {
        Offer {
            id: self.id,
            price: self.price,
            items_in_stock: self.items_in_stock,
            product_id,
        }
    }
}

// =============================================================================
// Access Token
// =============================================================================

/// Short-lived bearer credential for the partner service.
///
/// ## Freshness
/// ```text
///   acquired_at                        acquired_at + threshold
///        │◄──────────── fresh ───────────────►│◄──── stale ────
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The bearer token value.
    #[serde(rename = "ACCESS_TOKEN")]
    pub token: String,

    /// When the token was obtained.
    #[serde(rename = "TIME")]
    pub acquired_at: DateTime<Utc>,
}

impl AccessToken {
    /// Creates a token acquired now.
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken {
            token: token.into(),
            acquired_at: Utc::now(),
        }
    }

    /// Time elapsed since acquisition, as of `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.acquired_at
    }

    /// Checks if the token is younger than `threshold` as of `now`.
    pub fn is_fresh_at(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) < threshold
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_new_generates_id() {
        let product = Product::from_new(NewProduct {
            id: None,
            name: Some("Widget".to_string()),
            description: None,
        });
        assert!(!product.id.is_nil());
        assert_eq!(product.name.as_deref(), Some("Widget"));
    }

    #[test]
    fn test_from_new_keeps_supplied_id() {
        let id = Uuid::new_v4();
        let product = Product::from_new(NewProduct {
            id: Some(id),
            ..Default::default()
        });
        assert_eq!(product.id, id);
    }

    #[test]
    fn test_registration_payload_is_all_strings() {
        let product = Product {
            id: Uuid::new_v4(),
            name: Some("Widget".to_string()),
            description: None,
        };
        let payload = product.registration_payload();
        let fields = payload.as_object().unwrap();
        assert_eq!(fields.len(), 3);
        assert!(fields.values().all(Value::is_string));
        assert_eq!(payload["description"], "");
    }

    #[test]
    fn test_offer_in_stock() {
        let mut offer = PartnerOffer {
            id: Uuid::new_v4(),
            price: Some(1200),
            items_in_stock: Some(3),
        }
        .into_offer(Uuid::new_v4());
        assert!(offer.is_in_stock());

        offer.items_in_stock = Some(0);
        assert!(!offer.is_in_stock());

        offer.items_in_stock = None;
        assert!(!offer.is_in_stock());
    }

    #[test]
    fn test_partner_offer_tolerates_missing_fields() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"id": "{}"}}"#, id);
        let offer: PartnerOffer = serde_json::from_str(&json).unwrap();
        assert_eq!(offer.id, id);
        assert_eq!(offer.price, None);
    }

    #[test]
    fn test_token_freshness() {
        let now = Utc::now();
        let token = AccessToken {
            token: "abc".to_string(),
            acquired_at: now - Duration::minutes(4),
        };
        assert!(token.is_fresh_at(Duration::minutes(5), now));
        assert!(!token.is_fresh_at(Duration::minutes(3), now));
    }

    #[test]
    fn test_token_record_field_names() {
        let token = AccessToken::new("abc");
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["ACCESS_TOKEN"], "abc");
        assert!(json.get("TIME").is_some());
    }
}
