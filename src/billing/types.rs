//! Stripe object model used by the billing rules.
//!
//! These are read-only snapshots of the objects the billing provider returns.
//! Only the fields the rules read are modeled; everything else in Stripe's
//! JSON is ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stripe metadata: free-form string key/value pairs.
pub type Metadata = HashMap<String, String>;

/// Metadata keys read from Stripe prices.
pub mod price_metadata {
    /// Comma-separated promotion code ids eligible for the price.
    pub const PROMOTION_CODES: &str = "promotionCodes";
}

/// Metadata keys read from Stripe products.
pub mod product_metadata {
    /// Comma-separated promotion code ids eligible for every price of the product.
    pub const PROMOTION_CODES: &str = "promotionCodes";
}

/// A Stripe object with an identifier.
pub trait StripeObject {
    /// The object's Stripe id (`price_...`, `prod_...`).
    fn id(&self) -> &str;
}

/// A reference Stripe may return either as a bare id or as the expanded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T: StripeObject> Expandable<T> {
    /// The referenced object's id, whether or not it was expanded.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(obj) => obj.id(),
        }
    }

    /// The expanded object, if Stripe returned one.
    #[must_use]
    pub fn as_object(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Object(obj) => Some(obj),
        }
    }
}

impl<T> From<&str> for Expandable<T> {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

/// A Stripe list envelope (`{"object": "list", "data": [...]}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub url: String,
}

impl<T> List<T> {
    /// Wrap items in a list envelope with no further pages.
    #[must_use]
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            has_more: false,
            url: String::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// A Stripe product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl StripeObject for Product {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A Stripe price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    pub product: Expandable<Product>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl StripeObject for Price {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A legacy Stripe plan. Carried on subscription items alongside the price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub product: Expandable<Product>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl StripeObject for Plan {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A Stripe coupon: the discount a promotion code grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub valid: bool,
    #[serde(default)]
    pub percent_off: Option<f64>,
    #[serde(default)]
    pub amount_off: Option<i64>,
}

/// A Stripe promotion code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionCode {
    pub id: String,
    /// Customer-facing code string.
    pub code: String,
    pub active: bool,
    /// Expiration as Unix timestamp (seconds).
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub coupon: Coupon,
}

impl StripeObject for PromotionCode {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Stripe subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Paused,
}

impl SubscriptionStatus {
    /// Check if the subscription grants access and accepts changes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }

    /// Convert to Stripe API string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Paused => "paused",
        }
    }
}

/// A line item binding a subscription to a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionItem {
    pub id: String,
    pub price: Price,
    #[serde(default)]
    pub plan: Option<Plan>,
}

/// A Stripe subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    /// Stripe customer id.
    pub customer: String,
    pub status: SubscriptionStatus,
    pub items: List<SubscriptionItem>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl StripeObject for Subscription {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_subscription_from_stripe_json() {
        let json = serde_json::json!({
            "id": "sub_123",
            "object": "subscription",
            "customer": "cus_123",
            "status": "trialing",
            "items": {
                "object": "list",
                "data": [{
                    "id": "si_123",
                    "object": "subscription_item",
                    "price": {
                        "id": "price_123",
                        "object": "price",
                        "product": "prod_123",
                        "currency": "usd",
                        "unit_amount": 999,
                        "metadata": { "promotionCodes": "promo1,promo2" }
                    },
                    "plan": {
                        "id": "price_123",
                        "object": "plan",
                        "product": { "id": "prod_123", "object": "product", "metadata": {} }
                    }
                }],
                "has_more": false,
                "url": "/v1/subscription_items?subscription=sub_123"
            }
        });

        let sub: Subscription = serde_json::from_value(json).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Trialing);
        assert!(sub.status.is_active());
        assert_eq!(sub.items.len(), 1);

        let item = &sub.items.data[0];
        assert_eq!(item.price.product.id(), "prod_123");
        assert!(item.price.product.as_object().is_none());
        assert_eq!(
            item.price.metadata.get(price_metadata::PROMOTION_CODES).map(String::as_str),
            Some("promo1,promo2")
        );

        let plan = item.plan.as_ref().unwrap();
        assert_eq!(plan.product.id(), "prod_123");
        assert!(plan.product.as_object().is_some());
    }

    #[test]
    fn test_deserialize_promotion_code_without_expiry() {
        let json = serde_json::json!({
            "id": "promo_123",
            "code": "SPRING",
            "active": true,
            "expires_at": null,
            "coupon": { "id": "co_123", "valid": true, "percent_off": 10.0 }
        });

        let code: PromotionCode = serde_json::from_value(json).unwrap();
        assert_eq!(code.expires_at, None);
        assert_eq!(code.coupon.percent_off, Some(10.0));
    }

    #[test]
    fn test_subscription_status_strings() {
        assert_eq!(SubscriptionStatus::PastDue.as_str(), "past_due");
        assert!(!SubscriptionStatus::PastDue.is_active());
        let status: SubscriptionStatus = serde_json::from_str("\"incomplete_expired\"").unwrap();
        assert_eq!(status, SubscriptionStatus::IncompleteExpired);
    }
}
