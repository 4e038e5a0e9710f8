//! Stripe object fixtures for tests.
//!
//! Each fixture fills every field with a plausible random value so tests only
//! set what they assert on.

use crate::billing::types::{
    Coupon, Expandable, List, Metadata, Plan, Price, Product, PromotionCode, Subscription,
    SubscriptionItem, SubscriptionStatus, price_metadata, product_metadata,
};
use uuid::Uuid;

/// Helper functions for generating fake test data
pub mod fake {
    use super::*;

    /// Generate a Stripe-style id such as `price_3Nf8...`
    pub fn stripe_id(prefix: &str) -> String {
        let suffix: String = (0..24).map(|_| fastrand::alphanumeric()).collect();
        format!("{}_{}", prefix, suffix)
    }

    /// Generate an account uid (32 lowercase hex characters)
    pub fn uid() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a fake email address
    pub fn email() -> String {
        format!("test-{}@example.com", Uuid::new_v4().simple())
    }

    /// Generate a customer-facing promotion code string
    pub fn promotion_code() -> String {
        (0..8).map(|_| fastrand::uppercase()).collect()
    }
}

/// Builder for a Stripe `Product`.
#[derive(Debug, Default)]
pub struct ProductFixture {
    id: Option<String>,
    metadata: Metadata,
}

impl ProductFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the product-level promotion code allow-list.
    pub fn promotion_codes(mut self, codes: impl Into<String>) -> Self {
        self.metadata
            .insert(product_metadata::PROMOTION_CODES.to_string(), codes.into());
        self
    }

    pub fn build(self) -> Product {
        Product {
            id: self.id.unwrap_or_else(|| fake::stripe_id("prod")),
            name: Some("Test Product".to_string()),
            metadata: self.metadata,
        }
    }
}

/// Builder for a Stripe `Price`.
#[derive(Debug, Default)]
pub struct PriceFixture {
    id: Option<String>,
    product: Option<String>,
    metadata: Metadata,
}

impl PriceFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn product(mut self, product_id: impl Into<String>) -> Self {
        self.product = Some(product_id.into());
        self
    }

    /// Set the price-level promotion code allow-list.
    pub fn promotion_codes(mut self, codes: impl Into<String>) -> Self {
        self.metadata
            .insert(price_metadata::PROMOTION_CODES.to_string(), codes.into());
        self
    }

    pub fn build(self) -> Price {
        Price {
            id: self.id.unwrap_or_else(|| fake::stripe_id("price")),
            product: Expandable::Id(self.product.unwrap_or_else(|| fake::stripe_id("prod"))),
            currency: Some("usd".to_string()),
            unit_amount: Some(fastrand::i64(100..10_000)),
            metadata: self.metadata,
        }
    }
}

/// Builder for a legacy Stripe `Plan`.
#[derive(Debug, Default)]
pub struct PlanFixture {
    id: Option<String>,
    product: Option<String>,
}

impl PlanFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn product(mut self, product_id: impl Into<String>) -> Self {
        self.product = Some(product_id.into());
        self
    }

    pub fn build(self) -> Plan {
        Plan {
            id: self.id.unwrap_or_else(|| fake::stripe_id("plan")),
            product: Expandable::Id(self.product.unwrap_or_else(|| fake::stripe_id("prod"))),
            nickname: None,
            metadata: Metadata::new(),
        }
    }
}

/// Builder for a Stripe `PromotionCode` and its coupon.
///
/// Defaults to an active code with a valid coupon and no expiry.
#[derive(Debug)]
pub struct PromotionCodeFixture {
    id: Option<String>,
    code: Option<String>,
    active: bool,
    expires_at: Option<i64>,
    coupon_valid: bool,
}

impl Default for PromotionCodeFixture {
    fn default() -> Self {
        Self {
            id: None,
            code: None,
            active: true,
            expires_at: None,
            coupon_valid: true,
        }
    }
}

impl PromotionCodeFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn coupon_valid(mut self, valid: bool) -> Self {
        self.coupon_valid = valid;
        self
    }

    pub fn build(self) -> PromotionCode {
        PromotionCode {
            id: self.id.unwrap_or_else(|| fake::stripe_id("promo")),
            code: self.code.unwrap_or_else(fake::promotion_code),
            active: self.active,
            expires_at: self.expires_at,
            coupon: Coupon {
                id: fake::stripe_id("co"),
                valid: self.coupon_valid,
                percent_off: Some(10.0),
                amount_off: None,
            },
        }
    }
}

/// Builder for a Stripe `SubscriptionItem`.
#[derive(Debug, Default)]
pub struct SubscriptionItemFixture {
    price: Option<Price>,
    plan: Option<Plan>,
}

impl SubscriptionItemFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    pub fn plan(mut self, plan: Plan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn build(self) -> SubscriptionItem {
        SubscriptionItem {
            id: fake::stripe_id("si"),
            price: self.price.unwrap_or_else(|| PriceFixture::new().build()),
            plan: self.plan,
        }
    }
}

/// Builder for a Stripe `Subscription`. Starts with no items.
#[derive(Debug)]
pub struct SubscriptionFixture {
    id: Option<String>,
    customer: Option<String>,
    status: SubscriptionStatus,
    items: Vec<SubscriptionItem>,
}

impl Default for SubscriptionFixture {
    fn default() -> Self {
        Self {
            id: None,
            customer: None,
            status: SubscriptionStatus::Active,
            items: Vec::new(),
        }
    }
}

impl SubscriptionFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer = Some(customer_id.into());
        self
    }

    pub fn status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn item(mut self, item: SubscriptionItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn build(self) -> Subscription {
        let id = self.id.unwrap_or_else(|| fake::stripe_id("sub"));
        let mut items = List::new(self.items);
        items.url = format!("/v1/subscription_items?subscription={}", id);

        Subscription {
            id,
            customer: self.customer.unwrap_or_else(|| fake::stripe_id("cus")),
            status: self.status,
            items,
            metadata: Metadata::new(),
        }
    }
}
