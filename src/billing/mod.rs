//! Billing rules for Stripe-based subscriptions.
//!
//! Decides whether promotion codes can be redeemed and on which
//! subscriptions, and reads prices, plans and products out of subscriptions.
//! The rules are pure functions over Stripe objects fetched elsewhere;
//! [`PromotionCodeManager`] composes them over a [`StripePromotionClient`].
//!
//! # Features
//!
//! - `test-billing` - Exposes Stripe fixtures and a mock client
//!
//! # Example
//!
//! ```rust,ignore
//! use fxa_shared::billing::{
//!     check_subscription_promotion_codes, check_valid_promotion_code, get_subscribed_price,
//! };
//!
//! let price = get_subscribed_price(&subscription)?;
//! check_valid_promotion_code(Some(&promotion_code))?;
//! check_subscription_promotion_codes(&promotion_code.code, price, Some(&product))?;
//! ```

pub mod error;
pub mod promotion;
pub mod promotion_manager;
pub mod subscription;
pub mod types;

// Error exports
pub use error::BillingError;

// Rule exports
pub use promotion::{
    check_subscription_promotion_codes, check_valid_promotion_code, check_valid_promotion_code_at,
};
pub use subscription::{
    get_subscribed_plans, get_subscribed_price, get_subscribed_product_ids,
    is_subscribed_to_product,
};

// Manager exports
pub use promotion_manager::{PromotionCodeManager, StripePromotionClient};

// Stripe object exports
pub use types::{
    Coupon, Expandable, List, Metadata, Plan, Price, Product, PromotionCode, StripeObject,
    Subscription, SubscriptionItem, SubscriptionStatus, price_metadata, product_metadata,
};

// Test exports
#[cfg(any(test, feature = "test-billing"))]
pub use promotion_manager::test::MockStripePromotionClient;
