//! Testing utilities for services built on fxa-shared
//!
//! Provides Stripe object fixtures for exercising the billing rules, and
//! re-exports the in-memory test doubles of the billing client and the account
//! token store.
//!
//! # Example
//!
//! ```rust,ignore
//! use fxa_shared::testing::{PriceFixture, PromotionCodeFixture};
//!
//! let price = PriceFixture::new().promotion_codes("promo_1,promo_2").build();
//! let code = PromotionCodeFixture::new().id("promo_1").build();
//! ```

#[cfg(any(test, feature = "test-billing"))]
pub mod fixtures;

#[cfg(any(test, feature = "test-billing"))]
pub use fixtures::{
    PlanFixture, PriceFixture, ProductFixture, PromotionCodeFixture, SubscriptionFixture,
    SubscriptionItemFixture, fake,
};

#[cfg(any(test, feature = "test-accounts"))]
pub use crate::accounts::activity::test::InMemoryTokenStore;
#[cfg(any(test, feature = "test-billing"))]
pub use crate::billing::promotion_manager::test::MockStripePromotionClient;
