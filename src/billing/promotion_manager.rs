//! Applying promotion codes to subscriptions.
//!
//! Composes the promotion code and subscription rules over a Stripe client:
//! fetch what the rules need, run them in order, and only then ask Stripe to
//! attach the code.

use super::error::BillingError;
use super::promotion::{check_subscription_promotion_codes, check_valid_promotion_code};
use super::subscription::get_subscribed_price;
use super::types::{Price, Product, PromotionCode, Subscription};
use crate::error::Result;

/// Trait for the Stripe operations promotion code handling needs.
///
/// This abstraction allows testing without real Stripe calls and supports
/// different Stripe client implementations.
#[allow(async_fn_in_trait)]
pub trait StripePromotionClient: Send + Sync {
    /// Retrieve a subscription with its items expanded.
    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<Subscription>;

    /// Retrieve a price.
    async fn retrieve_price(&self, price_id: &str) -> Result<Price>;

    /// Retrieve a product.
    async fn retrieve_product(&self, product_id: &str) -> Result<Product>;

    /// Retrieve a promotion code by id. `None` if Stripe has no such code.
    async fn retrieve_promotion_code(
        &self,
        promotion_code_id: &str,
    ) -> Result<Option<PromotionCode>>;

    /// Find an active promotion code by its customer-facing code string.
    async fn find_promotion_code_by_code(&self, code: &str) -> Result<Option<PromotionCode>>;

    /// Attach a promotion code to a subscription, returning the updated subscription.
    async fn apply_promotion_code(
        &self,
        subscription_id: &str,
        promotion_code_id: &str,
    ) -> Result<Subscription>;
}

/// Promotion code operations.
pub struct PromotionCodeManager<C: StripePromotionClient> {
    client: C,
}

impl<C: StripePromotionClient> PromotionCodeManager<C> {
    /// Create a new promotion code manager.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Apply a promotion code to a customer's subscription.
    ///
    /// # Errors
    ///
    /// - `PromotionCodeCustomerSubscriptionMismatch` if the subscription belongs
    ///   to another customer
    /// - `SubscriptionNotActive` if the subscription is not active or trialing
    /// - `PromotionCodeInvalid` if the code is missing, inactive, or expired
    /// - `SubscriptionPriceUnknown` if the subscription has no single price
    /// - `PromotionCodeNotForSubscription` if the price/product do not allow the code
    pub async fn apply_promo_code_to_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
        promotion_code_id: &str,
    ) -> Result<Subscription> {
        let subscription = self.client.retrieve_subscription(subscription_id).await?;

        if subscription.customer != customer_id {
            tracing::warn!(
                target: "billing.promotion_code.customer_mismatch",
                customer_id,
                subscription_id,
                "Promotion code applied to another customer's subscription"
            );
            return Err(BillingError::PromotionCodeCustomerSubscriptionMismatch {
                customer_id: customer_id.to_string(),
                subscription_id: subscription_id.to_string(),
            }
            .into());
        }

        if !subscription.status.is_active() {
            return Err(BillingError::SubscriptionNotActive {
                subscription_id: subscription_id.to_string(),
                status: subscription.status.as_str().to_string(),
            }
            .into());
        }

        let promotion_code = self.client.retrieve_promotion_code(promotion_code_id).await?;
        check_valid_promotion_code(promotion_code.as_ref())?;
        let code = promotion_code.map(|p| p.code).unwrap_or_default();

        // Metadata lists the customer-facing code, not the Stripe id
        let price = get_subscribed_price(&subscription)?;
        let product = self.product_for(price).await?;
        check_subscription_promotion_codes(&code, price, Some(&product))?;

        let updated = self
            .client
            .apply_promotion_code(subscription_id, promotion_code_id)
            .await?;

        tracing::info!(
            target: "billing.promotion_code.applied",
            customer_id,
            subscription_id,
            promotion_code_id,
            price_id = %price.id,
            "Promotion code applied to subscription"
        );

        Ok(updated)
    }

    /// Look up a customer-facing promotion code and check it can be used for a price.
    ///
    /// # Errors
    ///
    /// - `PromotionCodeNotFound` if no promotion code has that code string
    /// - `PromotionCodeInvalid` if the code cannot be redeemed now
    /// - `PromotionCodeNotForSubscription` if the price/product do not allow it
    pub async fn retrieve_promotion_code_for_price(
        &self,
        code: &str,
        price_id: &str,
    ) -> Result<PromotionCode> {
        let promotion_code = self
            .client
            .find_promotion_code_by_code(code)
            .await?
            .ok_or_else(|| BillingError::PromotionCodeNotFound {
                code: code.to_string(),
            })?;

        check_valid_promotion_code(Some(&promotion_code))?;

        let price = self.client.retrieve_price(price_id).await?;
        let product = self.product_for(&price).await?;
        check_subscription_promotion_codes(&promotion_code.code, &price, Some(&product))?;

        Ok(promotion_code)
    }

    /// Use the expanded product when Stripe returned one, otherwise fetch it.
    async fn product_for(&self, price: &Price) -> Result<Product> {
        match price.product.as_object() {
            Some(product) => Ok(product.clone()),
            None => self.client.retrieve_product(price.product.id()).await,
        }
    }
}

/// Mock Stripe promotion client for testing.
#[cfg(any(test, feature = "test-billing"))]
pub mod test {
    use super::*;
    use crate::error::FxaError;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock Stripe promotion client backed by in-memory maps.
    #[derive(Default)]
    pub struct MockStripePromotionClient {
        subscriptions: RwLock<HashMap<String, Subscription>>,
        prices: RwLock<HashMap<String, Price>>,
        products: RwLock<HashMap<String, Product>>,
        promotion_codes: RwLock<HashMap<String, PromotionCode>>,
        applied: RwLock<Vec<(String, String)>>,
        product_fetches: AtomicUsize,
    }

    impl MockStripePromotionClient {
        /// Create a new mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_subscription(&self, subscription: Subscription) {
            self.subscriptions
                .write()
                .unwrap()
                .insert(subscription.id.clone(), subscription);
        }

        pub fn add_price(&self, price: Price) {
            self.prices.write().unwrap().insert(price.id.clone(), price);
        }

        pub fn add_product(&self, product: Product) {
            self.products.write().unwrap().insert(product.id.clone(), product);
        }

        pub fn add_promotion_code(&self, promotion_code: PromotionCode) {
            self.promotion_codes
                .write()
                .unwrap()
                .insert(promotion_code.id.clone(), promotion_code);
        }

        /// `(subscription_id, promotion_code_id)` pairs applied so far.
        pub fn applied(&self) -> Vec<(String, String)> {
            self.applied.read().unwrap().clone()
        }

        /// Number of product lookups made against the mock.
        pub fn product_fetches(&self) -> usize {
            self.product_fetches.load(Ordering::SeqCst)
        }

        fn missing(kind: &str, id: &str) -> FxaError {
            BillingError::StripeApiError {
                operation: format!("retrieve_{}", kind),
                message: format!("No such {}: '{}'", kind, id),
                code: Some("resource_missing".to_string()),
                http_status: Some(404),
            }
            .into()
        }
    }

    impl StripePromotionClient for MockStripePromotionClient {
        async fn retrieve_subscription(&self, subscription_id: &str) -> Result<Subscription> {
            self.subscriptions
                .read()
                .unwrap()
                .get(subscription_id)
                .cloned()
                .ok_or_else(|| Self::missing("subscription", subscription_id))
        }

        async fn retrieve_price(&self, price_id: &str) -> Result<Price> {
            self.prices
                .read()
                .unwrap()
                .get(price_id)
                .cloned()
                .ok_or_else(|| Self::missing("price", price_id))
        }

        async fn retrieve_product(&self, product_id: &str) -> Result<Product> {
            self.product_fetches.fetch_add(1, Ordering::SeqCst);
            self.products
                .read()
                .unwrap()
                .get(product_id)
                .cloned()
                .ok_or_else(|| Self::missing("product", product_id))
        }

        async fn retrieve_promotion_code(
            &self,
            promotion_code_id: &str,
        ) -> Result<Option<PromotionCode>> {
            Ok(self.promotion_codes.read().unwrap().get(promotion_code_id).cloned())
        }

        async fn find_promotion_code_by_code(&self, code: &str) -> Result<Option<PromotionCode>> {
            Ok(self
                .promotion_codes
                .read()
                .unwrap()
                .values()
                .find(|p| p.code == code && p.active)
                .cloned())
        }

        async fn apply_promotion_code(
            &self,
            subscription_id: &str,
            promotion_code_id: &str,
        ) -> Result<Subscription> {
            let mut subscriptions = self.subscriptions.write().unwrap();
            let subscription = subscriptions
                .get_mut(subscription_id)
                .ok_or_else(|| Self::missing("subscription", subscription_id))?;
            subscription
                .metadata
                .insert("promotion_code".to_string(), promotion_code_id.to_string());

            self.applied
                .write()
                .unwrap()
                .push((subscription_id.to_string(), promotion_code_id.to_string()));

            Ok(subscription.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test::MockStripePromotionClient;
    use super::*;
    use crate::billing::types::{Expandable, SubscriptionStatus};
    use crate::error::FxaError;
    use crate::testing::fixtures::{
        PriceFixture, ProductFixture, PromotionCodeFixture, SubscriptionFixture,
        SubscriptionItemFixture,
    };

    struct Setup {
        client: MockStripePromotionClient,
        price: Price,
    }

    fn setup(price_codes: &str, product_codes: &str, status: SubscriptionStatus) -> Setup {
        let client = MockStripePromotionClient::new();

        let product = ProductFixture::new()
            .id("prod_123")
            .promotion_codes(product_codes)
            .build();
        let price = PriceFixture::new()
            .id("price_123")
            .product("prod_123")
            .promotion_codes(price_codes)
            .build();
        let subscription = SubscriptionFixture::new()
            .id("sub_123")
            .customer("cus_123")
            .status(status)
            .item(SubscriptionItemFixture::new().price(price.clone()).build())
            .build();

        client.add_product(product);
        client.add_price(price.clone());
        client.add_subscription(subscription);
        client.add_promotion_code(
            PromotionCodeFixture::new().id("promo_price").code("PRICE10").build(),
        );
        client.add_promotion_code(
            PromotionCodeFixture::new().id("promo_product").code("PRODUCT10").build(),
        );
        client.add_promotion_code(
            PromotionCodeFixture::new()
                .id("promo_expired")
                .code("OLD10")
                .expires_at(1_000)
                .build(),
        );

        Setup { client, price }
    }

    fn billing_err(err: FxaError) -> BillingError {
        match err {
            FxaError::Billing(err) => err,
            other => panic!("expected billing error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_apply_price_promotion_code() {
        let Setup { client, .. } = setup("PRICE10", "", SubscriptionStatus::Active);
        let manager = PromotionCodeManager::new(client);

        let updated = manager
            .apply_promo_code_to_subscription("cus_123", "sub_123", "promo_price")
            .await
            .unwrap();

        assert_eq!(updated.metadata.get("promotion_code").map(String::as_str), Some("promo_price"));
        assert_eq!(
            manager.client().applied(),
            vec![("sub_123".to_string(), "promo_price".to_string())]
        );
    }

    #[tokio::test]
    async fn test_apply_product_promotion_code_to_trialing_subscription() {
        let Setup { client, .. } = setup("", "PRODUCT10", SubscriptionStatus::Trialing);
        let manager = PromotionCodeManager::new(client);

        manager
            .apply_promo_code_to_subscription("cus_123", "sub_123", "promo_product")
            .await
            .unwrap();
        assert_eq!(manager.client().product_fetches(), 1);
    }

    #[tokio::test]
    async fn test_apply_rejects_other_customer() {
        let Setup { client, .. } = setup("PRICE10", "", SubscriptionStatus::Active);
        let manager = PromotionCodeManager::new(client);

        let err = manager
            .apply_promo_code_to_subscription("cus_other", "sub_123", "promo_price")
            .await
            .unwrap_err();

        assert!(matches!(
            billing_err(err),
            BillingError::PromotionCodeCustomerSubscriptionMismatch { .. }
        ));
        assert!(manager.client().applied().is_empty());
    }

    #[tokio::test]
    async fn test_apply_rejects_inactive_subscription() {
        let Setup { client, .. } = setup("PRICE10", "", SubscriptionStatus::PastDue);
        let manager = PromotionCodeManager::new(client);

        let err = manager
            .apply_promo_code_to_subscription("cus_123", "sub_123", "promo_price")
            .await
            .unwrap_err();

        assert_eq!(
            billing_err(err),
            BillingError::SubscriptionNotActive {
                subscription_id: "sub_123".to_string(),
                status: "past_due".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_apply_rejects_unknown_and_expired_codes() {
        let Setup { client, .. } = setup("PRICE10,OLD10", "", SubscriptionStatus::Active);
        let manager = PromotionCodeManager::new(client);

        let err = manager
            .apply_promo_code_to_subscription("cus_123", "sub_123", "promo_missing")
            .await
            .unwrap_err();
        assert!(matches!(billing_err(err), BillingError::PromotionCodeInvalid { code: None, .. }));

        let err = manager
            .apply_promo_code_to_subscription("cus_123", "sub_123", "promo_expired")
            .await
            .unwrap_err();
        assert!(matches!(billing_err(err), BillingError::PromotionCodeInvalid { .. }));
        assert!(manager.client().applied().is_empty());
    }

    #[tokio::test]
    async fn test_apply_rejects_out_of_scope_code() {
        let Setup { client, .. } = setup("PRICE10", "", SubscriptionStatus::Active);
        let manager = PromotionCodeManager::new(client);

        let err = manager
            .apply_promo_code_to_subscription("cus_123", "sub_123", "promo_product")
            .await
            .unwrap_err();

        assert!(matches!(
            billing_err(err),
            BillingError::PromotionCodeNotForSubscription { .. }
        ));
    }

    #[tokio::test]
    async fn test_apply_rejects_multi_item_subscription() {
        let Setup { client, price } = setup("PRICE10", "", SubscriptionStatus::Active);
        client.add_subscription(
            SubscriptionFixture::new()
                .id("sub_bundle")
                .customer("cus_123")
                .item(SubscriptionItemFixture::new().price(price.clone()).build())
                .item(SubscriptionItemFixture::new().price(price).build())
                .build(),
        );
        let manager = PromotionCodeManager::new(client);

        let err = manager
            .apply_promo_code_to_subscription("cus_123", "sub_bundle", "promo_price")
            .await
            .unwrap_err();

        assert!(matches!(
            billing_err(err),
            BillingError::SubscriptionPriceUnknown { item_count: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_retrieve_promotion_code_for_price() {
        let Setup { client, .. } = setup("PRICE10", "PRODUCT10", SubscriptionStatus::Active);
        let manager = PromotionCodeManager::new(client);

        let code = manager
            .retrieve_promotion_code_for_price("PRODUCT10", "price_123")
            .await
            .unwrap();
        assert_eq!(code.id, "promo_product");

        let err = manager
            .retrieve_promotion_code_for_price("NOPE", "price_123")
            .await
            .unwrap_err();
        assert_eq!(
            billing_err(err),
            BillingError::PromotionCodeNotFound { code: "NOPE".to_string() }
        );

        let err = manager
            .retrieve_promotion_code_for_price("OLD10", "price_123")
            .await
            .unwrap_err();
        assert!(matches!(billing_err(err), BillingError::PromotionCodeInvalid { .. }));
    }

    #[tokio::test]
    async fn test_expanded_product_skips_lookup() {
        let client = MockStripePromotionClient::new();
        let product = ProductFixture::new().promotion_codes("EXP").build();
        let mut price = PriceFixture::new().id("price_exp").build();
        price.product = Expandable::Object(Box::new(product));
        client.add_price(price);
        client.add_promotion_code(PromotionCodeFixture::new().id("promo_1").code("EXP").build());
        let manager = PromotionCodeManager::new(client);

        manager
            .retrieve_promotion_code_for_price("EXP", "price_exp")
            .await
            .unwrap();
        assert_eq!(manager.client().product_fetches(), 0);
    }

    #[tokio::test]
    async fn test_missing_subscription_is_stripe_error() {
        let manager = PromotionCodeManager::new(MockStripePromotionClient::new());

        let err = manager
            .apply_promo_code_to_subscription("cus_123", "sub_missing", "promo_price")
            .await
            .unwrap_err();
        let err = billing_err(err);
        assert!(matches!(err, BillingError::StripeApiError { http_status: Some(404), .. }));
        assert!(!err.is_retryable());
    }
}
