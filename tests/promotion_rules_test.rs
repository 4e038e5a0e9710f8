//! End-to-end checks of the promotion code and subscription rules through the public API

use fxa_shared::FxaError;
use fxa_shared::billing::{
    BillingError, List, PromotionCodeManager, SubscriptionStatus,
    check_subscription_promotion_codes, check_valid_promotion_code, check_valid_promotion_code_at,
    get_subscribed_plans, get_subscribed_price, get_subscribed_product_ids,
};
use fxa_shared::testing::{
    MockStripePromotionClient, PlanFixture, PriceFixture, ProductFixture, PromotionCodeFixture,
    SubscriptionFixture, SubscriptionItemFixture,
};

#[test]
fn test_checkout_flow_accepts_code_listed_on_product() {
    let product = ProductFixture::new().promotion_codes("WINTER,SPRING").build();
    let price = PriceFixture::new().product(product.id.clone()).build();
    let code = PromotionCodeFixture::new().code("SPRING").build();

    assert_eq!(check_valid_promotion_code(Some(&code)), Ok(true));
    assert_eq!(check_subscription_promotion_codes(&code.code, &price, Some(&product)), Ok(true));
}

#[test]
fn test_checkout_flow_rejects_unlisted_code() {
    let product = ProductFixture::new().promotion_codes("WINTER").build();
    let price = PriceFixture::new().promotion_codes("SUMMER").build();

    let err = check_subscription_promotion_codes("AUTUMN", &price, Some(&product)).unwrap_err();
    assert!(matches!(err, BillingError::PromotionCodeNotForSubscription { .. }));
    assert_eq!(err.code(), "promotion_code_not_for_subscription");
    assert!(err.is_client_error());

    let err = check_subscription_promotion_codes("AUTUMN", &price, None).unwrap_err();
    assert!(matches!(err, BillingError::PromotionCodeNotForSubscription { .. }));
}

#[test]
fn test_expiry_boundary() {
    let code = PromotionCodeFixture::new().expires_at(1_700_000_000).build();

    assert_eq!(check_valid_promotion_code_at(Some(&code), 1_700_000_000), Ok(true));
    assert!(matches!(
        check_valid_promotion_code_at(Some(&code), 1_700_000_001),
        Err(BillingError::PromotionCodeInvalid { .. })
    ));
    assert!(matches!(
        check_valid_promotion_code(None),
        Err(BillingError::PromotionCodeInvalid { code: None, .. })
    ));
}

#[test]
fn test_subscribed_products_across_subscriptions() {
    let monthly = SubscriptionFixture::new()
        .item(
            SubscriptionItemFixture::new()
                .plan(PlanFixture::new().id("plan_vpn").product("prod_vpn").build())
                .build(),
        )
        .build();
    let bundle = SubscriptionFixture::new()
        .item(
            SubscriptionItemFixture::new()
                .plan(PlanFixture::new().id("plan_relay").product("prod_relay").build())
                .build(),
        )
        .item(
            SubscriptionItemFixture::new()
                .plan(PlanFixture::new().id("plan_vpn_2").product("prod_vpn").build())
                .build(),
        )
        .build();

    let plans = get_subscribed_plans(&List::new(vec![monthly.clone(), bundle.clone()]));
    let ids: Vec<_> = plans.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["plan_vpn", "plan_relay", "plan_vpn_2"]);

    // Duplicates are kept
    assert_eq!(
        get_subscribed_product_ids(&plans),
        vec!["prod_vpn", "prod_relay", "prod_vpn"]
    );

    assert!(get_subscribed_price(&monthly).is_ok());
    assert!(matches!(
        get_subscribed_price(&bundle),
        Err(BillingError::SubscriptionPriceUnknown { item_count: 2, .. })
    ));
}

#[tokio::test]
async fn test_apply_promotion_code_with_mock_client() {
    let client = MockStripePromotionClient::new();
    let product = ProductFixture::new().id("prod_vpn").promotion_codes("VPN20").build();
    let price = PriceFixture::new().id("price_vpn").product("prod_vpn").build();
    client.add_product(product);
    client.add_price(price.clone());
    client.add_subscription(
        SubscriptionFixture::new()
            .id("sub_vpn")
            .customer("cus_1")
            .status(SubscriptionStatus::Active)
            .item(SubscriptionItemFixture::new().price(price).build())
            .build(),
    );
    client.add_promotion_code(PromotionCodeFixture::new().id("promo_vpn").code("VPN20").build());

    let manager = PromotionCodeManager::new(client);

    let found = manager
        .retrieve_promotion_code_for_price("VPN20", "price_vpn")
        .await
        .unwrap();
    assert_eq!(found.id, "promo_vpn");

    manager
        .apply_promo_code_to_subscription("cus_1", "sub_vpn", "promo_vpn")
        .await
        .unwrap();
    assert_eq!(manager.client().applied().len(), 1);

    let err = manager
        .apply_promo_code_to_subscription("cus_2", "sub_vpn", "promo_vpn")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FxaError::Billing(BillingError::PromotionCodeCustomerSubscriptionMismatch { .. })
    ));
}
