//! Subscription price and plan lookups.
//!
//! Helpers that read the price or plans out of Stripe subscriptions. Products
//! and plans are identified by what the customer is subscribed to, so these
//! feed entitlement and capability checks.

use super::error::BillingError;
use super::types::{List, Plan, Price, Subscription};

/// Get the single price a subscription is billed for.
///
/// # Errors
///
/// Returns `BillingError::SubscriptionPriceUnknown` if the subscription has no
/// items or more than one item.
pub fn get_subscribed_price(subscription: &Subscription) -> Result<&Price, BillingError> {
    match subscription.items.data.as_slice() {
        [item] => Ok(&item.price),
        items => {
            tracing::warn!(
                target: "billing.subscription.price_unknown",
                subscription_id = %subscription.id,
                item_count = items.len(),
                "Subscription does not resolve to a single price"
            );
            Err(BillingError::SubscriptionPriceUnknown {
                subscription_id: subscription.id.clone(),
                item_count: items.len(),
            })
        }
    }
}

/// Collect the plans of every item across a list of subscriptions.
///
/// Order follows the subscriptions, then their items. Items without a plan
/// are skipped.
#[must_use]
pub fn get_subscribed_plans(subscriptions: &List<Subscription>) -> Vec<Plan> {
    subscriptions
        .iter()
        .flat_map(|sub| sub.items.iter())
        .filter_map(|item| item.plan.clone())
        .collect()
}

/// Map plans to the ids of the products they belong to, preserving order.
#[must_use]
pub fn get_subscribed_product_ids(plans: &[Plan]) -> Vec<String> {
    plans.iter().map(|plan| plan.product.id().to_string()).collect()
}

/// Check if any of the plans belongs to the given product.
#[must_use]
pub fn is_subscribed_to_product(plans: &[Plan], product_id: &str) -> bool {
    plans.iter().any(|plan| plan.product.id() == product_id)
}
