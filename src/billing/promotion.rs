//! Promotion code eligibility rules.
//!
//! Two independent checks decide whether a customer can redeem a promotion
//! code on a subscription:
//!
//! - [`check_valid_promotion_code`]: is the code itself usable right now?
//! - [`check_subscription_promotion_codes`]: is the code allowed for this
//!   price (or its product)?
//!
//! Both are pure functions over objects already fetched from Stripe.
//!
//! # Example
//!
//! ```rust,ignore
//! use fxa_shared::billing::{check_subscription_promotion_codes, check_valid_promotion_code};
//!
//! check_valid_promotion_code(Some(&promotion_code))?;
//! check_subscription_promotion_codes(&promotion_code.code, &price, Some(&product))?;
//! ```

use super::error::BillingError;
use super::types::{Price, Product, PromotionCode, price_metadata, product_metadata};

/// Check that a promotion code can be redeemed now.
///
/// # Errors
///
/// Returns `BillingError::PromotionCodeInvalid` if the code is absent, inactive,
/// expired, or its coupon is no longer valid.
pub fn check_valid_promotion_code(code: Option<&PromotionCode>) -> Result<bool, BillingError> {
    check_valid_promotion_code_at(code, chrono::Utc::now().timestamp())
}

/// Same as [`check_valid_promotion_code`] with the current time (Unix seconds)
/// supplied by the caller.
pub fn check_valid_promotion_code_at(
    code: Option<&PromotionCode>,
    now: i64,
) -> Result<bool, BillingError> {
    let Some(code) = code else {
        return Err(invalid(None, "promotion code does not exist"));
    };

    if !code.active {
        return Err(invalid(Some(code), "promotion code is not active"));
    }

    if !code.coupon.valid {
        return Err(invalid(Some(code), "promotion code coupon is not valid"));
    }

    if code.expires_at.is_some_and(|expires_at| expires_at < now) {
        return Err(invalid(Some(code), "promotion code has expired"));
    }

    Ok(true)
}

fn invalid(code: Option<&PromotionCode>, reason: &str) -> BillingError {
    tracing::debug!(
        target: "billing.promotion_code.invalid",
        promotion_code_id = code.map(|c| c.id.as_str()).unwrap_or("none"),
        reason,
        "Promotion code rejected"
    );

    BillingError::PromotionCodeInvalid {
        code: code.map(|c| c.code.clone()),
        reason: reason.to_string(),
    }
}

/// Check that a promotion code is allowed for a subscription's price.
///
/// The code is eligible if it appears in the price's `promotionCodes` metadata
/// or, when a product is supplied, in the product's `promotionCodes` metadata.
/// Lists are comma-separated and matched exactly (case-sensitive, untrimmed).
///
/// # Errors
///
/// Returns `BillingError::PromotionCodeNotForSubscription` if the code is in
/// neither list. This holds whether or not a product was supplied.
pub fn check_subscription_promotion_codes(
    promotion_code: &str,
    price: &Price,
    product: Option<&Product>,
) -> Result<bool, BillingError> {
    let in_price = metadata_promotion_codes(price.metadata.get(price_metadata::PROMOTION_CODES))
        .any(|c| c == promotion_code);

    let in_product = product.is_some_and(|product| {
        metadata_promotion_codes(product.metadata.get(product_metadata::PROMOTION_CODES))
            .any(|c| c == promotion_code)
    });

    if in_price || in_product {
        return Ok(true);
    }

    tracing::debug!(
        target: "billing.promotion_code.out_of_scope",
        promotion_code,
        price_id = %price.id,
        product_id = product.map(|p| p.id.as_str()).unwrap_or("none"),
        "Promotion code not allowed for subscription"
    );

    Err(BillingError::PromotionCodeNotForSubscription {
        code: promotion_code.to_string(),
        price_id: price.id.clone(),
    })
}

/// Split a metadata allow-list. A missing value is an empty list.
fn metadata_promotion_codes(value: Option<&String>) -> impl Iterator<Item = &str> {
    value.into_iter().flat_map(|v| v.split(','))
}
