//! Billing-specific error types.
//!
//! Each rule in the billing module fails with exactly one of these kinds so
//! callers (GraphQL resolvers, REST handlers) can translate them into
//! user-facing messages without string matching.

use axum::http::StatusCode;
use std::fmt;

/// Billing-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    // Promotion code errors
    /// The promotion code is missing, inactive, expired, or its coupon is invalid.
    PromotionCodeInvalid { code: Option<String>, reason: String },
    /// The promotion code is not in the allow-list of the price or product.
    PromotionCodeNotForSubscription { code: String, price_id: String },
    /// No promotion code exists for the customer-facing code string.
    PromotionCodeNotFound { code: String },
    /// The subscription does not belong to the customer applying the code.
    PromotionCodeCustomerSubscriptionMismatch {
        customer_id: String,
        subscription_id: String,
    },

    // Subscription errors
    /// The subscription does not resolve to exactly one price.
    SubscriptionPriceUnknown { subscription_id: String, item_count: usize },
    /// The subscription is not in a state that accepts changes.
    SubscriptionNotActive { subscription_id: String, status: String },

    // Stripe API errors
    /// Stripe API returned an error.
    StripeApiError {
        operation: String,
        message: String,
        code: Option<String>,
        http_status: Option<u16>,
    },
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PromotionCodeInvalid { code, reason } => match code {
                Some(code) => write!(f, "Invalid promotion code '{}': {}", code, reason),
                None => write!(f, "Invalid promotion code: {}", reason),
            },
            Self::PromotionCodeNotForSubscription { code, price_id } => {
                write!(
                    f,
                    "Promotion code '{}' is not valid for the subscription price '{}'",
                    code, price_id
                )
            }
            Self::PromotionCodeNotFound { code } => {
                write!(f, "Promotion code not found: {}", code)
            }
            Self::PromotionCodeCustomerSubscriptionMismatch { customer_id, subscription_id } => {
                write!(
                    f,
                    "Subscription '{}' does not belong to customer '{}'",
                    subscription_id, customer_id
                )
            }
            Self::SubscriptionPriceUnknown { subscription_id, item_count } => {
                write!(
                    f,
                    "Unknown subscription price for '{}' ({} items)",
                    subscription_id, item_count
                )
            }
            Self::SubscriptionNotActive { subscription_id, status } => {
                write!(f, "Subscription '{}' is not active (status: {})", subscription_id, status)
            }
            Self::StripeApiError { operation, message, code, http_status } => {
                write!(f, "Stripe API error during '{}': {}", operation, message)?;
                if let Some(code) = code {
                    write!(f, " (code: {})", code)?;
                }
                if let Some(status) = http_status {
                    write!(f, " [HTTP {}]", status)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BillingError {}

impl BillingError {
    /// Stable machine-readable identifier for the error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PromotionCodeInvalid { .. } => "promotion_code_invalid",
            Self::PromotionCodeNotForSubscription { .. } => "promotion_code_not_for_subscription",
            Self::PromotionCodeNotFound { .. } => "promotion_code_not_found",
            Self::PromotionCodeCustomerSubscriptionMismatch { .. } => {
                "promotion_code_customer_subscription_mismatch"
            }
            Self::SubscriptionPriceUnknown { .. } => "subscription_price_unknown",
            Self::SubscriptionNotActive { .. } => "subscription_not_active",
            Self::StripeApiError { .. } => "stripe_api_error",
        }
    }

    /// HTTP status callers should answer with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PromotionCodeInvalid { .. } | Self::PromotionCodeNotForSubscription { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::PromotionCodeNotFound { .. } => StatusCode::NOT_FOUND,
            Self::PromotionCodeCustomerSubscriptionMismatch { .. }
            | Self::SubscriptionNotActive { .. } => StatusCode::FORBIDDEN,
            // Data shape problem on the billing side, not something the user sent
            Self::SubscriptionPriceUnknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StripeApiError { http_status, .. } => match http_status {
                Some(status @ 400..=499) => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
                }
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Check if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this error is retryable.
    ///
    /// Rule failures are terminal; only rate limits and Stripe server errors
    /// are worth another attempt by the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StripeApiError { http_status, .. } => {
                matches!(http_status, Some(429) | Some(500..=599))
            }
            _ => false,
        }
    }
}
