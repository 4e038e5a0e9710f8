//! fxa-shared - account and subscription rules shared by Firefox Accounts services
//!
//! Pure decision logic over Stripe objects and account activity, kept free of
//! any particular HTTP client or database driver so the auth server, the
//! payments server and batch scripts all apply the same rules.
//!
//! # Features
//!
//! - **Billing**: promotion code validity and scope checks, subscribed price,
//!   plan and product lookups, and a manager that applies a code to a live
//!   subscription through a pluggable Stripe client
//! - **Accounts**: inactive account window handling, the candidate SQL
//!   (feature `database`), and the per-account activity check
//! - **Testing**: Stripe fixtures and in-memory doubles (features
//!   `test-billing` and `test-accounts`)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fxa_shared::billing::{check_subscription_promotion_codes, check_valid_promotion_code};
//!
//! fxa_shared::init_tracing();
//!
//! check_valid_promotion_code(Some(&promotion_code))?;
//! check_subscription_promotion_codes(&promotion_code.code, &price, Some(&product))?;
//! ```

pub mod accounts;
pub mod billing;
mod config;
mod error;
#[cfg(any(test, feature = "test-billing", feature = "test-accounts"))]
pub mod testing;
mod utils;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, InactiveAccountsConfig, LoggingConfig, parse_date};
pub use error::{ErrorResponse, FxaError, Result};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "billing.promotion_code=debug")
/// - `FXA_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_with_prefix("LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
