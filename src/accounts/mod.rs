//! Account lifecycle maintenance.
//!
//! Rules for finding accounts that have been inactive long enough to be
//! deleted: the SQL that narrows the candidates, and the per-account activity
//! check for signals the database query cannot see.
//!
//! # Example
//!
//! ```rust,ignore
//! use fxa_shared::accounts::{inactive_accounts_sql, InactiveAccountWindow};
//!
//! let window = InactiveAccountWindow::new(start_ms, end_ms, active_by_ms)?;
//! let sql = inactive_accounts_sql(&window, Some(500));
//! ```

pub mod activity;
#[cfg(feature = "database")]
pub mod query;
pub mod window;

pub use activity::{
    AccessTokenActivity, AccessTokenCondition, AccountActivityCheck, AccountTokenStore,
    ActiveCondition, IsActiveFnBuilder, Missing, RefreshTokenActivity, RefreshTokenCondition,
    SessionTokenActivity, SessionTokenCondition, has_access_token, has_active_refresh_token,
    has_active_session_token,
};
#[cfg(feature = "database")]
pub use query::{
    SecurityEventName, account_customer_uids_query, email_uids_query, inactive_accounts_query,
    inactive_accounts_sql, security_event_name_ids_query, security_event_uids_query,
    session_token_uids_query,
};
pub use window::{InactiveAccountWindow, set_date_to_utc};

#[cfg(any(test, feature = "test-accounts"))]
pub use activity::test::InMemoryTokenStore;
