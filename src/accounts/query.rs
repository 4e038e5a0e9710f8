//! SQL for selecting inactive account candidates.
//!
//! An account is a candidate when it has a verified primary email, was
//! created inside the sweep window, and shows none of the activity the auth
//! database records: a newly verified email, a session token used since the
//! cut-off, a login or password security event since the cut-off, or a linked
//! billing customer. Activity tracked outside the database is checked per
//! account afterwards with [`AccountActivityCheck`](super::AccountActivityCheck).

use sea_orm::sea_query::{Alias, Expr, JoinType, MysqlQueryBuilder, Order, Query, SelectStatement};

use super::window::InactiveAccountWindow;

const ACCOUNTS: &str = "accounts";
const EMAILS: &str = "emails";
const SESSION_TOKENS: &str = "sessionTokens";
const SECURITY_EVENTS: &str = "securityEvents";
const ACCOUNT_CUSTOMERS: &str = "accountCustomers";
const SECURITY_EVENT_NAMES: &str = "securityEventNames";

const EMAIL_UIDS: &str = "emailUids";
const SESSION_TOKEN_UIDS: &str = "sessionTokenUids";
const SECURITY_EVENT_UIDS: &str = "securityEventUids";
const ACCOUNT_CUSTOMER_UIDS: &str = "accountCustomerUids";

const UID: &str = "uid";

/// Security events that count as account activity.
///
/// Ids are resolved by name through the `securityEventNames` lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventName {
    Login,
    PasswordResetSuccess,
    PasswordChanged,
}

impl SecurityEventName {
    /// Events that mark an account as active.
    pub const ACTIVITY: [SecurityEventName; 3] =
        [Self::Login, Self::PasswordResetSuccess, Self::PasswordChanged];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "account.login",
            Self::PasswordResetSuccess => "account.password_reset_success",
            Self::PasswordChanged => "account.password_changed",
        }
    }
}

fn col(table: &str, column: &str) -> (Alias, Alias) {
    (Alias::new(table), Alias::new(column))
}

/// Accounts with an email verified on or after the cut-off.
#[must_use]
pub fn email_uids_query(active_by_ms: i64) -> SelectStatement {
    Query::select()
        .distinct()
        .column(Alias::new(UID))
        .from(Alias::new(EMAILS))
        .and_where(Expr::col(Alias::new("verifiedAt")).gte(active_by_ms))
        .to_owned()
}

/// Accounts with a session token used on or after the cut-off.
#[must_use]
pub fn session_token_uids_query(active_by_ms: i64) -> SelectStatement {
    Query::select()
        .distinct()
        .column(Alias::new(UID))
        .from(Alias::new(SESSION_TOKENS))
        .and_where(Expr::col(Alias::new("lastAccessTime")).gte(active_by_ms))
        .to_owned()
}

/// Ids of the activity events in the `securityEventNames` lookup table.
#[must_use]
pub fn security_event_name_ids_query() -> SelectStatement {
    Query::select()
        .column(Alias::new("id"))
        .from(Alias::new(SECURITY_EVENT_NAMES))
        .and_where(
            Expr::col(Alias::new("name"))
                .is_in(SecurityEventName::ACTIVITY.iter().map(SecurityEventName::as_str)),
        )
        .to_owned()
}

/// Accounts with a login or password security event on or after the cut-off.
#[must_use]
pub fn security_event_uids_query(active_by_ms: i64) -> SelectStatement {
    Query::select()
        .distinct()
        .column(Alias::new(UID))
        .from(Alias::new(SECURITY_EVENTS))
        .and_where(Expr::col(Alias::new("createdAt")).gte(active_by_ms))
        .and_where(Expr::col(Alias::new("nameId")).in_subquery(security_event_name_ids_query()))
        .to_owned()
}

/// Accounts linked to a billing customer.
#[must_use]
pub fn account_customer_uids_query() -> SelectStatement {
    Query::select()
        .column(Alias::new(UID))
        .from(Alias::new(ACCOUNT_CUSTOMERS))
        .to_owned()
}

/// Select inactive account candidates in the window, oldest first.
///
/// Ordered by `createdAt` then `uid` so callers can page with a limit.
#[must_use]
pub fn inactive_accounts_query(window: &InactiveAccountWindow) -> SelectStatement {
    let active_by = window.active_by_ms();

    let mut query = Query::select();
    query
        .column(col(ACCOUNTS, UID))
        .column(col(ACCOUNTS, "email"))
        .column(col(ACCOUNTS, "createdAt"))
        .from(Alias::new(ACCOUNTS));

    let exclusions = [
        (email_uids_query(active_by), EMAIL_UIDS),
        (session_token_uids_query(active_by), SESSION_TOKEN_UIDS),
        (security_event_uids_query(active_by), SECURITY_EVENT_UIDS),
        (account_customer_uids_query(), ACCOUNT_CUSTOMER_UIDS),
    ];

    for (subquery, alias) in exclusions {
        query.join_subquery(
            JoinType::LeftJoin,
            subquery,
            Alias::new(alias),
            Expr::col(col(alias, UID)).equals(col(ACCOUNTS, UID)),
        );
    }

    query
        .and_where(Expr::col(col(ACCOUNTS, "emailVerified")).eq(1))
        .and_where(Expr::col(col(ACCOUNTS, "createdAt")).gte(window.start_ms()))
        .and_where(Expr::col(col(ACCOUNTS, "createdAt")).lt(window.end_ms()));

    for alias in [EMAIL_UIDS, SESSION_TOKEN_UIDS, SECURITY_EVENT_UIDS, ACCOUNT_CUSTOMER_UIDS] {
        query.and_where(Expr::col(col(alias, UID)).is_null());
    }

    query
        .order_by(col(ACCOUNTS, "createdAt"), Order::Asc)
        .order_by(col(ACCOUNTS, UID), Order::Asc)
        .to_owned()
}

/// Render the inactive accounts query as MySQL.
#[must_use]
pub fn inactive_accounts_sql(window: &InactiveAccountWindow, limit: Option<u64>) -> String {
    let mut query = inactive_accounts_query(window);
    if let Some(limit) = limit {
        query.limit(limit);
    }

    let sql = query.to_string(MysqlQueryBuilder);
    tracing::debug!(
        target: "accounts.inactive.query",
        start = %window.start,
        end = %window.end,
        active_by = %window.active_by,
        sql = %sql,
        "Built inactive accounts query"
    );
    sql
}
