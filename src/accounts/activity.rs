//! Account activity checks.
//!
//! Decides whether an account counts as active beyond what the inactive
//! account query can see in the database: token use tracked elsewhere (the
//! session token last-access time lives in Redis) and in-app purchase
//! subscriptions.
//!
//! # Example
//!
//! ```rust,ignore
//! use fxa_shared::accounts::{
//!     AccessTokenCondition, IsActiveFnBuilder, RefreshTokenCondition, SessionTokenCondition,
//! };
//!
//! let is_active = IsActiveFnBuilder::new()
//!     .active_session_token(SessionTokenCondition::new(store.clone(), active_by_ms))
//!     .refresh_token(RefreshTokenCondition::new(store.clone(), active_by_ms))
//!     .access_token(AccessTokenCondition::new(store.clone()))
//!     .iap_subscription(move |uid: String| {
//!         let iap = iap.clone();
//!         async move { iap.has_subscription(&uid).await }
//!     })
//!     .build();
//!
//! if !is_active.is_active(&uid).await? {
//!     // enqueue for deletion
//! }
//! ```

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::error::Result;

/// Session token activity, as tracked by the auth server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokenActivity {
    pub token_id: String,
    /// Last access time in milliseconds, if the token was ever used.
    pub last_access_time: Option<i64>,
}

/// OAuth refresh token activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenActivity {
    pub token_id: String,
    /// Last use in milliseconds.
    pub last_used_at: i64,
}

/// An unexpired OAuth access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenActivity {
    pub token_id: String,
    pub client_id: String,
}

/// Trait for looking up an account's tokens.
#[async_trait]
pub trait AccountTokenStore: Send + Sync {
    /// Session tokens for the account, with last-access times merged in.
    async fn session_tokens(&self, uid: &str) -> Result<Vec<SessionTokenActivity>>;

    /// OAuth refresh tokens for the account.
    async fn refresh_tokens(&self, uid: &str) -> Result<Vec<RefreshTokenActivity>>;

    /// Unexpired OAuth access tokens for the account.
    async fn access_tokens(&self, uid: &str) -> Result<Vec<AccessTokenActivity>>;
}

/// Check if any session token was used on or after `active_by_ms`.
pub async fn has_active_session_token<S: AccountTokenStore + ?Sized>(
    store: &S,
    uid: &str,
    active_by_ms: i64,
) -> Result<bool> {
    let tokens = store.session_tokens(uid).await?;
    Ok(tokens
        .iter()
        .any(|t| t.last_access_time.is_some_and(|at| at >= active_by_ms)))
}

/// Check if any refresh token was used on or after `active_by_ms`.
pub async fn has_active_refresh_token<S: AccountTokenStore + ?Sized>(
    store: &S,
    uid: &str,
    active_by_ms: i64,
) -> Result<bool> {
    let tokens = store.refresh_tokens(uid).await?;
    Ok(tokens.iter().any(|t| t.last_used_at >= active_by_ms))
}

/// Check if the account holds any access token.
pub async fn has_access_token<S: AccountTokenStore + ?Sized>(store: &S, uid: &str) -> Result<bool> {
    let tokens = store.access_tokens(uid).await?;
    Ok(!tokens.is_empty())
}

/// A condition that marks an account as active.
#[async_trait]
pub trait ActiveCondition: Send + Sync {
    async fn is_active(&self, uid: &str) -> Result<bool>;
}

#[async_trait]
impl<F, Fut> ActiveCondition for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool>> + Send + 'static,
{
    async fn is_active(&self, uid: &str) -> Result<bool> {
        (self)(uid.to_string()).await
    }
}

/// Active if a session token was used since the cut-off.
pub struct SessionTokenCondition<S: ?Sized> {
    store: Arc<S>,
    active_by_ms: i64,
}

impl<S: AccountTokenStore + ?Sized> SessionTokenCondition<S> {
    #[must_use]
    pub fn new(store: Arc<S>, active_by_ms: i64) -> Self {
        Self { store, active_by_ms }
    }
}

#[async_trait]
impl<S: AccountTokenStore + ?Sized> ActiveCondition for SessionTokenCondition<S> {
    async fn is_active(&self, uid: &str) -> Result<bool> {
        has_active_session_token(self.store.as_ref(), uid, self.active_by_ms).await
    }
}

/// Active if a refresh token was used since the cut-off.
pub struct RefreshTokenCondition<S: ?Sized> {
    store: Arc<S>,
    active_by_ms: i64,
}

impl<S: AccountTokenStore + ?Sized> RefreshTokenCondition<S> {
    #[must_use]
    pub fn new(store: Arc<S>, active_by_ms: i64) -> Self {
        Self { store, active_by_ms }
    }
}

#[async_trait]
impl<S: AccountTokenStore + ?Sized> ActiveCondition for RefreshTokenCondition<S> {
    async fn is_active(&self, uid: &str) -> Result<bool> {
        has_active_refresh_token(self.store.as_ref(), uid, self.active_by_ms).await
    }
}

/// Active if the account holds any access token.
pub struct AccessTokenCondition<S: ?Sized> {
    store: Arc<S>,
}

impl<S: AccountTokenStore + ?Sized> AccessTokenCondition<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: AccountTokenStore + ?Sized> ActiveCondition for AccessTokenCondition<S> {
    async fn is_active(&self, uid: &str) -> Result<bool> {
        has_access_token(self.store.as_ref(), uid).await
    }
}

/// Placeholder for a condition that has not been supplied yet.
///
/// Does not implement [`ActiveCondition`], so a builder holding one cannot build.
#[derive(Debug, Clone, Copy, Default)]
pub struct Missing;

/// Builder for the account activity check.
///
/// All four conditions are required. `build()` only exists once every
/// condition has been set, so a missing condition is a compile error:
///
/// ```compile_fail
/// use fxa_shared::accounts::IsActiveFnBuilder;
///
/// let check = IsActiveFnBuilder::new()
///     .active_session_token(|_uid: String| async { Ok::<_, fxa_shared::FxaError>(false) })
///     .build();
/// ```
#[must_use = "builder does nothing until you call build()"]
pub struct IsActiveFnBuilder<S = Missing, R = Missing, A = Missing, I = Missing> {
    active_session_token: S,
    refresh_token: R,
    access_token: A,
    iap_subscription: I,
}

impl IsActiveFnBuilder {
    pub fn new() -> Self {
        Self {
            active_session_token: Missing,
            refresh_token: Missing,
            access_token: Missing,
            iap_subscription: Missing,
        }
    }
}

impl Default for IsActiveFnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, R, A, I> IsActiveFnBuilder<S, R, A, I> {
    /// Set the check for an active session token.
    pub fn active_session_token<F: ActiveCondition>(self, f: F) -> IsActiveFnBuilder<F, R, A, I> {
        IsActiveFnBuilder {
            active_session_token: f,
            refresh_token: self.refresh_token,
            access_token: self.access_token,
            iap_subscription: self.iap_subscription,
        }
    }

    /// Set the check for a recently used refresh token.
    pub fn refresh_token<F: ActiveCondition>(self, f: F) -> IsActiveFnBuilder<S, F, A, I> {
        IsActiveFnBuilder {
            active_session_token: self.active_session_token,
            refresh_token: f,
            access_token: self.access_token,
            iap_subscription: self.iap_subscription,
        }
    }

    /// Set the check for an access token.
    pub fn access_token<F: ActiveCondition>(self, f: F) -> IsActiveFnBuilder<S, R, F, I> {
        IsActiveFnBuilder {
            active_session_token: self.active_session_token,
            refresh_token: self.refresh_token,
            access_token: f,
            iap_subscription: self.iap_subscription,
        }
    }

    /// Set the check for an in-app purchase subscription.
    pub fn iap_subscription<F: ActiveCondition>(self, f: F) -> IsActiveFnBuilder<S, R, A, F> {
        IsActiveFnBuilder {
            active_session_token: self.active_session_token,
            refresh_token: self.refresh_token,
            access_token: self.access_token,
            iap_subscription: f,
        }
    }
}

impl<S, R, A, I> IsActiveFnBuilder<S, R, A, I>
where
    S: ActiveCondition,
    R: ActiveCondition,
    A: ActiveCondition,
    I: ActiveCondition,
{
    /// Build the activity check.
    pub fn build(self) -> AccountActivityCheck<S, R, A, I> {
        AccountActivityCheck {
            active_session_token: self.active_session_token,
            refresh_token: self.refresh_token,
            access_token: self.access_token,
            iap_subscription: self.iap_subscription,
        }
    }
}

/// Evaluates the activity conditions in order, stopping at the first match.
pub struct AccountActivityCheck<S, R, A, I> {
    active_session_token: S,
    refresh_token: R,
    access_token: A,
    iap_subscription: I,
}

impl<S, R, A, I> AccountActivityCheck<S, R, A, I>
where
    S: ActiveCondition,
    R: ActiveCondition,
    A: ActiveCondition,
    I: ActiveCondition,
{
    /// Check if the account is active.
    pub async fn is_active(&self, uid: &str) -> Result<bool> {
        let reason = if self.active_session_token.is_active(uid).await? {
            "session_token"
        } else if self.refresh_token.is_active(uid).await? {
            "refresh_token"
        } else if self.access_token.is_active(uid).await? {
            "access_token"
        } else if self.iap_subscription.is_active(uid).await? {
            "iap_subscription"
        } else {
            tracing::debug!(
                target: "accounts.activity.inactive",
                uid,
                "Account has no recent activity"
            );
            return Ok(false);
        };

        tracing::debug!(target: "accounts.activity.active", uid, reason, "Account is active");
        Ok(true)
    }
}

#[async_trait]
impl<S, R, A, I> ActiveCondition for AccountActivityCheck<S, R, A, I>
where
    S: ActiveCondition,
    R: ActiveCondition,
    A: ActiveCondition,
    I: ActiveCondition,
{
    async fn is_active(&self, uid: &str) -> Result<bool> {
        AccountActivityCheck::is_active(self, uid).await
    }
}

/// In-memory token store for testing.
#[cfg(any(test, feature = "test-accounts"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    #[derive(Default)]
    struct Tokens {
        sessions: Vec<SessionTokenActivity>,
        refresh: Vec<RefreshTokenActivity>,
        access: Vec<AccessTokenActivity>,
    }

    /// In-memory token store keyed by account uid.
    #[derive(Default)]
    pub struct InMemoryTokenStore {
        tokens: RwLock<HashMap<String, Tokens>>,
    }

    impl InMemoryTokenStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_session_token(&self, uid: &str, last_access_time: Option<i64>) {
            let mut tokens = self.tokens.write().unwrap();
            let entry = tokens.entry(uid.to_string()).or_default();
            let token_id = format!("session_{}", entry.sessions.len());
            entry.sessions.push(SessionTokenActivity { token_id, last_access_time });
        }

        pub fn add_refresh_token(&self, uid: &str, last_used_at: i64) {
            let mut tokens = self.tokens.write().unwrap();
            let entry = tokens.entry(uid.to_string()).or_default();
            let token_id = format!("refresh_{}", entry.refresh.len());
            entry.refresh.push(RefreshTokenActivity { token_id, last_used_at });
        }

        pub fn add_access_token(&self, uid: &str, client_id: &str) {
            let mut tokens = self.tokens.write().unwrap();
            let entry = tokens.entry(uid.to_string()).or_default();
            let token_id = format!("access_{}", entry.access.len());
            entry.access.push(AccessTokenActivity {
                token_id,
                client_id: client_id.to_string(),
            });
        }
    }

    #[async_trait]
    impl AccountTokenStore for InMemoryTokenStore {
        async fn session_tokens(&self, uid: &str) -> Result<Vec<SessionTokenActivity>> {
            Ok(self
                .tokens
                .read()
                .unwrap()
                .get(uid)
                .map(|t| t.sessions.clone())
                .unwrap_or_default())
        }

        async fn refresh_tokens(&self, uid: &str) -> Result<Vec<RefreshTokenActivity>> {
            Ok(self
                .tokens
                .read()
                .unwrap()
                .get(uid)
                .map(|t| t.refresh.clone())
                .unwrap_or_default())
        }

        async fn access_tokens(&self, uid: &str) -> Result<Vec<AccessTokenActivity>> {
            Ok(self
                .tokens
                .read()
                .unwrap()
                .get(uid)
                .map(|t| t.access.clone())
                .unwrap_or_default())
        }
    }
}
