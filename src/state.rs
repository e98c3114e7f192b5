//! Process-wide authentication session state.
//!
//! One session object is constructed at application start and shared with
//! every consumer; it is the single writer of the principal and (together
//! with the login machine) of the token store. Route guards read the derived
//! [`SessionSnapshot`] and never mutate anything.
//!
//! The bootstrap check runs at most once per application load: the
//! `has_checked` guard is claimed synchronously before the first await so a
//! second caller can never issue a duplicate profile request while the first
//! is still in flight.

use crate::{
    client::AuthApi,
    config::AuthConfig,
    errors::AuthError,
    token::TokenStore,
    types::{Principal, TenantMembership},
};
use secrecy::SecretString;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument, warn};

/// Navigation side-effect sink, implemented by the host router. Navigation
/// is always performed in response to a state change, never as part of
/// rendering.
pub trait Navigate: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Read-only view of the session for route guards and page chrome.
/// `is_authenticated` is derived from the principal, never stored.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub can_access_tenant: bool,
}

struct SessionState {
    principal: Option<Principal>,
    memberships: Vec<TenantMembership>,
    is_loading: bool,
    has_checked: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            principal: None,
            memberships: Vec::new(),
            is_loading: true,
            has_checked: false,
        }
    }
}

pub struct AuthSession<A> {
    api: Arc<A>,
    tokens: TokenStore,
    nav: Arc<dyn Navigate>,
    config: AuthConfig,
    state: Mutex<SessionState>,
}

impl<A: AuthApi> AuthSession<A> {
    #[must_use]
    pub fn new(
        api: Arc<A>,
        tokens: TokenStore,
        nav: Arc<dyn Navigate>,
        config: AuthConfig,
    ) -> Self {
        Self {
            api,
            tokens,
            nav,
            config,
            state: Mutex::new(SessionState::default()),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            is_authenticated: state.principal.is_some(),
            is_loading: state.is_loading,
            can_access_tenant: state
                .principal
                .as_ref()
                .is_some_and(|principal| principal.has_tenant)
                || !state.memberships.is_empty(),
        }
    }

    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.lock().principal.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().principal.is_some()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// The idempotent bootstrap check. The first caller runs the "who am I"
    /// flow; every later (or overlapping) caller returns immediately.
    ///
    /// # Errors
    /// Propagates transient failures so the UI can offer a retry; the
    /// session state is left untouched in that case.
    #[instrument(skip(self))]
    pub async fn check_auth(&self) -> Result<(), AuthError> {
        {
            // Claimed synchronously, before any await, so an overlapping
            // call cannot issue a second profile request.
            let mut state = self.lock();
            if state.has_checked {
                debug!("bootstrap already performed, skipping");
                return Ok(());
            }
            state.has_checked = true;
        }
        self.run_check().await
    }

    /// Explicit re-validation, bypassing the bootstrap guard. Used after
    /// profile-affecting operations or by a manual retry.
    ///
    /// # Errors
    /// Same contract as [`Self::check_auth`].
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), AuthError> {
        self.run_check().await
    }

    async fn run_check(&self) -> Result<(), AuthError> {
        let Some(token) = self.tokens.get() else {
            debug!("no stored token, session is signed out");
            self.apply_signed_out();
            return Ok(());
        };

        match self.api.profile(&token).await {
            Ok(principal) => {
                // Membership load is best-effort; an empty list only means
                // tenant-scoped areas stay hidden until the next refresh.
                let memberships = self
                    .api
                    .tenant_memberships(&token)
                    .await
                    .unwrap_or_default();
                let mut state = self.lock();
                state.principal = Some(principal);
                state.memberships = memberships;
                state.is_loading = false;
                Ok(())
            }
            Err(err) if err.is_unauthorized() => {
                debug!("authoritative unauthorized verdict, clearing session");
                self.tokens.clear();
                self.apply_signed_out();
                Ok(())
            }
            Err(err) => {
                // Transient failures carry no verdict: the current principal
                // (and token) must survive them.
                warn!(error = %err, "bootstrap check failed, keeping current session state");
                self.lock().is_loading = false;
                Err(err)
            }
        }
    }

    /// Establishes the session right after a successful login. Sets a
    /// provisional principal so guards unblock immediately; the next natural
    /// profile fetch reconciles it.
    pub fn login(&self, token: SecretString) {
        self.tokens.set(&token);
        let mut state = self.lock();
        state.principal = Some(Principal::provisional());
        state.is_loading = false;
        state.has_checked = true;
        debug!("session established, profile reconciliation pending");
    }

    /// Tears the session down and navigates to the login route. This is the
    /// only session method that navigates: logout is a global transition,
    /// not a component-local one.
    pub fn logout(&self) {
        self.tokens.clear();
        self.apply_signed_out();
        self.nav.navigate(&self.config.login_route);
    }

    fn apply_signed_out(&self) {
        let mut state = self.lock();
        state.principal = None;
        state.memberships.clear();
        state.is_loading = false;
        state.has_checked = true;
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
