//! Declarative route guards.
//!
//! Guards are pure decisions over a [`SessionSnapshot`]; navigation is a
//! separate side effect applied through [`enforce`]. While the bootstrap
//! check is still loading the only legal outcome is `Loading` — redirecting
//! during an in-flight bootstrap would bounce an already-authenticated user
//! to the login page. These are UX-only guards; real access control must
//! live on the API.

use crate::{
    config::AuthConfig,
    state::{Navigate, SessionSnapshot},
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GuardOutcome {
    /// Bootstrap still in flight: render a placeholder, never navigate.
    Loading,
    /// Render the wrapped content.
    Render,
    /// Navigate away and render nothing.
    Redirect(String),
}

/// Gate for authenticated-only routes.
#[must_use]
pub fn require_auth(snapshot: &SessionSnapshot, config: &AuthConfig) -> GuardOutcome {
    if snapshot.is_loading {
        return GuardOutcome::Loading;
    }
    if snapshot.is_authenticated {
        GuardOutcome::Render
    } else {
        GuardOutcome::Redirect(config.login_route.clone())
    }
}

/// Gate for anonymous-only routes (login, signup): the mirror image of
/// [`require_auth`].
#[must_use]
pub fn require_anonymous(snapshot: &SessionSnapshot, config: &AuthConfig) -> GuardOutcome {
    if snapshot.is_loading {
        return GuardOutcome::Loading;
    }
    if snapshot.is_authenticated {
        GuardOutcome::Redirect(config.dashboard_route.clone())
    } else {
        GuardOutcome::Render
    }
}

/// Gate for tenant-scoped routes. Missing tenant access degrades to the
/// user's own dashboard, not an error page.
#[must_use]
pub fn require_tenant_access(snapshot: &SessionSnapshot, config: &AuthConfig) -> GuardOutcome {
    if snapshot.is_loading {
        return GuardOutcome::Loading;
    }
    if !snapshot.is_authenticated {
        return GuardOutcome::Redirect(config.login_route.clone());
    }
    if snapshot.can_access_tenant {
        GuardOutcome::Render
    } else {
        GuardOutcome::Redirect(config.dashboard_route.clone())
    }
}

/// Applies a guard outcome, performing the navigation side effect when one
/// is called for. Returns whether the wrapped content should render.
pub fn enforce(outcome: &GuardOutcome, nav: &dyn Navigate) -> bool {
    match outcome {
        GuardOutcome::Render => true,
        GuardOutcome::Loading => false,
        GuardOutcome::Redirect(target) => {
            nav.navigate(target);
            false
        }
    }
}
