//! Error taxonomy for the authentication core.
//!
//! Transport-level failures keep the HTTP status and a sanitized message so
//! callers can distinguish authoritative verdicts (401 on the profile
//! endpoint) from transient conditions (timeouts, connection errors, 5xx)
//! that must never downgrade an existing session.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or invalid local configuration; no request was attempted.
    #[error("Config error: {0}")]
    Config(String),

    /// Input rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend flagged the primary credentials as wrong. Triggers a full
    /// attempt reset in the login machine.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A second-factor proof was rejected; recoverable in place.
    #[error("Verification failed: {0}")]
    Verification(String),

    /// The platform lacks WebAuthn support; detected before offering the
    /// passkey option.
    #[error("Passkeys are not supported on this device")]
    Unsupported,

    /// The browser-native passkey ceremony failed (cancellation, no matching
    /// credential, timeout). Recoverable without resetting the attempt.
    #[error("Passkey ceremony failed: {0}")]
    Ceremony(String),

    /// Authoritative unauthorized verdict from the profile endpoint.
    #[error("Session is not authorized")]
    Unauthorized,

    /// The tenant code does not resolve to an active tenant. Terminal for the
    /// current login page visit.
    #[error("Tenant not found or disabled")]
    TenantNotFound,

    /// The client-side deadline elapsed before the backend answered.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The backend could not be reached at all.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP response with a sanitized body message.
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },

    /// The response body did not match any expected shape.
    #[error("Response error: {0}")]
    Parse(String),

    /// The request body could not be encoded.
    #[error("Request error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// True for failures that carry no authentication verdict: the session
    /// state must be left untouched when one of these surfaces.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// True only for the authoritative unauthorized verdict.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// The backend-supplied rejection message, when one exists. The login
    /// machine inspects this to detect the invalid-credentials signal.
    #[must_use]
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } | Self::Verification(message) => Some(message),
            _ => None,
        }
    }
}
