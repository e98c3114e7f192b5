//! Passkey assertion ceremony.
//!
//! ### Flow Overview
//! 1. Request an assertion challenge for the login identifier (the server
//!    does not yet know which credential will answer).
//! 2. Hand the options to the platform authenticator, which drives the
//!    OS-level biometric or security-key prompt. This step is long-running
//!    and cancellable only by the user.
//! 3. Post the signed assertion back and exchange it for a bearer token.
//!
//! The platform half lives behind [`PasskeyAuthenticator`] so the ceremony
//! and the login machine are testable without a browser or security key.

use crate::{
    client::AuthApi,
    errors::AuthError,
    types::{PasskeyLoginFinishRequest, TokenResponse},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Platform WebAuthn capability (`navigator.credentials.get` or an OS
/// equivalent), injected by the host shell.
#[allow(async_fn_in_trait)]
pub trait PasskeyAuthenticator: Send + Sync {
    /// Pure feature probe; no network and no user-facing prompt. Must be
    /// consulted before the passkey option is offered at all.
    fn is_supported(&self) -> bool;

    /// Runs the native assertion ceremony for the given request options and
    /// returns the signed assertion in the backend's JSON shape. Failures
    /// (user cancellation, no matching credential, timeout) surface as
    /// [`AuthError::Ceremony`].
    async fn get_assertion(&self, options: &Value) -> Result<Value, AuthError>;
}

/// Orchestrates challenge request, platform assertion, and token exchange.
pub struct PasskeyCeremony<A, P> {
    api: Arc<A>,
    platform: P,
}

impl<A: AuthApi, P: PasskeyAuthenticator> PasskeyCeremony<A, P> {
    #[must_use]
    pub fn new(api: Arc<A>, platform: P) -> Self {
        Self { api, platform }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.platform.is_supported()
    }

    /// Runs the full assertion flow keyed by the login identifier.
    ///
    /// # Errors
    /// `AuthError::Unsupported` when the platform lacks WebAuthn (checked
    /// before any network call), `AuthError::Ceremony` for platform
    /// failures, `AuthError::Parse` for malformed challenge options, and
    /// transport/rejection errors from the exchange verbatim.
    #[instrument(skip(self))]
    pub async fn authenticate(&self, identifier: &str) -> Result<SecretString, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AuthError::Validation(
                "login identifier is required for a passkey assertion".to_string(),
            ));
        }
        if !self.platform.is_supported() {
            return Err(AuthError::Unsupported);
        }

        let options = self.api.passkey_login_begin(identifier).await?;
        let challenge = extract_challenge(&options)?;
        let assertion = self.platform.get_assertion(&options).await?;

        let finish = PasskeyLoginFinishRequest {
            email: identifier.to_string(),
            challenge,
            assertion,
        };
        let tokens: TokenResponse = self.api.passkey_login_finish(&finish).await?;
        Ok(tokens.into_token())
    }
}

/// Pulls the base64url challenge out of the request options. The options may
/// or may not be wrapped in a `publicKey` envelope depending on the backend
/// serializer.
fn extract_challenge(options: &Value) -> Result<String, AuthError> {
    let public_key = options.get("publicKey").unwrap_or(options);
    let challenge = public_key
        .get("challenge")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AuthError::Parse("passkey options are missing a challenge".to_string())
        })?;

    let unpadded = challenge.trim_end_matches('=');
    Base64UrlUnpadded::decode_vec(unpadded)
        .map_err(|_| AuthError::Parse("passkey challenge is not base64url".to_string()))?;
    Ok(challenge.to_string())
}
