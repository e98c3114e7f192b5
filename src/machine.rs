//! Tenant-scoped login state machine.
//!
//! ### Flow Overview
//! 1. `Credentials`: identifier + password, optionally scoped to a resolved
//!    tenant. Either yields a token directly or a second-factor challenge.
//! 2. `SecondFactor`: the user may switch freely among every method the
//!    account offers (switching is a pure local transition). TOTP and email
//!    codes go to the verify endpoint; the passkey branch runs the WebAuthn
//!    ceremony keyed by the login identifier instead.
//! 3. Completion: token into the store, session established, post-login
//!    redirect resolved through the open-redirect guard, navigation.
//!
//! A rejection that names the primary credentials as invalid — even one
//! surfacing at the second-factor stage — resets the whole attempt so no
//! stale `user_id` or entered code can leak into the next try.

use crate::{
    client::AuthApi,
    config::AuthConfig,
    errors::AuthError,
    redirect::resolve_post_login_target,
    state::{AuthSession, Navigate},
    types::{
        LoginOutcome, LoginRequest, SecondFactorChallenge, SecondFactorMethod, TenantContext,
        VerifySecondFactorRequest,
    },
    webauthn::{PasskeyAuthenticator, PasskeyCeremony},
};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Backend phrasings that mean the account credentials themselves are wrong.
const INVALID_CREDENTIAL_SIGNALS: [&str; 2] = ["invalid credentials", "invalid email or password"];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoginStep {
    Credentials,
    SecondFactor,
}

/// What a successful submission led to.
#[derive(Debug)]
pub enum LoginAdvance {
    /// A second factor is required; the machine moved to `SecondFactor`.
    SecondFactorRequired,
    /// The attempt finished; navigation to `target` was triggered.
    LoggedIn { target: String },
}

/// Working memory of the second-factor stage. Codes are kept per method so
/// switching back and forth does not resurrect a cleared entry.
#[derive(Clone, Debug)]
struct SecondFactorAttempt {
    user_id: u64,
    selected: SecondFactorMethod,
    available: Vec<SecondFactorMethod>,
    totp_code: String,
    email_code: String,
}

impl SecondFactorAttempt {
    fn from_challenge(challenge: SecondFactorChallenge) -> Self {
        Self {
            user_id: challenge.user_id,
            selected: challenge.primary,
            available: challenge.available,
            totp_code: String::new(),
            email_code: String::new(),
        }
    }

    fn code(&self) -> &str {
        match self.selected {
            SecondFactorMethod::Totp => &self.totp_code,
            SecondFactorMethod::Email => &self.email_code,
            SecondFactorMethod::Passkey => "",
        }
    }
}

pub struct LoginMachine<A, P> {
    api: Arc<A>,
    session: Arc<AuthSession<A>>,
    ceremony: PasskeyCeremony<A, P>,
    nav: Arc<dyn Navigate>,
    config: AuthConfig,
    tenant: Option<TenantContext>,
    redirect_target: Option<String>,
    identifier: String,
    step: LoginStep,
    second_factor: Option<SecondFactorAttempt>,
    last_error: Option<String>,
}

impl<A: AuthApi, P: PasskeyAuthenticator> LoginMachine<A, P> {
    #[must_use]
    pub fn new(
        api: Arc<A>,
        session: Arc<AuthSession<A>>,
        ceremony: PasskeyCeremony<A, P>,
        nav: Arc<dyn Navigate>,
        config: AuthConfig,
    ) -> Self {
        Self {
            api,
            session,
            ceremony,
            nav,
            config,
            tenant: None,
            redirect_target: None,
            identifier: String::new(),
            step: LoginStep::Credentials,
            second_factor: None,
            last_error: None,
        }
    }

    /// Scopes the attempt to a resolved tenant; its id rides along on the
    /// credential check.
    #[must_use]
    pub fn with_tenant(mut self, tenant: TenantContext) -> Self {
        self.tenant = Some(tenant);
        self
    }

    /// Records the redirect target requested by the calling application. It
    /// is validated at completion, never trusted as-is.
    #[must_use]
    pub fn with_redirect(mut self, target: Option<String>) -> Self {
        self.redirect_target = target.filter(|t| !t.trim().is_empty());
        self
    }

    #[must_use]
    pub fn step(&self) -> LoginStep {
        self.step
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn selected_method(&self) -> Option<SecondFactorMethod> {
        self.second_factor.as_ref().map(|attempt| attempt.selected)
    }

    /// Every method this account may complete, empty outside `SecondFactor`.
    #[must_use]
    pub fn available_methods(&self) -> &[SecondFactorMethod] {
        self.second_factor
            .as_ref()
            .map_or(&[], |attempt| attempt.available.as_slice())
    }

    #[must_use]
    pub fn pending_user_id(&self) -> Option<u64> {
        self.second_factor.as_ref().map(|attempt| attempt.user_id)
    }

    /// The code currently entered for the selected method.
    #[must_use]
    pub fn entered_code(&self) -> &str {
        self.second_factor.as_ref().map_or("", SecondFactorAttempt::code)
    }

    /// Whether the passkey branch can be offered at all.
    #[must_use]
    pub fn passkey_supported(&self) -> bool {
        self.ceremony.is_supported()
    }

    /// Step one: primary credential verification.
    ///
    /// # Errors
    /// `AuthError::Validation` before any network call for empty input;
    /// `AuthError::InvalidCredentials` (after a full attempt reset) when the
    /// backend flags the credentials; other failures verbatim, retryable in
    /// place.
    #[instrument(skip(self, password), fields(tenant = self.tenant.as_ref().map(|t| t.id)))]
    pub async fn submit_credentials(
        &mut self,
        identifier: &str,
        password: &str,
    ) -> Result<LoginAdvance, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(self.fail(AuthError::Validation(
                "identifier and password are required".to_string(),
            )));
        }
        self.identifier = identifier.to_string();

        let request = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
            tenant_id: self.tenant.as_ref().map(|tenant| tenant.id),
        };
        let response = match self.api.login(&request).await {
            Ok(response) => response,
            Err(err) => return Err(self.classify_rejection(err)),
        };

        match response.into_outcome() {
            Ok(LoginOutcome::Token(token)) => Ok(self.complete_login(token)),
            Ok(LoginOutcome::SecondFactor(challenge)) => {
                debug!(
                    user_id = challenge.user_id,
                    methods = challenge.available.len(),
                    "second factor required"
                );
                self.step = LoginStep::SecondFactor;
                self.second_factor = Some(SecondFactorAttempt::from_challenge(challenge));
                self.last_error = None;
                Ok(LoginAdvance::SecondFactorRequired)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Switches the active second-factor method. Pure local transition: no
    /// network call; clears the previous method's entered code and the
    /// current error.
    ///
    /// # Errors
    /// `AuthError::Validation` when no challenge is in progress or the
    /// method is not available to this account.
    pub fn switch_method(&mut self, method: SecondFactorMethod) -> Result<(), AuthError> {
        let Some(attempt) = self.second_factor.as_mut() else {
            return Err(AuthError::Validation(
                "no second-factor challenge in progress".to_string(),
            ));
        };
        if !attempt.available.contains(&method) {
            return Err(AuthError::Validation(format!(
                "method {} is not available for this account",
                method.as_str()
            )));
        }
        match attempt.selected {
            SecondFactorMethod::Totp => attempt.totp_code.clear(),
            SecondFactorMethod::Email => attempt.email_code.clear(),
            SecondFactorMethod::Passkey => {}
        }
        attempt.selected = method;
        self.last_error = None;
        Ok(())
    }

    /// Records the code the user typed for the selected method.
    pub fn set_code(&mut self, code: &str) {
        if let Some(attempt) = self.second_factor.as_mut() {
            match attempt.selected {
                SecondFactorMethod::Totp => attempt.totp_code = code.to_string(),
                SecondFactorMethod::Email => attempt.email_code = code.to_string(),
                SecondFactorMethod::Passkey => {}
            }
        }
    }

    /// Step two: verifies the selected second factor.
    ///
    /// Code methods submit to the verify endpoint. The passkey branch runs
    /// the assertion ceremony instead, keyed by the login identifier; a
    /// ceremony failure is recoverable in place (retry the gesture or switch
    /// method), never a full reset.
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` (with full reset) when the backend
    /// signals bad primary credentials; `AuthError::Ceremony`,
    /// `AuthError::Verification`, and transport errors verbatim otherwise.
    #[instrument(skip(self), fields(method = self.selected_method().map(SecondFactorMethod::as_str)))]
    pub async fn submit_second_factor(&mut self) -> Result<LoginAdvance, AuthError> {
        let Some(attempt) = self.second_factor.clone() else {
            return Err(self.fail(AuthError::Validation(
                "no second-factor challenge in progress".to_string(),
            )));
        };

        if attempt.selected == SecondFactorMethod::Passkey {
            let identifier = self.identifier.clone();
            return match self.ceremony.authenticate(&identifier).await {
                Ok(token) => Ok(self.complete_login(token)),
                Err(err) => Err(self.fail(err)),
            };
        }

        let code = attempt.code().trim().to_string();
        if code.is_empty() {
            return Err(self.fail(AuthError::Validation(
                "verification code is required".to_string(),
            )));
        }

        let request = VerifySecondFactorRequest {
            user_id: attempt.user_id,
            two_fa_type: attempt.selected,
            code,
        };
        match self.api.verify_second_factor(&request).await {
            Ok(tokens) => Ok(self.complete_login(tokens.into_token())),
            Err(err) => {
                // Email codes are single-use; a failed attempt consumes the
                // code. TOTP codes may be retried until the window rolls.
                if attempt.selected == SecondFactorMethod::Email {
                    if let Some(current) = self.second_factor.as_mut() {
                        current.email_code.clear();
                    }
                }
                Err(self.classify_rejection(err))
            }
        }
    }

    /// Finishes the attempt: session established, redirect target resolved
    /// through the open-redirect guard, navigation triggered. The attempt's
    /// working memory is discarded.
    fn complete_login(&mut self, token: SecretString) -> LoginAdvance {
        self.session.login(token);
        let target = resolve_post_login_target(
            self.redirect_target.as_deref(),
            &self.config.trusted_redirect_base,
            &self.config.dashboard_route,
        );
        info!(target = %target, "login complete");
        self.reset_attempt();
        self.nav.navigate(&target);
        LoginAdvance::LoggedIn { target }
    }

    /// Maps a backend rejection, resetting the whole attempt when the
    /// message names the primary credentials. Anything else stays
    /// retry-in-place.
    fn classify_rejection(&mut self, err: AuthError) -> AuthError {
        if let Some(message) = err.rejection_message() {
            if is_invalid_credential_signal(message) {
                debug!("invalid-credential signal, resetting the whole attempt");
                self.reset_attempt();
                let err = AuthError::InvalidCredentials;
                self.last_error = Some(err.to_string());
                return err;
            }
        }
        self.fail(err)
    }

    /// Back to `Credentials` with no residue: user id, method selection,
    /// entered codes, and error are all dropped.
    fn reset_attempt(&mut self) {
        self.step = LoginStep::Credentials;
        self.second_factor = None;
        self.last_error = None;
    }

    fn fail(&mut self, err: AuthError) -> AuthError {
        self.last_error = Some(err.to_string());
        err
    }
}

fn is_invalid_credential_signal(message: &str) -> bool {
    let lowered = message.to_lowercase();
    INVALID_CREDENTIAL_SIGNALS
        .iter()
        .any(|signal| lowered.contains(signal))
}
