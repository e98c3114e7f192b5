//! API client for the identity backend. The [`AuthApi`] trait is the
//! injection seam: the session, login machine, tenant resolver, and passkey
//! ceremony all talk through it, so their transition logic is testable
//! without a network. [`HttpAuthApi`] is the `reqwest`-backed implementation
//! with a uniform timeout and sanitized error bodies.

use crate::{
    config::AuthConfig,
    errors::AuthError,
    types::{
        LoginRequest, LoginResponse, MembershipListResponse, PasskeyLoginBeginRequest,
        PasskeyLoginFinishRequest, Principal, ProfileEnvelope, TenantContext, TenantMembership,
        TokenResponse, VerifySecondFactorRequest,
    },
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

/// Identity API surface consumed by the authentication core. Endpoint
/// payloads are a fixed external contract; see `types`.
#[allow(async_fn_in_trait)]
pub trait AuthApi: Send + Sync {
    /// Primary credential verification, optionally tenant-scoped.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError>;

    /// Code-based second-factor verification (TOTP, email).
    async fn verify_second_factor(
        &self,
        request: &VerifySecondFactorRequest,
    ) -> Result<TokenResponse, AuthError>;

    /// Requests a WebAuthn assertion challenge for the login identifier.
    async fn passkey_login_begin(&self, email: &str) -> Result<Value, AuthError>;

    /// Posts the signed assertion back for verification.
    async fn passkey_login_finish(
        &self,
        request: &PasskeyLoginFinishRequest,
    ) -> Result<TokenResponse, AuthError>;

    /// The "who am I" endpoint. Implementations map an authoritative 401 to
    /// [`AuthError::Unauthorized`].
    async fn profile(&self, token: &SecretString) -> Result<Principal, AuthError>;

    /// Tenant memberships of the current user; best-effort callers tolerate
    /// failure here.
    async fn tenant_memberships(
        &self,
        token: &SecretString,
    ) -> Result<Vec<TenantMembership>, AuthError>;

    /// Public tenant lookup by URL code. Implementations map 404 to
    /// [`AuthError::TenantNotFound`].
    async fn tenant_by_code(&self, code: &str) -> Result<TenantContext, AuthError>;
}

/// `reqwest`-backed [`AuthApi`] implementation.
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    config: AuthConfig,
}

impl HttpAuthApi {
    /// Builds the HTTP client with the configured timeout and user agent.
    ///
    /// # Errors
    /// Returns `AuthError::Config` if the configuration is invalid or the
    /// client cannot be constructed.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| AuthError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        self.config.build_url(path)
    }
}

impl AuthApi for HttpAuthApi {
    #[instrument(skip(self, request))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let response = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(request)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await
    }

    #[instrument(skip(self, request))]
    async fn verify_second_factor(
        &self,
        request: &VerifySecondFactorRequest,
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(self.url("/api/v1/auth/verify-2fa"))
            .json(request)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await
    }

    #[instrument(skip(self))]
    async fn passkey_login_begin(&self, email: &str) -> Result<Value, AuthError> {
        let request = PasskeyLoginBeginRequest {
            email: email.to_string(),
        };
        let response = self
            .client
            .post(self.url("/api/v1/passkey/login/begin"))
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await
    }

    #[instrument(skip(self, request))]
    async fn passkey_login_finish(
        &self,
        request: &PasskeyLoginFinishRequest,
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(self.url("/api/v1/passkey/login/finish"))
            .json(request)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await
    }

    #[instrument(skip(self, token))]
    async fn profile(&self, token: &SecretString) -> Result<Principal, AuthError> {
        let response = self
            .client
            .get(self.url("/api/v1/user/profile"))
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(map_request_error)?;
        let envelope: ProfileEnvelope = handle_json_response(response)
            .await
            .map_err(authoritative_unauthorized)?;
        Ok(envelope.into_principal())
    }

    #[instrument(skip(self, token))]
    async fn tenant_memberships(
        &self,
        token: &SecretString,
    ) -> Result<Vec<TenantMembership>, AuthError> {
        let response = self
            .client
            .get(self.url("/api/v1/user/tenants"))
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(map_request_error)?;
        let listing: MembershipListResponse = handle_json_response(response).await?;
        Ok(listing.data)
    }

    #[instrument(skip(self))]
    async fn tenant_by_code(&self, code: &str) -> Result<TenantContext, AuthError> {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/tenants/by-code/{code}")))
            .timeout(self.config.tenant_timeout)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await.map_err(|err| match err {
            AuthError::Http { status: 404, .. } => AuthError::TenantNotFound,
            other => other,
        })
    }
}

/// Maps transport failures with timeout detection; timeouts are surfaced
/// distinctly because they steer retry-eligible UI.
fn map_request_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::Timeout("request timed out, please try again".to_string())
    } else {
        AuthError::Network(format!("unable to reach the server: {err}"))
    }
}

/// Converts a profile-endpoint 401 into the authoritative verdict. Only the
/// "who am I" call may downgrade a session, so the mapping lives with it.
fn authoritative_unauthorized(err: AuthError) -> AuthError {
    match err {
        AuthError::Http { status: 401, .. } => AuthError::Unauthorized,
        other => other,
    }
}

async fn handle_json_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AuthError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AuthError::Parse(format!("failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::Http {
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }
}

/// Pulls the backend's `error`/`message` field out of an error body, falling
/// back to the sanitized raw body.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return sanitize_body(message);
            }
        }
    }
    sanitize_body(body)
}

/// Bounds error bodies so oversized or binary responses never reach the UI.
fn sanitize_body(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_error_message_prefers_error_field() {
        assert_eq!(
            extract_error_message(r#"{"error":"invalid email or password"}"#),
            "invalid email or password"
        );
        assert_eq!(
            extract_error_message(r#"{"message":"2FA not enabled"}"#),
            "2FA not enabled"
        );
        assert_eq!(extract_error_message("plain text"), "plain text");
    }

    #[test]
    fn sanitize_body_bounds_length() {
        let long = "x".repeat(5 * MAX_ERROR_CHARS);
        assert_eq!(sanitize_body(&long).chars().count(), MAX_ERROR_CHARS);
    }

    #[test]
    fn profile_401_is_authoritative() {
        let err = authoritative_unauthorized(AuthError::Http {
            status: 401,
            message: "unauthorized".to_string(),
        });
        assert!(err.is_unauthorized());

        let passthrough = authoritative_unauthorized(AuthError::Http {
            status: 500,
            message: "boom".to_string(),
        });
        assert!(passthrough.is_transient());
    }

    #[test]
    fn user_agent_names_the_crate() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
