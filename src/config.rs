//! Console configuration: API base, trusted redirect origin, token storage
//! key, and guard routes. Values are public; do not store secrets here.
//!
//! The storage key varies per console instance so that user, tenant, and
//! admin front-ends served from one origin do not clobber each other's
//! tokens.

use crate::errors::AuthError;
use std::time::Duration;
use url::Url;

/// Default request timeout applied to all API calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default deadline for public tenant lookups, which run before login and
/// deserve a longer window than authenticated traffic.
pub const DEFAULT_TENANT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Base URL of the identity API, no trailing slash required.
    pub api_base_url: String,
    /// Origin that relative post-login redirect targets are joined to.
    pub trusted_redirect_base: String,
    /// Storage key for the bearer token in the host's persistent storage.
    pub storage_key: String,
    /// Route guards redirect unauthenticated visitors here.
    pub login_route: String,
    /// Default authenticated landing route.
    pub dashboard_route: String,
    pub request_timeout: Duration,
    pub tenant_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            trusted_redirect_base: String::new(),
            storage_key: "access_token".to_string(),
            login_route: "/login".to_string(),
            dashboard_route: "/dashboard".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tenant_timeout: DEFAULT_TENANT_TIMEOUT,
        }
    }
}

impl AuthConfig {
    /// Checks that both base URLs are present and parse as http(s) origins.
    ///
    /// # Errors
    /// Returns `AuthError::Config` when a base is missing or malformed.
    pub fn validate(&self) -> Result<(), AuthError> {
        validate_base("api_base_url", &self.api_base_url)?;
        validate_base("trusted_redirect_base", &self.trusted_redirect_base)?;
        Ok(())
    }

    /// Builds a URL from the configured API base and the provided path.
    #[must_use]
    pub fn build_url(&self, path: &str) -> String {
        let base = self.api_base_url.trim().trim_end_matches('/');
        let path = path.trim();

        if base.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }
}

fn validate_base(name: &str, value: &str) -> Result<(), AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::Config(format!("{name} is not configured")));
    }
    let url = Url::parse(trimmed)
        .map_err(|err| AuthError::Config(format!("{name} is not a valid URL: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AuthError::Config(format!(
            "{name} must use http or https, got {}",
            url.scheme()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            api_base_url: "https://id.example.com".to_string(),
            trusted_redirect_base: "https://console.example.com".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn build_url_joins_without_double_slashes() {
        let mut config = config();
        config.api_base_url = "https://id.example.com/".to_string();
        assert_eq!(
            config.build_url("/api/v1/auth/login"),
            "https://id.example.com/api/v1/auth/login"
        );
        assert_eq!(
            config.build_url("api/v1/auth/login"),
            "https://id.example.com/api/v1/auth/login"
        );
    }

    #[test]
    fn validate_accepts_http_origins() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_or_non_http_bases() {
        let mut missing = config();
        missing.api_base_url = "  ".to_string();
        assert!(matches!(missing.validate(), Err(AuthError::Config(_))));

        let mut odd_scheme = config();
        odd_scheme.trusted_redirect_base = "ftp://console.example.com".to_string();
        assert!(matches!(odd_scheme.validate(), Err(AuthError::Config(_))));
    }
}
