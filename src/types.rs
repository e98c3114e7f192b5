//! Wire types for the identity API. The endpoint contract is fixed; field
//! names follow the backend exactly, including the `2fa_type` key on the
//! login response.

use crate::errors::AuthError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Second-factor methods a user may complete after primary verification.
/// Unknown wire values fail decoding loudly rather than being guessed at.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondFactorMethod {
    Totp,
    Email,
    Passkey,
}

impl SecondFactorMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Totp => "totp",
            Self::Email => "email",
            Self::Passkey => "passkey",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
    /// Present when the login page is tenant-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<u64>,
}

/// Polymorphic login response: either a bearer token, or a second-factor
/// challenge carrying the full set of methods available to the account.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub need_2fa: bool,
    #[serde(rename = "2fa_type", default)]
    pub two_fa_type: Option<SecondFactorMethod>,
    #[serde(default)]
    pub available_2fa_methods: Vec<SecondFactorMethod>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Tagged form of [`LoginResponse`], produced by [`LoginResponse::into_outcome`].
#[derive(Debug)]
pub enum LoginOutcome {
    Token(SecretString),
    SecondFactor(SecondFactorChallenge),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SecondFactorChallenge {
    pub user_id: u64,
    /// The backend's suggested method.
    pub primary: SecondFactorMethod,
    /// Every method the account can complete; the user may switch freely.
    pub available: Vec<SecondFactorMethod>,
}

impl LoginResponse {
    /// Classifies the response into a tagged outcome instead of probing
    /// fields at the call sites.
    ///
    /// # Errors
    /// Returns `AuthError::Parse` when the response carries neither a token
    /// nor a usable second-factor challenge.
    pub fn into_outcome(self) -> Result<LoginOutcome, AuthError> {
        if self.need_2fa {
            let user_id = self.user_id.ok_or_else(|| {
                AuthError::Parse("second-factor challenge is missing user_id".to_string())
            })?;
            let primary = self
                .two_fa_type
                .or_else(|| self.available_2fa_methods.first().copied())
                .ok_or_else(|| {
                    AuthError::Parse("second-factor challenge names no method".to_string())
                })?;
            let mut available = self.available_2fa_methods;
            if available.is_empty() {
                available.push(primary);
            }
            return Ok(LoginOutcome::SecondFactor(SecondFactorChallenge {
                user_id,
                primary,
                available,
            }));
        }

        match self.access_token {
            Some(token) if !token.is_empty() => Ok(LoginOutcome::Token(SecretString::from(token))),
            _ => Err(AuthError::Parse(
                "login response carried neither a token nor a second-factor challenge".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifySecondFactorRequest {
    pub user_id: u64,
    pub two_fa_type: SecondFactorMethod,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

impl TokenResponse {
    #[must_use]
    pub fn into_token(self) -> SecretString {
        SecretString::from(self.access_token)
    }
}

#[derive(Debug, Serialize)]
pub struct PasskeyLoginBeginRequest {
    pub email: String,
}

/// Finish payload: the original challenge echoed back alongside the
/// platform's assertion fields, flattened to match the backend contract.
#[derive(Debug, Serialize)]
pub struct PasskeyLoginFinishRequest {
    pub email: String,
    pub challenge: String,
    #[serde(flatten)]
    pub assertion: serde_json::Value,
}

/// The authenticated identity as the profile endpoint reports it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: u64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default)]
    pub has_tenant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<u64>,
}

impl Principal {
    /// Placeholder identity set right after login so guards unblock without
    /// waiting for a round trip. Reconciled by the next profile fetch.
    #[must_use]
    pub fn provisional() -> Self {
        Self {
            id: 0,
            email: String::new(),
            phone: None,
            nickname: None,
            avatar_url: None,
            is_super_admin: false,
            has_tenant: false,
            tenant_id: None,
        }
    }
}

/// The profile endpoint answers with either `{"data": principal}` or a bare
/// principal depending on the route group. Both shapes are accepted here;
/// anything else is a hard parse error.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProfileEnvelope {
    Wrapped { data: Principal },
    Bare(Principal),
}

impl ProfileEnvelope {
    #[must_use]
    pub fn into_principal(self) -> Principal {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(principal) => principal,
        }
    }
}

/// Tenant identity resolved from a URL tenant code.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TenantContext {
    pub id: u64,
    pub name: String,
    pub code: String,
}

/// A tenant the user belongs to, from the membership listing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Listing endpoints wrap their payload in a `data` envelope.
#[derive(Debug, Deserialize)]
pub struct MembershipListResponse {
    #[serde(default)]
    pub data: Vec<TenantMembership>,
}
