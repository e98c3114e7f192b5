//! Shared test doubles: a scripted API, a recording navigator, and a
//! scripted platform authenticator.
#![allow(dead_code)]

use eniro::{
    types::{LoginResponse, PasskeyLoginFinishRequest, TokenResponse, VerifySecondFactorRequest},
    AuthApi, AuthConfig, AuthError, AuthSession, LoginMachine, LoginRequest, MemoryTokenStorage,
    Navigate, PasskeyAuthenticator, PasskeyCeremony, Principal, TenantContext, TenantMembership,
    TokenStore,
};
use secrecy::SecretString;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

type Scripted<T> = Mutex<VecDeque<Result<T, AuthError>>>;

#[derive(Default)]
pub struct FakeApi {
    pub login_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub membership_calls: AtomicUsize,
    pub tenant_calls: AtomicUsize,
    pub passkey_begin_calls: AtomicUsize,
    pub passkey_finish_calls: AtomicUsize,

    /// Serialized form of the most recent login request, for asserting on
    /// the exact payload sent over the wire.
    pub last_login_payload: Mutex<Option<Value>>,

    login_responses: Scripted<LoginResponse>,
    verify_responses: Scripted<TokenResponse>,
    profile_responses: Scripted<Principal>,
    membership_responses: Scripted<Vec<TenantMembership>>,
    tenant_responses: Scripted<TenantContext>,
    passkey_options: Scripted<Value>,
    passkey_tokens: Scripted<TokenResponse>,

    /// When set, `profile` yields before answering so overlapping bootstrap
    /// calls genuinely interleave.
    pub profile_delay: Option<Duration>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_login(&self, response: Result<LoginResponse, AuthError>) {
        self.login_responses.lock().unwrap().push_back(response);
    }

    pub fn script_verify(&self, response: Result<TokenResponse, AuthError>) {
        self.verify_responses.lock().unwrap().push_back(response);
    }

    pub fn script_profile(&self, response: Result<Principal, AuthError>) {
        self.profile_responses.lock().unwrap().push_back(response);
    }

    pub fn script_memberships(&self, response: Result<Vec<TenantMembership>, AuthError>) {
        self.membership_responses.lock().unwrap().push_back(response);
    }

    pub fn script_tenant(&self, response: Result<TenantContext, AuthError>) {
        self.tenant_responses.lock().unwrap().push_back(response);
    }

    pub fn script_passkey_options(&self, response: Result<Value, AuthError>) {
        self.passkey_options.lock().unwrap().push_back(response);
    }

    pub fn script_passkey_token(&self, response: Result<TokenResponse, AuthError>) {
        self.passkey_tokens.lock().unwrap().push_back(response);
    }
}

fn pop<T>(queue: &Scripted<T>, endpoint: &str) -> Result<T, AuthError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| panic!("unscripted call to {endpoint}"))
}

impl AuthApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let payload = serde_json::to_value(request).expect("login request serializes");
        *self.last_login_payload.lock().unwrap() = Some(payload);
        pop(&self.login_responses, "login")
    }

    async fn verify_second_factor(
        &self,
        _request: &VerifySecondFactorRequest,
    ) -> Result<TokenResponse, AuthError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.verify_responses, "verify_second_factor")
    }

    async fn passkey_login_begin(&self, _email: &str) -> Result<Value, AuthError> {
        self.passkey_begin_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.passkey_options, "passkey_login_begin")
    }

    async fn passkey_login_finish(
        &self,
        _request: &PasskeyLoginFinishRequest,
    ) -> Result<TokenResponse, AuthError> {
        self.passkey_finish_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.passkey_tokens, "passkey_login_finish")
    }

    async fn profile(&self, _token: &SecretString) -> Result<Principal, AuthError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.profile_delay {
            tokio::time::sleep(delay).await;
        }
        pop(&self.profile_responses, "profile")
    }

    async fn tenant_memberships(
        &self,
        _token: &SecretString,
    ) -> Result<Vec<TenantMembership>, AuthError> {
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.membership_responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn tenant_by_code(&self, _code: &str) -> Result<TenantContext, AuthError> {
        self.tenant_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.tenant_responses, "tenant_by_code")
    }
}

#[derive(Default)]
pub struct RecordingNav {
    targets: Mutex<Vec<String>>,
}

impl RecordingNav {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

impl Navigate for RecordingNav {
    fn navigate(&self, target: &str) {
        self.targets.lock().unwrap().push(target.to_string());
    }
}

/// Platform authenticator double; support is fixed at construction and
/// assertion outcomes are scripted like the API's.
#[derive(Clone)]
pub struct ScriptedPasskey {
    inner: Arc<PasskeyInner>,
}

struct PasskeyInner {
    supported: bool,
    assertions: Scripted<Value>,
}

impl ScriptedPasskey {
    pub fn new(supported: bool) -> Self {
        Self {
            inner: Arc::new(PasskeyInner {
                supported,
                assertions: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn script_assertion(&self, response: Result<Value, AuthError>) {
        self.inner.assertions.lock().unwrap().push_back(response);
    }
}

impl PasskeyAuthenticator for ScriptedPasskey {
    fn is_supported(&self) -> bool {
        self.inner.supported
    }

    async fn get_assertion(&self, _options: &Value) -> Result<Value, AuthError> {
        pop(&self.inner.assertions, "get_assertion")
    }
}

pub fn test_config() -> AuthConfig {
    AuthConfig {
        api_base_url: "https://id.example.com".to_string(),
        trusted_redirect_base: "https://console.example.com".to_string(),
        ..AuthConfig::default()
    }
}

pub fn test_session(
    api: Arc<FakeApi>,
    nav: Arc<RecordingNav>,
) -> (Arc<AuthSession<FakeApi>>, TokenStore) {
    let config = test_config();
    let tokens = TokenStore::new(Arc::new(MemoryTokenStorage::new()), config.storage_key.clone());
    let session = Arc::new(AuthSession::new(api, tokens.clone(), nav, config));
    (session, tokens)
}

pub fn test_machine(
    api: Arc<FakeApi>,
    session: Arc<AuthSession<FakeApi>>,
    nav: Arc<RecordingNav>,
    passkey: ScriptedPasskey,
) -> LoginMachine<FakeApi, ScriptedPasskey> {
    let ceremony = PasskeyCeremony::new(api.clone(), passkey);
    LoginMachine::new(api, session, ceremony, nav, test_config())
}

pub fn bearer(token: &str) -> SecretString {
    SecretString::from(token.to_string())
}

pub fn principal(id: u64, email: &str) -> Principal {
    Principal {
        id,
        email: email.to_string(),
        phone: None,
        nickname: None,
        avatar_url: None,
        is_super_admin: false,
        has_tenant: false,
        tenant_id: None,
    }
}

pub fn token_response(token: &str) -> TokenResponse {
    TokenResponse {
        access_token: token.to_string(),
    }
}
