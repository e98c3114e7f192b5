//! # Eniro (Client Authentication & Session Core)
//!
//! `eniro` is the authentication and session-authorization core embedded in
//! multi-tenant identity consoles. It owns the tenant-scoped login state
//! machine, bearer token custody, the once-per-load session bootstrap, and
//! the declarative route guards built on top of it.
//!
//! ## Login flow
//!
//! A login page resolves its tenant code through [`tenant::TenantResolver`],
//! then drives [`machine::LoginMachine`]: primary credentials first, then —
//! when the account requires it — one of several second-factor methods
//! (TOTP, emailed code, WebAuthn passkey) with free switching between them.
//! The passkey branch runs [`webauthn::PasskeyCeremony`] against a
//! host-injected platform authenticator. Completion stores the bearer token,
//! establishes the session, and resolves the post-login redirect through an
//! open-redirect guard: targets without an explicit `http(s)://` scheme can
//! never leave the trusted origin.
//!
//! ## Session bootstrap
//!
//! [`state::AuthSession`] runs the "who am I" check exactly once per
//! application load. Only an authoritative unauthorized verdict may downgrade
//! the session; timeouts and server errors leave the current authentication
//! state untouched. Route guards in [`guards`] read the derived snapshot and
//! never redirect while the bootstrap is still in flight.
//!
//! ## Host seams
//!
//! Persistent storage ([`token::TokenStorage`]), navigation
//! ([`state::Navigate`]), the platform WebAuthn capability
//! ([`webauthn::PasskeyAuthenticator`]), and the API transport
//! ([`client::AuthApi`]) are all injected traits, so the core runs and tests
//! natively without a browser.

pub mod client;
pub mod config;
pub mod errors;
pub mod guards;
pub mod machine;
pub mod redirect;
pub mod state;
pub mod tenant;
pub mod token;
pub mod types;
pub mod webauthn;

pub use client::{APP_USER_AGENT, AuthApi, HttpAuthApi};
pub use config::AuthConfig;
pub use errors::AuthError;
pub use guards::{GuardOutcome, enforce, require_anonymous, require_auth, require_tenant_access};
pub use machine::{LoginAdvance, LoginMachine, LoginStep};
pub use redirect::resolve_post_login_target;
pub use state::{AuthSession, Navigate, SessionSnapshot};
pub use tenant::{ResolveTicket, TenantResolver};
pub use token::{MemoryTokenStorage, TokenStore, TokenStorage};
pub use types::{
    LoginOutcome, LoginRequest, LoginResponse, Principal, SecondFactorChallenge,
    SecondFactorMethod, TenantContext, TenantMembership,
};
pub use webauthn::{PasskeyAuthenticator, PasskeyCeremony};
