//! Public tenant resolution from URL codes.
//!
//! Lookups are cached per code and committed through a generation guard: a
//! resolution started for tenant A must never overwrite the context after the
//! user has navigated to tenant B and B's resolution already committed. Error
//! classification matters to the operator: "not found" is a terminal
//! misconfiguration view, a timeout is retry-eligible backend unavailability.

use crate::{client::AuthApi, errors::AuthError, types::TenantContext};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use tracing::{debug, instrument};

/// Handle for one resolution request. Holds the normalized code and the
/// generation captured when the request began.
#[derive(Clone, Debug)]
pub struct ResolveTicket {
    code: String,
    generation: u64,
}

impl ResolveTicket {
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

pub struct TenantResolver<A> {
    api: Arc<A>,
    cache: Mutex<HashMap<String, TenantContext>>,
    current: Mutex<Option<TenantContext>>,
    generation: AtomicU64,
}

impl<A: AuthApi> TenantResolver<A> {
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            cache: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Starts a resolution for a tenant code, invalidating any still-in-flight
    /// older request. Call this again whenever the route's tenant-code
    /// parameter changes.
    ///
    /// # Errors
    /// Returns `AuthError::Validation` for an empty code.
    pub fn begin(&self, code: &str) -> Result<ResolveTicket, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::Validation("tenant code is required".to_string()));
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ResolveTicket {
            code: code.to_string(),
            generation,
        })
    }

    /// Resolves the ticket's tenant code. Returns the committed context, or
    /// `None` when a newer request superseded this one while it was in
    /// flight (the stale result is discarded, never committed).
    ///
    /// # Errors
    /// `AuthError::TenantNotFound` for unknown or disabled tenants,
    /// `AuthError::Timeout` when the client-side deadline elapsed, other
    /// transport errors verbatim.
    #[instrument(skip(self, ticket), fields(code = %ticket.code))]
    pub async fn resolve(
        &self,
        ticket: &ResolveTicket,
    ) -> Result<Option<TenantContext>, AuthError> {
        if let Some(hit) = self.cached(&ticket.code) {
            return Ok(self.commit(ticket, hit));
        }

        let tenant = self.api.tenant_by_code(&ticket.code).await?;
        {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            cache.insert(ticket.code.clone(), tenant.clone());
        }
        Ok(self.commit(ticket, tenant))
    }

    /// The most recently committed tenant context, if any.
    #[must_use]
    pub fn current(&self) -> Option<TenantContext> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cached(&self, code: &str) -> Option<TenantContext> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(code).cloned()
    }

    fn commit(&self, ticket: &ResolveTicket, tenant: TenantContext) -> Option<TenantContext> {
        if self.generation.load(Ordering::SeqCst) != ticket.generation {
            debug!(
                code = %ticket.code,
                "discarding stale tenant resolution superseded by a newer request"
            );
            return None;
        }
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = Some(tenant.clone());
        Some(tenant)
    }
}
