//! Identity gate
//!
//! Every store call needs a principal. The gate signs in anonymously on
//! first use and hands the same principal to every later caller, until a
//! store rejects its token.

use std::sync::Arc;

use async_trait::async_trait;
use shared::AnonymousSession;
use tokio::sync::Mutex;

use crate::http::HttpClient;
use crate::{ClientResult, FormError};

const ANONYMOUS_SIGN_IN_PATH: &str = "/api/auth/anonymous";

/// Signed-in anonymous identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    /// Bearer token for store calls
    pub token: String,
    /// Unix seconds
    pub expires_at: i64,
}

impl From<AnonymousSession> for Principal {
    fn from(session: AnonymousSession) -> Self {
        Self {
            uid: session.uid,
            token: session.token,
            expires_at: session.expires_at,
        }
    }
}

/// Source of anonymous principals
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_in_anonymously(&self) -> ClientResult<Principal>;
}

/// Anonymous sign-in against the record server
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    http: HttpClient,
}

impl HttpAuthBackend {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn sign_in_anonymously(&self) -> ClientResult<Principal> {
        let session: AnonymousSession = self.http.post_empty(ANONYMOUS_SIGN_IN_PATH, None).await?;
        tracing::info!(uid = %session.uid, "signed in anonymously");
        Ok(session.into())
    }
}

/// Single-flight anonymous sign-in
///
/// Concurrent callers wait on one sign-in: the lock is held across it. A
/// failed sign-in leaves the gate empty so the next call tries again.
pub struct IdentityGate {
    backend: Arc<dyn AuthBackend>,
    principal: Mutex<Option<Principal>>,
}

impl IdentityGate {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            principal: Mutex::new(None),
        }
    }

    /// Current principal, signing in first when there is none
    pub async fn ensure_identity(&self) -> Result<Principal, FormError> {
        let mut slot = self.principal.lock().await;
        if let Some(principal) = slot.as_ref() {
            return Ok(principal.clone());
        }

        let principal = self.backend.sign_in_anonymously().await.map_err(|e| {
            tracing::warn!(error = %e, "anonymous sign-in failed");
            FormError::Auth(e.to_string())
        })?;
        *slot = Some(principal.clone());
        Ok(principal)
    }

    /// Forget `stale` after a store rejected its token
    ///
    /// A principal obtained by a newer sign-in is kept.
    pub async fn invalidate(&self, stale: &Principal) {
        let mut slot = self.principal.lock().await;
        if slot.as_ref().is_some_and(|p| p.token == stale.token) {
            tracing::info!(uid = %stale.uid, "token rejected, next call signs in again");
            *slot = None;
        }
    }

    /// Principal if sign-in already happened
    pub async fn current(&self) -> Option<Principal> {
        self.principal.lock().await.clone()
    }
}

impl std::fmt::Debug for IdentityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let signed_in = self.principal.try_lock().map(|p| p.is_some()).ok();
        f.debug_struct("IdentityGate")
            .field("signed_in", &signed_in)
            .finish()
    }
}
