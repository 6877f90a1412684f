//! Star Gate
//!
//! Owns the visitor's identity and whether it has been verified against the
//! star-verification service. Verification is revocable: the submission flow
//! calls `revoke()` when the analysis service refuses the identity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, instrument, warn};

use crate::error::{GateError, Operation};
use crate::service::SymptomService;

pub const VERIFY_UNAVAILABLE: &str = "Unable to verify. Please check your username and try again.";
pub const MISSING_USERNAME: &str = "Please enter your GitHub username";

/// A user-facing message paired with the link that resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub remediation_url: String,
}

impl Notice {
    pub fn new(message: impl Into<String>, remediation_url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            remediation_url: remediation_url.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\nPlease star the repository: {}", self.message, self.remediation_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateStatus {
    Unverified,
    Verifying,
    Verified {
        username: String,
        since: DateTime<Utc>,
    },
}

impl GateStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, GateStatus::Verified { .. })
    }
}

/// The view of the gate the submission flow is allowed to use.
#[async_trait]
pub trait AccessGate: Send + Sync {
    /// The verified username, or `None` while the gate is closed.
    async fn authorized_identity(&self) -> Option<String>;

    /// Close the gate. Idempotent.
    async fn revoke(&self);

    async fn is_authorized(&self) -> bool {
        self.authorized_identity().await.is_some()
    }
}

struct GateInner {
    identity: String,
    status: GateStatus,
}

fn lock(inner: &Mutex<GateInner>) -> MutexGuard<'_, GateInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns a `Verifying` status until the answer is recorded. If the verify
/// future is dropped first, the gate goes back to `Unverified`.
struct PendingVerification<'a> {
    inner: &'a Mutex<GateInner>,
    armed: bool,
}

impl<'a> PendingVerification<'a> {
    fn new(inner: &'a Mutex<GateInner>) -> Self {
        Self { inner, armed: true }
    }

    fn settle(mut self, status: GateStatus) {
        lock(self.inner).status = status;
        self.armed = false;
    }
}

impl Drop for PendingVerification<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = lock(self.inner);
        if inner.status == GateStatus::Verifying {
            warn!("Verification for '{}' abandoned before it answered", inner.identity);
            inner.status = GateStatus::Unverified;
        }
    }
}

pub struct GateController {
    service: Arc<dyn SymptomService>,
    repository_url: String,
    inner: Mutex<GateInner>,
}

impl GateController {
    pub fn new(service: Arc<dyn SymptomService>, repository_url: impl Into<String>) -> Self {
        Self {
            service,
            repository_url: repository_url.into(),
            inner: Mutex::new(GateInner {
                identity: String::new(),
                status: GateStatus::Unverified,
            }),
        }
    }

    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    pub fn notice(&self, message: impl Into<String>) -> Notice {
        Notice::new(message, self.repository_url.clone())
    }

    /// Store the candidate identity. Switching to a different identity
    /// closes a previously verified gate.
    pub async fn set_identity(&self, username: impl Into<String>) -> Result<(), GateError> {
        let username = username.into().trim().to_string();
        let mut inner = lock(&self.inner);

        if inner.status == GateStatus::Verifying {
            return Err(GateError::AlreadyInProgress(Operation::Verify));
        }
        let switched = matches!(
            &inner.status,
            GateStatus::Verified { username: verified, .. } if *verified != username
        );
        if switched {
            info!("Identity changed from '{}' to '{}', closing gate", inner.identity, username);
            inner.status = GateStatus::Unverified;
        }

        inner.identity = username;
        Ok(())
    }

    pub async fn identity(&self) -> String {
        lock(&self.inner).identity.clone()
    }

    pub async fn status(&self) -> GateStatus {
        lock(&self.inner).status.clone()
    }

    pub async fn is_authorized(&self) -> bool {
        lock(&self.inner).status.is_verified()
    }

    pub async fn authorized_identity(&self) -> Option<String> {
        match &lock(&self.inner).status {
            GateStatus::Verified { username, .. } => Some(username.clone()),
            _ => None,
        }
    }

    /// Check the current identity against the verification service.
    ///
    /// `Ok(())` means the gate is now open. A `starred = false` answer is
    /// reported as `NotStarred` with the service's message; any transport or
    /// status failure as `ServiceUnavailable`. Both leave the gate closed.
    #[instrument(skip(self), fields(attempt = %uuid::Uuid::new_v4()))]
    pub async fn verify(&self) -> Result<(), GateError> {
        let (username, pending) = {
            let mut inner = lock(&self.inner);
            if inner.status == GateStatus::Verifying {
                return Err(GateError::AlreadyInProgress(Operation::Verify));
            }
            if inner.identity.is_empty() {
                return Err(GateError::InvalidInput(MISSING_USERNAME.to_string()));
            }
            inner.status = GateStatus::Verifying;
            (inner.identity.clone(), PendingVerification::new(&self.inner))
        };

        info!("Verifying star for '{}'", username);
        let outcome = self.service.verify_star(&username).await;

        match outcome {
            Ok(verdict) if verdict.starred => {
                info!("Star verified for '{}'", username);
                pending.settle(GateStatus::Verified {
                    username,
                    since: Utc::now(),
                });
                Ok(())
            }
            Ok(verdict) => {
                info!("'{}' has not starred the repository: {}", username, verdict.message);
                pending.settle(GateStatus::Unverified);
                Err(GateError::NotStarred(self.notice(verdict.message)))
            }
            Err(e) => {
                warn!("Star verification failed: {}", e);
                pending.settle(GateStatus::Unverified);
                Err(GateError::ServiceUnavailable(VERIFY_UNAVAILABLE.to_string()))
            }
        }
    }

    pub async fn revoke(&self) {
        let mut inner = lock(&self.inner);
        if inner.status != GateStatus::Unverified {
            warn!("Revoking verification for '{}'", inner.identity);
        }
        inner.status = GateStatus::Unverified;
    }
}

#[async_trait]
impl AccessGate for GateController {
    async fn authorized_identity(&self) -> Option<String> {
        GateController::authorized_identity(self).await
    }

    async fn revoke(&self) {
        GateController::revoke(self).await
    }

    async fn is_authorized(&self) -> bool {
        GateController::is_authorized(self).await
    }
}
