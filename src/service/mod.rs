//! Remote Service Seam
//!
//! The star-verification and symptom-analysis services are opaque remote
//! collaborators. Controllers only ever see them through `SymptomService`.

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpSymptomService;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::intake::{Diagnosis, SymptomRequest};

/// Body of `POST /verify-star`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRequest {
    pub github_username: String,
}

/// Answer of `POST /verify-star`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarVerdict {
    pub starred: bool,
    #[serde(default)]
    pub message: String,
}

impl StarVerdict {
    pub fn granted(message: impl Into<String>) -> Self {
        Self { starred: true, message: message.into() }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self { starred: false, message: message.into() }
    }
}

/// Error body FastAPI-style services attach to 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorDetail {
    pub detail: Option<String>,
}

/// Answer of `GET /api`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiStatus {
    pub message: String,
}

#[async_trait]
pub trait SymptomService: Send + Sync {
    /// Ask whether `username` has starred the gating repository.
    async fn verify_star(&self, username: &str) -> Result<StarVerdict, ServiceError>;

    /// Submit an intake on behalf of `username`. A 403 must surface as
    /// `ServiceError::Forbidden`.
    async fn check_symptoms(&self, username: &str, request: &SymptomRequest) -> Result<Diagnosis, ServiceError>;

    /// Liveness check. Never used by the controllers.
    async fn status(&self) -> Result<String, ServiceError>;
}
