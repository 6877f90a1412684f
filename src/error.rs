//! Error Types
//!
//! `GateError` is what the two controllers report to their callers.
//! `ServiceError` is what the remote service layer reports to the controllers.

use std::fmt;
use thiserror::Error;

use crate::gate::Notice;

/// The two guarded operations that may be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Verify,
    Submit,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Verify => write!(f, "verification"),
            Operation::Submit => write!(f, "symptom check"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    /// A required field was missing. Raised before any request is sent.
    #[error("{0}")]
    InvalidInput(String),

    #[error("A {0} is already in progress")]
    AlreadyInProgress(Operation),

    #[error("Please verify your GitHub star first!")]
    NotAuthorized,

    #[error("{0}")]
    NotStarred(Notice),

    /// The analysis service refused the identity. The gate has been revoked.
    #[error("{0}")]
    AuthorizationLost(Notice),

    #[error("{0}")]
    ServiceUnavailable(String),
}

impl GateError {
    /// Local guard failures never mutate state or reach the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            GateError::InvalidInput(_) | GateError::AlreadyInProgress(_) | GateError::NotAuthorized
        )
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            GateError::NotStarred(notice) | GateError::AuthorizationLost(notice) => Some(notice),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP 403. Carries the `detail` field of the body when one was sent.
    #[error("Access denied: {}", detail_or_default(.0))]
    Forbidden(Option<String>),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

fn detail_or_default(detail: &Option<String>) -> &str {
    detail.as_deref().unwrap_or("no detail")
}

impl ServiceError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ServiceError::Forbidden(_))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Decode(err.to_string())
    }
}
