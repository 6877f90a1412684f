//! MediCheck Client
//!
//! A gated symptom-checker client:
//! - Star gate: a revocable check that the visitor starred a repository
//! - Intake submission with at most one request in flight
//! - Fixed fallback result whenever the analysis service fails
//!
//! The two remote services are reached through [`service::SymptomService`].

pub mod config;
pub mod error;
pub mod gate;
pub mod intake;
pub mod render;
pub mod service;
pub mod session;
pub mod submission;
pub mod utils;

// Re-exports for convenience
pub use config::ClientConfig;
pub use error::{GateError, Operation, ServiceError};
pub use gate::{AccessGate, GateController, GateStatus, Notice};
pub use intake::{AgeGroup, Diagnosis, FormField, Gender, IntakeForm};
pub use service::{HttpSymptomService, StarVerdict, SymptomService};
pub use session::SymptomSession;
pub use submission::{SubmissionController, SubmissionFailure, SubmissionState};
