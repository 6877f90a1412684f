//! Symptom Session
//!
//! Wires one gate and one submission controller to a shared service for a
//! single visitor. Nothing here outlives the process.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{GateError, ServiceError};
use crate::gate::GateController;
use crate::intake::Diagnosis;
use crate::service::{HttpSymptomService, SymptomService};
use crate::submission::SubmissionController;

pub struct SymptomSession {
    pub gate: GateController,
    pub submission: SubmissionController,
    service: Arc<dyn SymptomService>,
}

impl SymptomSession {
    pub fn new(service: Arc<dyn SymptomService>, repository_url: &str) -> Self {
        Self {
            gate: GateController::new(service.clone(), repository_url),
            submission: SubmissionController::new(service.clone(), repository_url),
            service,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ServiceError> {
        let service = Arc::new(HttpSymptomService::new(config.clone())?);
        Ok(Self::new(service, &config.repository_url))
    }

    /// Submit the current form through this session's gate.
    pub async fn submit(&self) -> Result<Diagnosis, GateError> {
        self.submission.submit(&self.gate).await
    }

    pub async fn service_status(&self) -> Result<String, ServiceError> {
        self.service.status().await
    }
}
