//! Scripted `SymptomService` for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

use super::{StarVerdict, SymptomService};
use crate::error::ServiceError;
use crate::intake::{Diagnosis, SymptomRequest};

pub(crate) struct ScriptedService {
    verdicts: Mutex<VecDeque<Result<StarVerdict, ServiceError>>>,
    diagnoses: Mutex<VecDeque<Result<Diagnosis, ServiceError>>>,
    verify_calls: AtomicUsize,
    check_calls: AtomicUsize,
    last_username: Mutex<Option<String>>,
    last_request: Mutex<Option<SymptomRequest>>,
    hold: Option<Arc<Notify>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::new()),
            diagnoses: Mutex::new(VecDeque::new()),
            verify_calls: AtomicUsize::new(0),
            check_calls: AtomicUsize::new(0),
            last_username: Mutex::new(None),
            last_request: Mutex::new(None),
            hold: None,
        }
    }

    pub fn with_verdict(self, verdict: Result<StarVerdict, ServiceError>) -> Self {
        self.verdicts.try_lock().expect("unshared").push_back(verdict);
        self
    }

    pub fn with_diagnosis(self, diagnosis: Result<Diagnosis, ServiceError>) -> Self {
        self.diagnoses.try_lock().expect("unshared").push_back(diagnosis);
        self
    }

    /// Every request waits for `release()` before answering.
    pub fn held(mut self) -> Self {
        self.hold = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.notify_one();
        }
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub async fn last_username(&self) -> Option<String> {
        self.last_username.lock().await.clone()
    }

    pub async fn last_request(&self) -> Option<SymptomRequest> {
        self.last_request.lock().await.clone()
    }

    async fn wait(&self) {
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
    }
}

#[async_trait]
impl SymptomService for ScriptedService {
    async fn verify_star(&self, username: &str) -> Result<StarVerdict, ServiceError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_username.lock().await = Some(username.to_string());
        self.wait().await;
        self.verdicts
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Decode("no scripted verdict".into())))
    }

    async fn check_symptoms(&self, username: &str, request: &SymptomRequest) -> Result<Diagnosis, ServiceError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_username.lock().await = Some(username.to_string());
        *self.last_request.lock().await = Some(request.clone());
        self.wait().await;
        self.diagnoses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Decode("no scripted diagnosis".into())))
    }

    async fn status(&self) -> Result<String, ServiceError> {
        Ok("MediCheck API is running".to_string())
    }
}
