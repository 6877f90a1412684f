//! Symptom Submission
//!
//! Owns the intake form and the lifecycle of the one allowed in-flight
//! symptom check. The gate is injected per call; a 403 from the analysis
//! service revokes it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, instrument, warn};

use crate::error::{GateError, Operation};
use crate::gate::{AccessGate, Notice};
use crate::intake::{Diagnosis, FormField, IntakeForm};
use crate::service::SymptomService;

pub const AUTHORIZATION_LOST: &str = "Star verification failed.";
pub const SUBMIT_UNAVAILABLE: &str = "Error analyzing symptoms. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionFailure {
    /// The service answered 403. The gate has been revoked.
    AuthorizationLost(Notice),
    /// Anything else. `fallback` is rendered in place of a real result.
    ServiceUnavailable { fallback: Diagnosis, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    /// A check is in flight. `previous` stays on screen until it answers.
    Submitting { previous: Option<Diagnosis> },
    Succeeded(Diagnosis),
    Failed(SubmissionFailure),
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting { .. })
    }

    /// What the results panel should show, if anything.
    pub fn result(&self) -> Option<&Diagnosis> {
        match self {
            SubmissionState::Submitting { previous } => previous.as_ref(),
            SubmissionState::Succeeded(diagnosis) => Some(diagnosis),
            SubmissionState::Failed(SubmissionFailure::ServiceUnavailable { fallback, .. }) => Some(fallback),
            _ => None,
        }
    }
}

#[derive(Default)]
struct SubmissionInner {
    form: IntakeForm,
    state: SubmissionState,
}

fn lock(inner: &Mutex<SubmissionInner>) -> MutexGuard<'_, SubmissionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns a `Submitting` state until the outcome is recorded. If the submit
/// future is dropped first, the state it replaced is put back.
struct PendingSubmission<'a> {
    inner: &'a Mutex<SubmissionInner>,
    replaced: Option<SubmissionState>,
}

impl<'a> PendingSubmission<'a> {
    fn begin(inner: &'a Mutex<SubmissionInner>, state: &mut SubmissionState) -> Self {
        let previous = state.result().cloned();
        let replaced = std::mem::replace(state, SubmissionState::Submitting { previous });
        Self {
            inner,
            replaced: Some(replaced),
        }
    }

    fn settle(mut self, state: SubmissionState) {
        self.replaced = None;
        lock(self.inner).state = state;
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        let Some(replaced) = self.replaced.take() else {
            return;
        };
        let mut inner = lock(self.inner);
        if inner.state.is_submitting() {
            warn!("Symptom check abandoned before it answered");
            inner.state = replaced;
        }
    }
}

pub struct SubmissionController {
    service: Arc<dyn SymptomService>,
    repository_url: String,
    inner: Mutex<SubmissionInner>,
}

impl SubmissionController {
    pub fn new(service: Arc<dyn SymptomService>, repository_url: impl Into<String>) -> Self {
        Self {
            service,
            repository_url: repository_url.into(),
            inner: Mutex::new(SubmissionInner::default()),
        }
    }

    /// Edits are accepted even while a submission is in flight.
    pub async fn update_field(&self, field: FormField) {
        lock(&self.inner).form.apply(field);
    }

    pub async fn form(&self) -> IntakeForm {
        lock(&self.inner).form.clone()
    }

    pub async fn state(&self) -> SubmissionState {
        lock(&self.inner).state.clone()
    }

    pub async fn result(&self) -> Option<Diagnosis> {
        lock(&self.inner).state.result().cloned()
    }

    fn ensure_idle(inner: &SubmissionInner) -> Result<(), GateError> {
        if inner.state.is_submitting() {
            return Err(GateError::AlreadyInProgress(Operation::Submit));
        }
        Ok(())
    }

    /// Send the current form on behalf of the gate's verified identity.
    ///
    /// Local guards (`AlreadyInProgress`, `InvalidInput`, `NotAuthorized`)
    /// leave state untouched and send nothing. On `ServiceUnavailable` the
    /// fallback result is available through `result()`.
    #[instrument(skip(self, gate), fields(attempt = %uuid::Uuid::new_v4()))]
    pub async fn submit(&self, gate: &dyn AccessGate) -> Result<Diagnosis, GateError> {
        {
            let inner = lock(&self.inner);
            Self::ensure_idle(&inner)?;
            inner.form.to_request()?;
        }
        let username = gate.authorized_identity().await.ok_or(GateError::NotAuthorized)?;

        // Re-checked: the lock was released while the gate answered.
        let (request, pending) = {
            let mut inner = lock(&self.inner);
            Self::ensure_idle(&inner)?;
            let request = inner.form.to_request()?;
            let pending = PendingSubmission::begin(&self.inner, &mut inner.state);
            (request, pending)
        };

        info!("Checking symptoms for '{}' ({} {})", username, request.age_group, request.gender);
        let outcome = self.service.check_symptoms(&username, &request).await;

        match outcome {
            Ok(diagnosis) => {
                info!(
                    "Received {} diagnoses and {} recommendations",
                    diagnosis.diagnoses.len(),
                    diagnosis.recommendations.len()
                );
                pending.settle(SubmissionState::Succeeded(diagnosis.clone()));
                Ok(diagnosis)
            }
            Err(e) if e.is_forbidden() => {
                warn!("Analysis service refused '{}': {}", username, e);
                gate.revoke().await;
                let notice = Notice::new(AUTHORIZATION_LOST, self.repository_url.clone());
                pending.settle(SubmissionState::Failed(SubmissionFailure::AuthorizationLost(notice.clone())));
                Err(GateError::AuthorizationLost(notice))
            }
            Err(e) => {
                warn!("Symptom check failed, showing fallback: {}", e);
                pending.settle(SubmissionState::Failed(SubmissionFailure::ServiceUnavailable {
                    fallback: Diagnosis::fallback(),
                    reason: e.to_string(),
                }));
                Err(GateError::ServiceUnavailable(SUBMIT_UNAVAILABLE.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::intake::{AgeGroup, Gender};
    use crate::service::mock::ScriptedService;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const REPO: &str = "https://github.com/sanatanisher01/Healthcare-symptoms";

    /// Gate double so the submission flow can be tested in isolation.
    struct FakeGate {
        identity: tokio::sync::Mutex<Option<String>>,
        revocations: AtomicUsize,
    }

    impl FakeGate {
        fn open(username: &str) -> Self {
            Self {
                identity: tokio::sync::Mutex::new(Some(username.to_string())),
                revocations: AtomicUsize::new(0),
            }
        }

        fn closed() -> Self {
            Self {
                identity: tokio::sync::Mutex::new(None),
                revocations: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AccessGate for FakeGate {
        async fn authorized_identity(&self) -> Option<String> {
            self.identity.lock().await.clone()
        }

        async fn revoke(&self) {
            self.revocations.fetch_add(1, Ordering::SeqCst);
            *self.identity.lock().await = None;
        }
    }

    async fn filled(controller: &SubmissionController) {
        controller.update_field(FormField::Symptoms("fever, cough".into())).await;
        controller.update_field(FormField::AgeGroup(Some(AgeGroup::Adult))).await;
        controller.update_field(FormField::Gender(Some(Gender::Female))).await;
    }

    fn flu() -> Diagnosis {
        Diagnosis::new(vec!["Flu".into()], vec!["Rest".into()])
    }

    #[tokio::test]
    async fn test_success_stores_result() {
        let service = Arc::new(ScriptedService::new().with_diagnosis(Ok(flu())));
        let controller = SubmissionController::new(service.clone(), REPO);
        filled(&controller).await;

        let gate = FakeGate::open("alice");
        let diagnosis = controller.submit(&gate).await.unwrap();

        assert_eq!(diagnosis, flu());
        assert_eq!(controller.state().await, SubmissionState::Succeeded(flu()));
        assert_eq!(service.last_username().await.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_form_survives_submission() {
        let service = Arc::new(ScriptedService::new().with_diagnosis(Ok(flu())));
        let controller = SubmissionController::new(service, REPO);
        filled(&controller).await;
        let before = controller.form().await;

        controller.submit(&FakeGate::open("alice")).await.unwrap();
        assert_eq!(controller.form().await, before);
    }

    #[tokio::test]
    async fn test_guards_do_not_touch_state() {
        let service = Arc::new(ScriptedService::new());
        let controller = SubmissionController::new(service.clone(), REPO);

        let err = controller.submit(&FakeGate::open("alice")).await.unwrap_err();
        assert!(matches!(err, GateError::InvalidInput(_)));

        filled(&controller).await;
        let err = controller.submit(&FakeGate::closed()).await.unwrap_err();
        assert_eq!(err, GateError::NotAuthorized);

        assert_eq!(controller.state().await, SubmissionState::Idle);
        assert_eq!(service.check_calls(), 0);
    }

    #[tokio::test]
    async fn test_forbidden_revokes_gate() {
        let service = Arc::new(
            ScriptedService::new().with_diagnosis(Err(ServiceError::Forbidden(Some("Please star the repository first".into())))),
        );
        let controller = SubmissionController::new(service, REPO);
        filled(&controller).await;
        let gate = FakeGate::open("alice");

        let err = controller.submit(&gate).await.unwrap_err();
        let notice = Notice::new(AUTHORIZATION_LOST, REPO);
        assert_eq!(err, GateError::AuthorizationLost(notice.clone()));
        assert_eq!(gate.revocations.load(Ordering::SeqCst), 1);
        assert!(!gate.is_authorized().await);

        let state = controller.state().await;
        assert_eq!(state, SubmissionState::Failed(SubmissionFailure::AuthorizationLost(notice)));
        assert_eq!(state.result(), None);
    }

    #[tokio::test]
    async fn test_other_failures_populate_fallback() {
        let failures = vec![
            ServiceError::Status { status: 500, body: "Internal Server Error".into() },
            ServiceError::Status { status: 401, body: String::new() },
            ServiceError::Decode("expected value at line 1 column 1".into()),
        ];

        for failure in failures {
            let service = Arc::new(ScriptedService::new().with_diagnosis(Err(failure)));
            let controller = SubmissionController::new(service, REPO);
            filled(&controller).await;
            let gate = FakeGate::open("alice");

            let err = controller.submit(&gate).await.unwrap_err();
            assert_eq!(err, GateError::ServiceUnavailable(SUBMIT_UNAVAILABLE.to_string()));
            assert_eq!(controller.result().await, Some(Diagnosis::fallback()));
            // Gate untouched.
            assert_eq!(gate.revocations.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_resubmit_after_failure() {
        let service = Arc::new(
            ScriptedService::new()
                .with_diagnosis(Err(ServiceError::Status { status: 503, body: String::new() }))
                .with_diagnosis(Ok(flu())),
        );
        let controller = SubmissionController::new(service.clone(), REPO);
        filled(&controller).await;
        let gate = FakeGate::open("alice");

        assert!(controller.submit(&gate).await.is_err());
        assert_eq!(controller.submit(&gate).await.unwrap(), flu());
        assert_eq!(service.check_calls(), 2);
    }

    #[tokio::test]
    async fn test_second_submit_rejected_while_in_flight() {
        let service = Arc::new(ScriptedService::new().with_diagnosis(Ok(flu())).held());
        let controller = SubmissionController::new(service.clone(), REPO);
        filled(&controller).await;
        let gate = FakeGate::open("alice");

        let (first, second) = tokio::join!(controller.submit(&gate), async {
            assert!(controller.state().await.is_submitting());
            // Editing is still allowed mid-flight.
            controller.update_field(FormField::Symptoms("fever".into())).await;
            let second = controller.submit(&gate).await;
            service.release();
            second
        });

        assert_eq!(first.unwrap(), flu());
        assert_eq!(second, Err(GateError::AlreadyInProgress(Operation::Submit)));
        assert_eq!(service.check_calls(), 1);
        assert_eq!(service.last_request().await.unwrap().symptoms, "fever, cough");
        assert_eq!(controller.form().await.symptoms, "fever");
    }

    #[tokio::test]
    async fn test_previous_result_visible_while_resubmitting() {
        let cold = Diagnosis::new(vec!["Common cold".into()], vec!["Fluids".into()]);
        let service = Arc::new(
            ScriptedService::new()
                .with_diagnosis(Ok(flu()))
                .with_diagnosis(Ok(cold.clone()))
                .held(),
        );
        let controller = SubmissionController::new(service.clone(), REPO);
        filled(&controller).await;
        let gate = FakeGate::open("alice");

        service.release();
        controller.submit(&gate).await.unwrap();

        let (second, (state, shown)) = tokio::join!(controller.submit(&gate), async {
            let state = controller.state().await;
            let shown = controller.result().await;
            service.release();
            (state, shown)
        });

        assert_eq!(second.unwrap(), cold);
        assert_eq!(state, SubmissionState::Submitting { previous: Some(flu()) });
        assert_eq!(shown, Some(flu()));
        assert_eq!(controller.result().await, Some(cold));
    }

    #[tokio::test]
    async fn test_abandoned_submit_restores_state() {
        let service = Arc::new(
            ScriptedService::new()
                .with_diagnosis(Ok(flu()))
                .with_diagnosis(Ok(flu()))
                .held(),
        );
        let controller = SubmissionController::new(service.clone(), REPO);
        filled(&controller).await;
        let gate = FakeGate::open("alice");

        let abandoned = tokio::time::timeout(Duration::from_millis(20), controller.submit(&gate)).await;
        assert!(abandoned.is_err());
        assert_eq!(controller.state().await, SubmissionState::Idle);

        service.release();
        assert_eq!(controller.submit(&gate).await.unwrap(), flu());

        // Abandoning a resubmission keeps the last answer on screen.
        let abandoned = tokio::time::timeout(Duration::from_millis(20), controller.submit(&gate)).await;
        assert!(abandoned.is_err());
        assert_eq!(controller.state().await, SubmissionState::Succeeded(flu()));
        assert_eq!(service.check_calls(), 3);
        assert_eq!(gate.revocations.load(Ordering::SeqCst), 0);
    }
}
