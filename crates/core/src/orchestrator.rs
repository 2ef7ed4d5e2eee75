//! Consent workflow orchestration.
//!
//! A [`ConsentWorkflow`] drives one consent submission through a fixed sequence of
//! dependent resource creations:
//!
//! 1. validate the request shape (no network),
//! 2. resolve the action id, creating the procedure or vaccination if needed,
//! 3. attach medical data to a newly created procedure (best effort),
//! 4. create the consent for the action,
//! 5. finalise the result.
//!
//! Each step waits for the previous one to settle. Failures are classified by
//! [`crate::classifier::classify`]; the workflow never retries and never rolls back, so every
//! run ends in exactly one terminal [`WorkflowResult`].

use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;
use vetrec_types::ResourceId;

use crate::classifier::{classify, ErrorKind, Step};
use crate::client::ResourceClient;
use crate::error::ClientError;
use crate::model::{
    ActionKind, ActionPayload, ActionRef, ConsentPayload, MedicalPayload, WorkflowRequest,
};
use crate::result::{StepWarning, WorkflowError, WorkflowResult};
use crate::state::{WorkflowState, WorkflowStateMachine};
use crate::validation::{validate_request, ActionSource, ValidatedRequest};

/// A failure that ends the run, plus the action id if the action already exists.
struct Abort {
    error: WorkflowError,
    action_id: Option<ResourceId>,
}

impl Abort {
    fn new(error: WorkflowError, action_id: Option<ResourceId>) -> Self {
        Self { error, action_id }
    }
}

/// One consent submission.
///
/// Instances are single-use: the first `run` moves the workflow out of `Idle` and every later
/// call, concurrent or not, is refused with `ALREADY_IN_PROGRESS` without touching the
/// network.
///
/// The in-flight guard is taken before the request is validated, so observers of a request
/// that fails validation see `RESOLVING_ACTION` followed by `FAILED`.
pub struct ConsentWorkflow<C> {
    client: C,
    state: WorkflowStateMachine,
}

impl<C: ResourceClient> ConsentWorkflow<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: WorkflowStateMachine::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state.current()
    }

    /// Read-only progress feed for the UI.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    /// Runs the workflow to a terminal result.
    pub async fn run(&self, request: WorkflowRequest) -> WorkflowResult {
        if !self.state.try_begin() {
            let current = self.state.current();
            tracing::warn!(state = %current, "refusing consent submission: workflow is not idle");
            return WorkflowResult::failed(WorkflowError::already_in_progress(current), None);
        }

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "consent_workflow",
            %run_id,
            subject_id = %request.subject_id
        );

        async {
            let result = match self.drive(request).await {
                Ok(result) => result,
                Err(abort) => {
                    if let Err(e) = self.state.advance(WorkflowState::Failed) {
                        tracing::error!("could not record workflow failure: {}", e);
                    }
                    tracing::warn!(error = %abort.error, "consent workflow failed");
                    WorkflowResult::failed(abort.error, abort.action_id)
                }
            };
            tracing::info!(status = ?result.status, "consent workflow finished");
            result
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, request: WorkflowRequest) -> Result<WorkflowResult, Abort> {
        let ValidatedRequest {
            subject_id,
            action,
            medical_payload,
            consent,
        } = validate_request(request).map_err(|error| Abort::new(error, None))?;

        if let Some(signature) = &consent.signature {
            tracing::debug!(
                signature_sha256 = %signature.sha256_hex(),
                media_type = signature.media_type(),
                "signature accepted"
            );
        }

        let (action, created_procedure) = match action {
            ActionSource::Existing(existing) => {
                tracing::info!(
                    kind = %existing.kind,
                    action_id = %existing.id,
                    "using existing action"
                );
                (existing, false)
            }
            ActionSource::New(payload) => {
                let is_procedure = matches!(payload, ActionPayload::Procedure(_));
                (self.create_action(&subject_id, &payload).await?, is_procedure)
            }
        };

        let mut warnings = Vec::new();
        match medical_payload {
            Some(medical) if created_procedure => {
                self.transition(WorkflowState::AttachingMedicalData, &action)?;
                if let Some(warning) = self.attach_medical_data(&action, &medical).await? {
                    warnings.push(warning);
                }
            }
            Some(_) => {
                tracing::warn!(
                    kind = %action.kind,
                    "ignoring medical data: it is only attached to newly created procedures"
                );
            }
            None => {}
        }

        self.transition(WorkflowState::CreatingConsent, &action)?;
        let consent_id = self.create_consent(&action, &consent).await?;

        let result = WorkflowResult::completed(action.id.clone(), consent_id, warnings);
        self.transition(result.status.terminal_state(), &action)?;
        Ok(result)
    }

    async fn create_action(
        &self,
        subject_id: &ResourceId,
        payload: &ActionPayload,
    ) -> Result<ActionRef, Abort> {
        let kind = payload.kind();
        tracing::info!(%kind, "creating action");

        let created = match payload {
            ActionPayload::Procedure(procedure) => {
                self.client.create_procedure(subject_id, procedure).await
            }
            ActionPayload::Vaccine(vaccine) => self.client.create_vaccine(subject_id, vaccine).await,
        };

        match created {
            Ok(id) => {
                tracing::info!(%kind, action_id = %id, "action created");
                Ok(ActionRef { kind, id })
            }
            Err(error) => Err(self.required_step_failed(Step::ResolveAction, &error, None)),
        }
    }

    async fn attach_medical_data(
        &self,
        action: &ActionRef,
        medical: &MedicalPayload,
    ) -> Result<Option<StepWarning>, Abort> {
        let error = match self.client.create_medical_data(&action.id, medical).await {
            Ok(id) => {
                tracing::info!(medical_data_id = %id, "medical data attached");
                return Ok(None);
            }
            Err(error) => error,
        };

        let warning = self.settle_failure(Step::AttachMedicalData, &error, Some(&action.id))?;
        tracing::warn!(kind = %warning.kind, "medical data not attached, continuing: {}", error);
        Ok(Some(warning))
    }

    async fn create_consent(
        &self,
        action: &ActionRef,
        consent: &ConsentPayload,
    ) -> Result<ResourceId, Abort> {
        tracing::info!(
            kind = %consent.consent_kind,
            legal_text_version = %consent.legal_text_version,
            "creating consent"
        );

        let created = match action.kind {
            ActionKind::Procedure => {
                self.client
                    .create_procedure_consent(&action.id, consent)
                    .await
            }
            ActionKind::Vaccine => self.client.create_vaccine_consent(&action.id, consent).await,
        };

        match created {
            Ok(id) => {
                tracing::info!(consent_id = %id, "consent created");
                Ok(id)
            }
            Err(error) => Err(self.required_step_failed(
                Step::CreateConsent,
                &error,
                Some(&action.id),
            )),
        }
    }

    /// Asks the classifier what a failed step means for the run.
    ///
    /// A fatal disposition becomes an [`Abort`]; anything else becomes a warning for the
    /// caller to record.
    fn settle_failure(
        &self,
        step: Step,
        error: &ClientError,
        action_id: Option<&ResourceId>,
    ) -> Result<StepWarning, Abort> {
        let disposition = classify(step, error);
        if disposition.fatal {
            return Err(Abort::new(
                WorkflowError::from_client(step, disposition.kind, error),
                action_id.cloned(),
            ));
        }

        Ok(StepWarning {
            step,
            kind: disposition.kind,
            message: error.to_string(),
        })
    }

    /// Failure of a step whose output the next step consumes.
    ///
    /// The classifier's disposition is honoured, but a non-fatal one still ends the run: no
    /// later step can go ahead without the missing id. The error keeps the classified kind.
    fn required_step_failed(
        &self,
        step: Step,
        error: &ClientError,
        action_id: Option<&ResourceId>,
    ) -> Abort {
        match self.settle_failure(step, error, action_id) {
            Err(abort) => abort,
            Ok(warning) => {
                tracing::error!(%step, "non-fatal failure on a step with required output");
                Abort::new(
                    WorkflowError {
                        kind: warning.kind,
                        step: Some(step),
                        message: warning.message,
                    },
                    action_id.cloned(),
                )
            }
        }
    }

    fn transition(&self, next: WorkflowState, action: &ActionRef) -> Result<(), Abort> {
        self.state.advance(next).map_err(|e| {
            Abort::new(
                WorkflowError {
                    kind: ErrorKind::Unknown,
                    step: None,
                    message: e.to_string(),
                },
                Some(action.id.clone()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConsentKind, ProcedurePayload, SignatureArtifact, VaccinePayload};
    use crate::result::WorkflowStatus;
    use crate::testing::{id, Call, StubClient};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn consent(kind: ConsentKind) -> ConsentPayload {
        ConsentPayload {
            consent_kind: kind,
            signer_name: "Marta Gil".into(),
            signer_relation: "Owner".into(),
            signature: Some(SignatureArtifact::new(vec![0x89, b'P', b'N', b'G'])),
            emergency_contact_name: Some("Jon Gil".into()),
            emergency_contact_phone: "555".into(),
            legal_text_version: "2024-01".into(),
        }
    }

    fn vaccine_request() -> WorkflowRequest {
        WorkflowRequest::for_new_action(
            id("p1"),
            ActionPayload::Vaccine(VaccinePayload {
                name: "Rabies".into(),
                ..Default::default()
            }),
            consent(ConsentKind::Vaccination),
        )
    }

    fn procedure_request() -> WorkflowRequest {
        WorkflowRequest::for_new_action(
            id("p1"),
            ActionPayload::Procedure(ProcedurePayload {
                name: "Dental cleaning".into(),
                ..Default::default()
            }),
            consent(ConsentKind::Anesthesia),
        )
        .with_medical_payload(MedicalPayload {
            weight_kg: Some(12.4),
            notes: Some("Mild tartar".into()),
            ..Default::default()
        })
    }

    fn rejected() -> ClientError {
        ClientError::Rejected {
            status: 422,
            message: "name is required".into(),
            field_errors: vec![],
        }
    }

    #[tokio::test]
    async fn vaccine_scenario_succeeds() {
        let client = Arc::new(
            StubClient::new()
                .vaccine(Ok(id("v1")))
                .vaccine_consent(Ok(id("c1"))),
        );
        let workflow = ConsentWorkflow::new(client.clone());

        let result = workflow.run(vaccine_request()).await;

        assert_eq!(result.status, WorkflowStatus::Success);
        assert_eq!(result.action_id, Some(id("v1")));
        assert_eq!(result.consent_id, Some(id("c1")));
        assert!(result.warnings.is_empty());
        assert!(result.error.is_none());
        assert_eq!(
            client.calls(),
            vec![
                Call::CreateVaccine("p1".into()),
                Call::CreateVaccineConsent("v1".into())
            ]
        );
        assert_eq!(workflow.state(), WorkflowState::Succeeded);
    }

    #[tokio::test]
    async fn missing_action_source_fails_validation_without_network() {
        let client = Arc::new(StubClient::new());
        let workflow = ConsentWorkflow::new(client.clone());
        let mut request = vaccine_request();
        request.action_payload = None;

        let result = workflow.run(request).await;

        assert_eq!(result.status, WorkflowStatus::Failed);
        assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::Validation);
        assert!(client.calls().is_empty());
        assert_eq!(workflow.state(), WorkflowState::Failed);
    }

    #[tokio::test]
    async fn both_action_sources_fail_validation() {
        let client = Arc::new(StubClient::new());
        let workflow = ConsentWorkflow::new(client.clone());
        let mut request = vaccine_request();
        request.existing_action_id = Some(ActionRef::vaccine(id("v9")));

        let result = workflow.run(request).await;

        assert_eq!(result.error.unwrap().kind, ErrorKind::Validation);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn action_failure_never_attempts_consent() {
        let failures = [
            ClientError::Network("connection refused".into()),
            ClientError::Timeout(Duration::from_secs(30)),
            rejected(),
            ClientError::Unknown("status 500".into()),
        ];

        for failure in failures {
            let client = Arc::new(StubClient::new().procedure(Err(failure.clone())));
            let workflow = ConsentWorkflow::new(client.clone());

            let result = workflow.run(procedure_request()).await;

            assert_eq!(result.status, WorkflowStatus::Failed, "{failure}");
            assert!(result.action_id.is_none());
            assert!(result.consent_id.is_none());
            let error = result.error.unwrap();
            assert_eq!(error.step, Some(Step::ResolveAction));
            assert!(!client.calls().iter().any(Call::is_consent), "{failure}");
            assert!(!client
                .calls()
                .iter()
                .any(|c| matches!(c, Call::CreateMedicalData(_))));
        }
    }

    #[tokio::test]
    async fn medical_data_failure_downgrades_to_partial_success() {
        let client = Arc::new(
            StubClient::new()
                .procedure(Ok(id("proc-7")))
                .medical_data(Err(ClientError::Network("reset".into())))
                .procedure_consent(Ok(id("c7"))),
        );
        let workflow = ConsentWorkflow::new(client.clone());

        let result = workflow.run(procedure_request()).await;

        assert_eq!(result.status, WorkflowStatus::PartialSuccess);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].step, Step::AttachMedicalData);
        assert_eq!(result.warnings[0].kind, ErrorKind::Network);
        assert_eq!(result.action_id, Some(id("proc-7")));
        assert_eq!(result.consent_id, Some(id("c7")));
        assert_eq!(workflow.state(), WorkflowState::PartiallySucceeded);
        assert_eq!(
            client.calls(),
            vec![
                Call::CreateProcedure("p1".into()),
                Call::CreateMedicalData("proc-7".into()),
                Call::CreateProcedureConsent("proc-7".into()),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_medical_data_is_a_warning_not_a_failure() {
        let client = Arc::new(StubClient::new().medical_data(Err(rejected())));
        let workflow = ConsentWorkflow::new(client);

        let result = workflow.run(procedure_request()).await;

        assert_eq!(result.status, WorkflowStatus::PartialSuccess);
        assert_eq!(result.warnings[0].kind, ErrorKind::Rejected);
    }

    #[tokio::test]
    async fn procedure_with_medical_data_succeeds() {
        let client = Arc::new(StubClient::new());
        let workflow = ConsentWorkflow::new(client.clone());

        let result = workflow.run(procedure_request()).await;

        assert_eq!(result.status, WorkflowStatus::Success);
        assert!(result.warnings.is_empty());
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test]
    async fn consent_failure_keeps_action_id() {
        let client = Arc::new(
            StubClient::new()
                .vaccine(Ok(id("v2")))
                .vaccine_consent(Err(ClientError::Unknown("status 503".into()))),
        );
        let workflow = ConsentWorkflow::new(client);

        let result = workflow.run(vaccine_request()).await;

        assert_eq!(result.status, WorkflowStatus::Failed);
        assert_eq!(result.action_id, Some(id("v2")));
        assert!(result.consent_id.is_none());
        let error = result.error.unwrap();
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert_eq!(error.step, Some(Step::CreateConsent));
        assert_eq!(workflow.state(), WorkflowState::Failed);
    }

    #[tokio::test]
    async fn existing_procedure_skips_creation_and_medical_data() {
        let client = Arc::new(StubClient::new().procedure_consent(Ok(id("c3"))));
        let workflow = ConsentWorkflow::new(client.clone());
        let request = WorkflowRequest::for_existing_action(
            id("p1"),
            ActionRef::procedure(id("proc-3")),
            consent(ConsentKind::Surgery),
        )
        .with_medical_payload(MedicalPayload::default());

        let result = workflow.run(request).await;

        assert_eq!(result.status, WorkflowStatus::Success);
        assert_eq!(result.action_id, Some(id("proc-3")));
        assert_eq!(
            client.calls(),
            vec![Call::CreateProcedureConsent("proc-3".into())]
        );
    }

    #[tokio::test]
    async fn medical_payload_is_ignored_for_vaccines() {
        let client = Arc::new(StubClient::new());
        let workflow = ConsentWorkflow::new(client.clone());
        let request = vaccine_request().with_medical_payload(MedicalPayload::default());

        let result = workflow.run(request).await;

        assert_eq!(result.status, WorkflowStatus::Success);
        assert!(!client
            .calls()
            .iter()
            .any(|c| matches!(c, Call::CreateMedicalData(_))));
    }

    #[tokio::test]
    async fn concurrent_run_is_refused_without_network() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(StubClient::new().gated(gate.clone()));
        let workflow = Arc::new(ConsentWorkflow::new(client.clone()));
        let mut states = workflow.subscribe();

        let first = tokio::spawn({
            let workflow = workflow.clone();
            async move { workflow.run(vaccine_request()).await }
        });

        states
            .wait_for(|state| *state != WorkflowState::Idle)
            .await
            .unwrap();
        let second = workflow.run(vaccine_request()).await;

        assert_eq!(second.status, WorkflowStatus::Failed);
        assert_eq!(second.error.unwrap().kind, ErrorKind::AlreadyInProgress);
        assert!(second.action_id.is_none());

        gate.notify_one();
        states
            .wait_for(|state| *state == WorkflowState::CreatingConsent)
            .await
            .unwrap();
        gate.notify_one();
        let first = first.await.unwrap();
        assert_eq!(first.status, WorkflowStatus::Success);
        assert_eq!(
            client.calls(),
            vec![
                Call::CreateVaccine("p1".into()),
                Call::CreateVaccineConsent("vac-1".into())
            ]
        );
    }

    #[tokio::test]
    async fn finished_workflow_refuses_another_run() {
        let client = Arc::new(StubClient::new());
        let workflow = ConsentWorkflow::new(client.clone());

        let first = workflow.run(vaccine_request()).await;
        assert_eq!(first.status, WorkflowStatus::Success);

        let again = workflow.run(vaccine_request()).await;
        assert_eq!(again.error.unwrap().kind, ErrorKind::AlreadyInProgress);
        assert_eq!(client.calls().len(), 2);
        assert_eq!(workflow.state(), WorkflowState::Succeeded);
    }

    #[tokio::test]
    async fn observers_see_each_step() {
        let gate = Arc::new(Notify::new());
        let workflow = Arc::new(ConsentWorkflow::new(Arc::new(
            StubClient::new().gated(gate.clone()),
        )));
        let mut states = workflow.subscribe();

        let run = tokio::spawn({
            let workflow = workflow.clone();
            async move { workflow.run(procedure_request()).await }
        });

        let mut seen = vec![*states.borrow()];
        for expected in [
            WorkflowState::ResolvingAction,
            WorkflowState::AttachingMedicalData,
            WorkflowState::CreatingConsent,
        ] {
            let state = *states.wait_for(|state| *state == expected).await.unwrap();
            seen.push(state);
            gate.notify_one();
        }
        let result = run.await.unwrap();
        seen.push(*states.wait_for(|state| state.is_terminal()).await.unwrap());

        assert_eq!(result.status, WorkflowStatus::Success);
        assert_eq!(
            seen,
            vec![
                WorkflowState::Idle,
                WorkflowState::ResolvingAction,
                WorkflowState::AttachingMedicalData,
                WorkflowState::CreatingConsent,
                WorkflowState::Succeeded,
            ]
        );
    }

    #[tokio::test]
    async fn validation_failure_moves_from_resolving_action_to_failed() {
        let workflow = ConsentWorkflow::new(Arc::new(StubClient::new()));
        let mut states = workflow.subscribe();
        let mut request = vaccine_request();
        request.action_payload = None;

        let result = workflow.run(request).await;

        assert_eq!(result.error.unwrap().kind, ErrorKind::Validation);
        assert!(WorkflowState::ResolvingAction.can_transition_to(WorkflowState::Failed));
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), WorkflowState::Failed);
    }

    #[tokio::test]
    async fn empty_phone_fails_without_network() {
        let client = Arc::new(StubClient::new());
        let workflow = ConsentWorkflow::new(client.clone());
        let mut request = vaccine_request();
        request.consent_payload.emergency_contact_phone = "  ".into();

        let result = workflow.run(request).await;

        assert_eq!(result.status, WorkflowStatus::Failed);
        assert_eq!(result.error.unwrap().kind, ErrorKind::Validation);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_signature_fails_without_network() {
        let client = Arc::new(StubClient::new());
        let workflow = ConsentWorkflow::new(client.clone());
        let mut request = procedure_request();
        request.consent_payload.signature = None;

        let result = workflow.run(request).await;

        assert_eq!(result.status, WorkflowStatus::Failed);
        assert_eq!(result.error.unwrap().kind, ErrorKind::Validation);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn free_form_phone_reaches_the_server() {
        let client = Arc::new(StubClient::new());
        let workflow = ConsentWorkflow::new(client.clone());
        let mut request = vaccine_request();
        request.consent_payload.emergency_contact_phone = "+1 555-0100 x2".into();

        let result = workflow.run(request).await;

        assert_eq!(result.status, WorkflowStatus::Success);
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn step_outcomes_follow_the_classifier() {
        let failures = [
            ClientError::Network("connection refused".into()),
            ClientError::Timeout(Duration::from_secs(30)),
            rejected(),
            ClientError::Unknown("status 500".into()),
        ];

        for step in [Step::ResolveAction, Step::AttachMedicalData, Step::CreateConsent] {
            for failure in &failures {
                let stub = StubClient::new();
                let stub = match step {
                    Step::ResolveAction => stub.procedure(Err(failure.clone())),
                    Step::AttachMedicalData => stub.medical_data(Err(failure.clone())),
                    Step::CreateConsent => stub.procedure_consent(Err(failure.clone())),
                };
                let workflow = ConsentWorkflow::new(Arc::new(stub));

                let result = workflow.run(procedure_request()).await;
                let disposition = classify(step, failure);

                if disposition.fatal {
                    assert_eq!(result.status, WorkflowStatus::Failed, "{step} {failure}");
                    let error = result.error.unwrap();
                    assert_eq!(error.step, Some(step));
                    assert_eq!(error.kind, disposition.kind);
                } else {
                    assert_eq!(result.status, WorkflowStatus::PartialSuccess, "{step} {failure}");
                    assert_eq!(
                        result.warnings,
                        vec![StepWarning {
                            step,
                            kind: disposition.kind,
                            message: failure.to_string(),
                        }]
                    );
                }
            }
        }
    }
}
