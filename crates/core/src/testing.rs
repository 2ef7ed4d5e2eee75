//! Scripted in-memory resource client for unit tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use vetrec_types::ResourceId;

use crate::client::ResourceClient;
use crate::error::{ClientError, ClientResult};
use crate::legal_text::LegalTextCatalogue;
use crate::model::{ConsentPayload, MedicalPayload, ProcedurePayload, VaccinePayload};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    CreateProcedure(String),
    CreateVaccine(String),
    CreateMedicalData(String),
    CreateProcedureConsent(String),
    CreateVaccineConsent(String),
    GetLegalTexts,
}

impl Call {
    pub(crate) fn is_consent(&self) -> bool {
        matches!(
            self,
            Call::CreateProcedureConsent(_) | Call::CreateVaccineConsent(_)
        )
    }
}

/// Answers every create call with a fixed id unless a failure was scripted.
pub(crate) struct StubClient {
    procedure: ClientResult<ResourceId>,
    vaccine: ClientResult<ResourceId>,
    medical_data: ClientResult<ResourceId>,
    procedure_consent: ClientResult<ResourceId>,
    vaccine_consent: ClientResult<ResourceId>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Notify>>,
}

pub(crate) fn id(value: &str) -> ResourceId {
    ResourceId::parse(value).unwrap()
}

impl StubClient {
    pub(crate) fn new() -> Self {
        Self {
            procedure: Ok(id("proc-1")),
            vaccine: Ok(id("vac-1")),
            medical_data: Ok(id("med-1")),
            procedure_consent: Ok(id("consent-1")),
            vaccine_consent: Ok(id("consent-1")),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub(crate) fn procedure(mut self, response: ClientResult<ResourceId>) -> Self {
        self.procedure = response;
        self
    }

    pub(crate) fn vaccine(mut self, response: ClientResult<ResourceId>) -> Self {
        self.vaccine = response;
        self
    }

    pub(crate) fn medical_data(mut self, response: ClientResult<ResourceId>) -> Self {
        self.medical_data = response;
        self
    }

    pub(crate) fn procedure_consent(mut self, response: ClientResult<ResourceId>) -> Self {
        self.procedure_consent = response;
        self
    }

    pub(crate) fn vaccine_consent(mut self, response: ClientResult<ResourceId>) -> Self {
        self.vaccine_consent = response;
        self
    }

    /// Every create call waits for one notification before answering.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ResourceClient for StubClient {
    async fn create_procedure(
        &self,
        subject_id: &ResourceId,
        _payload: &ProcedurePayload,
    ) -> ClientResult<ResourceId> {
        self.record(Call::CreateProcedure(subject_id.to_string()));
        self.wait_for_gate().await;
        self.procedure.clone()
    }

    async fn create_vaccine(
        &self,
        subject_id: &ResourceId,
        _payload: &VaccinePayload,
    ) -> ClientResult<ResourceId> {
        self.record(Call::CreateVaccine(subject_id.to_string()));
        self.wait_for_gate().await;
        self.vaccine.clone()
    }

    async fn create_medical_data(
        &self,
        procedure_id: &ResourceId,
        _payload: &MedicalPayload,
    ) -> ClientResult<ResourceId> {
        self.record(Call::CreateMedicalData(procedure_id.to_string()));
        self.wait_for_gate().await;
        self.medical_data.clone()
    }

    async fn create_procedure_consent(
        &self,
        procedure_id: &ResourceId,
        _consent: &ConsentPayload,
    ) -> ClientResult<ResourceId> {
        self.record(Call::CreateProcedureConsent(procedure_id.to_string()));
        self.wait_for_gate().await;
        self.procedure_consent.clone()
    }

    async fn create_vaccine_consent(
        &self,
        vaccine_id: &ResourceId,
        _consent: &ConsentPayload,
    ) -> ClientResult<ResourceId> {
        self.record(Call::CreateVaccineConsent(vaccine_id.to_string()));
        self.wait_for_gate().await;
        self.vaccine_consent.clone()
    }

    async fn get_legal_texts(&self) -> ClientResult<LegalTextCatalogue> {
        self.record(Call::GetLegalTexts);
        Err(ClientError::Unknown("legal texts are not scripted".into()))
    }
}
