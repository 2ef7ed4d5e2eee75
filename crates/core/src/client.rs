//! The resource-client seam: the network operations the workflow depends on.
//!
//! Implementations are thin request wrappers (see the `vetrec-client` crate). Each operation
//! either returns the identifier of the created resource or a classified [`ClientError`].
//! Retries and timeouts are the implementation's concern; a timeout must surface as
//! [`ClientError::Timeout`].

use async_trait::async_trait;
use std::sync::Arc;
use vetrec_types::ResourceId;

use crate::error::ClientResult;
use crate::legal_text::LegalTextCatalogue;
use crate::model::{ConsentPayload, MedicalPayload, ProcedurePayload, VaccinePayload};

#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn create_procedure(
        &self,
        subject_id: &ResourceId,
        payload: &ProcedurePayload,
    ) -> ClientResult<ResourceId>;

    async fn create_vaccine(
        &self,
        subject_id: &ResourceId,
        payload: &VaccinePayload,
    ) -> ClientResult<ResourceId>;

    async fn create_medical_data(
        &self,
        procedure_id: &ResourceId,
        payload: &MedicalPayload,
    ) -> ClientResult<ResourceId>;

    async fn create_procedure_consent(
        &self,
        procedure_id: &ResourceId,
        consent: &ConsentPayload,
    ) -> ClientResult<ResourceId>;

    async fn create_vaccine_consent(
        &self,
        vaccine_id: &ResourceId,
        consent: &ConsentPayload,
    ) -> ClientResult<ResourceId>;

    /// Current legal texts, one per consent kind. Read before a workflow starts.
    async fn get_legal_texts(&self) -> ClientResult<LegalTextCatalogue>;
}

#[async_trait]
impl<T> ResourceClient for Arc<T>
where
    T: ResourceClient + ?Sized,
{
    async fn create_procedure(
        &self,
        subject_id: &ResourceId,
        payload: &ProcedurePayload,
    ) -> ClientResult<ResourceId> {
        (**self).create_procedure(subject_id, payload).await
    }

    async fn create_vaccine(
        &self,
        subject_id: &ResourceId,
        payload: &VaccinePayload,
    ) -> ClientResult<ResourceId> {
        (**self).create_vaccine(subject_id, payload).await
    }

    async fn create_medical_data(
        &self,
        procedure_id: &ResourceId,
        payload: &MedicalPayload,
    ) -> ClientResult<ResourceId> {
        (**self).create_medical_data(procedure_id, payload).await
    }

    async fn create_procedure_consent(
        &self,
        procedure_id: &ResourceId,
        consent: &ConsentPayload,
    ) -> ClientResult<ResourceId> {
        (**self).create_procedure_consent(procedure_id, consent).await
    }

    async fn create_vaccine_consent(
        &self,
        vaccine_id: &ResourceId,
        consent: &ConsentPayload,
    ) -> ClientResult<ResourceId> {
        (**self).create_vaccine_consent(vaccine_id, consent).await
    }

    async fn get_legal_texts(&self) -> ClientResult<LegalTextCatalogue> {
        (**self).get_legal_texts().await
    }
}
