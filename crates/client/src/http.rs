//! `reqwest` implementation of the resource-client seam.

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder};
use serde::Serialize;
use std::sync::Arc;
use url::Url;
use vetrec_core::{
    ClientError, ClientResult, ConsentPayload, LegalTextCatalogue, MedicalPayload,
    ProcedurePayload, ResourceClient, ResourceId, SessionProvider, VaccinePayload,
};

use crate::config::{ClientConfig, ClientConfigError, ClientConfigResult};
use crate::constants::{
    CONSENTS_SEGMENT, LEGAL_TEXTS_SEGMENT, MEDICAL_DATA_SEGMENT, PETS_SEGMENT,
    PROCEDURES_SEGMENT, VACCINES_SEGMENT,
};
use crate::wire::{self, ConsentWire, CreatedWire, LegalTextsWire};

/// Thin request wrappers over the clinic REST API.
///
/// Every call is a single attempt. Requests carry the session's bearer token when there is
/// one, and time out after the configured per-request timeout.
#[derive(Clone)]
pub struct HttpResourceClient {
    http: reqwest::Client,
    cfg: Arc<ClientConfig>,
    session: Arc<dyn SessionProvider>,
}

impl HttpResourceClient {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientConfigError::HttpClient`] if the TLS backend cannot be initialised.
    pub fn new(
        cfg: Arc<ClientConfig>,
        session: Arc<dyn SessionProvider>,
    ) -> ClientConfigResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .user_agent(cfg.user_agent())
            .build()
            .map_err(|e| ClientConfigError::HttpClient(e.to_string()))?;
        Ok(Self { http, cfg, session })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match self.session.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_create<B>(&self, url: Url, body: &B) -> ClientResult<ResourceId>
    where
        B: Serialize + ?Sized + Sync,
    {
        tracing::debug!(%url, "POST");
        let body = self.send(self.request(Method::POST, url).json(body)).await?;
        wire::decode::<CreatedWire>(&body)?.into_id()
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(&self, request: RequestBuilder) -> ClientResult<String> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            Ok(body)
        } else {
            let err = wire::error_from_response(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), error = %err, "request failed");
            Err(err)
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.cfg.request_timeout())
        } else if err.is_redirect() || err.is_decode() || err.is_builder() {
            ClientError::Unknown(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn create_procedure(
        &self,
        subject_id: &ResourceId,
        payload: &ProcedurePayload,
    ) -> ClientResult<ResourceId> {
        let url = self
            .cfg
            .endpoint(&[PETS_SEGMENT, subject_id.as_str(), PROCEDURES_SEGMENT]);
        self.post_create(url, payload).await
    }

    async fn create_vaccine(
        &self,
        subject_id: &ResourceId,
        payload: &VaccinePayload,
    ) -> ClientResult<ResourceId> {
        let url = self
            .cfg
            .endpoint(&[PETS_SEGMENT, subject_id.as_str(), VACCINES_SEGMENT]);
        self.post_create(url, payload).await
    }

    async fn create_medical_data(
        &self,
        procedure_id: &ResourceId,
        payload: &MedicalPayload,
    ) -> ClientResult<ResourceId> {
        let url = self.cfg.endpoint(&[
            PROCEDURES_SEGMENT,
            procedure_id.as_str(),
            MEDICAL_DATA_SEGMENT,
        ]);
        self.post_create(url, payload).await
    }

    async fn create_procedure_consent(
        &self,
        procedure_id: &ResourceId,
        consent: &ConsentPayload,
    ) -> ClientResult<ResourceId> {
        let url = self
            .cfg
            .endpoint(&[PROCEDURES_SEGMENT, procedure_id.as_str(), CONSENTS_SEGMENT]);
        self.post_create(url, &ConsentWire::from(consent)).await
    }

    async fn create_vaccine_consent(
        &self,
        vaccine_id: &ResourceId,
        consent: &ConsentPayload,
    ) -> ClientResult<ResourceId> {
        let url = self
            .cfg
            .endpoint(&[VACCINES_SEGMENT, vaccine_id.as_str(), CONSENTS_SEGMENT]);
        self.post_create(url, &ConsentWire::from(consent)).await
    }

    async fn get_legal_texts(&self) -> ClientResult<LegalTextCatalogue> {
        let url = self.cfg.endpoint(&[LEGAL_TEXTS_SEGMENT]);
        tracing::debug!(%url, "GET");
        let body = self.send(self.request(Method::GET, url)).await?;
        wire::decode::<LegalTextsWire>(&body)?.into_catalogue()
    }
}
