//! Workflow request data model.
//!
//! These types describe one user-initiated consent submission: the animal it concerns, the
//! medical action (existing or to be created), optional clinical data and the signed consent.
//! JSON field names are camelCase and tags are SCREAMING_SNAKE_CASE so requests can be
//! exchanged with the mobile front end unchanged.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use vetrec_types::ResourceId;

use crate::error::CoreError;
use crate::session::SessionIdentity;

/// Media type reported for signature artifacts whose format cannot be detected.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// The two kinds of medical action a consent can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Procedure,
    Vaccine,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Procedure => "procedure",
            Self::Vaccine => "vaccine",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an action that already exists on the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRef {
    pub kind: ActionKind,
    pub id: ResourceId,
}

impl ActionRef {
    pub fn procedure(id: ResourceId) -> Self {
        Self {
            kind: ActionKind::Procedure,
            id,
        }
    }

    pub fn vaccine(id: ResourceId) -> Self {
        Self {
            kind: ActionKind::Vaccine,
            id,
        }
    }
}

/// Data for creating a new procedure record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedurePayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinarian_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Data for creating a new vaccination record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinePayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_dose_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload for creating a new action, discriminated by `actionKind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "actionKind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionPayload {
    Procedure(ProcedurePayload),
    Vaccine(VaccinePayload),
}

impl ActionPayload {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Procedure(_) => ActionKind::Procedure,
            Self::Vaccine(_) => ActionKind::Vaccine,
        }
    }
}

/// Structured clinical data recorded against a newly created procedure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_celsius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate_bpm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate_bpm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Classification tag of a consent document. Each kind has its own legal text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentKind {
    Surgery,
    Anesthesia,
    Sedation,
    Vaccination,
    Euthanasia,
    Hospitalization,
    General,
}

impl ConsentKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Surgery => "SURGERY",
            Self::Anesthesia => "ANESTHESIA",
            Self::Sedation => "SEDATION",
            Self::Vaccination => "VACCINATION",
            Self::Euthanasia => "EUTHANASIA",
            Self::Hospitalization => "HOSPITALIZATION",
            Self::General => "GENERAL",
        }
    }
}

impl fmt::Display for ConsentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [ConsentKind; 7] = [
            ConsentKind::Surgery,
            ConsentKind::Anesthesia,
            ConsentKind::Sedation,
            ConsentKind::Vaccination,
            ConsentKind::Euthanasia,
            ConsentKind::Hospitalization,
            ConsentKind::General,
        ];
        let wanted = s.trim();
        ALL.into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown consent kind: {wanted:?}")))
    }
}

/// The captured signature, usually a PNG exported by the signature pad.
///
/// Serialised as standard base64. `Debug` prints the size and digest only so signatures
/// never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureArtifact {
    bytes: Vec<u8>,
}

impl SignatureArtifact {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Best-effort media type detected from the leading magic bytes.
    pub fn media_type(&self) -> &'static str {
        infer::get(&self.bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or(UNKNOWN_MEDIA_TYPE)
    }

    /// Lowercase hex SHA-256 digest of the artifact bytes.
    pub fn sha256_hex(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

impl fmt::Debug for SignatureArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureArtifact")
            .field("len", &self.bytes.len())
            .field("sha256", &self.sha256_hex())
            .finish()
    }
}

impl Serialize for SignatureArtifact {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for SignatureArtifact {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)?;
        Ok(Self { bytes })
    }
}

/// The consent document to be signed and stored against the action.
///
/// Text fields default to empty when absent from JSON: missing values are reported by the
/// workflow's own validation step rather than as a deserialisation failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentPayload {
    pub consent_kind: ConsentKind,
    #[serde(default)]
    pub signer_name: String,
    #[serde(default)]
    pub signer_relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: String,
    #[serde(default)]
    pub legal_text_version: String,
}

impl ConsentPayload {
    /// Starts a consent with the signer name taken from the current session.
    ///
    /// The identity is passed in explicitly; nothing here reads ambient session state.
    pub fn prefilled(
        identity: &SessionIdentity,
        consent_kind: ConsentKind,
        legal_text_version: impl Into<String>,
    ) -> Self {
        Self {
            consent_kind,
            signer_name: identity.name.to_string(),
            signer_relation: String::new(),
            signature: None,
            emergency_contact_name: None,
            emergency_contact_phone: String::new(),
            legal_text_version: legal_text_version.into(),
        }
    }

    pub fn with_signer_relation(mut self, relation: impl Into<String>) -> Self {
        self.signer_relation = relation.into();
        self
    }

    pub fn with_signature(mut self, signature: SignatureArtifact) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_emergency_contact(mut self, name: Option<String>, phone: impl Into<String>) -> Self {
        self.emergency_contact_name = name;
        self.emergency_contact_phone = phone.into();
        self
    }
}

/// Input to one orchestration run.
///
/// Exactly one of `existing_action_id` and `action_payload` must be set. The type allows
/// both shapes because requests arrive from the UI layer as JSON; the workflow checks the
/// invariant itself before any network call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    pub subject_id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_action_id: Option<ActionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_payload: Option<ActionPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_payload: Option<MedicalPayload>,
    pub consent_payload: ConsentPayload,
}

impl WorkflowRequest {
    /// A request that creates a new procedure or vaccination before signing.
    pub fn for_new_action(
        subject_id: ResourceId,
        action_payload: ActionPayload,
        consent_payload: ConsentPayload,
    ) -> Self {
        Self {
            subject_id,
            existing_action_id: None,
            action_payload: Some(action_payload),
            medical_payload: None,
            consent_payload,
        }
    }

    /// A request that signs a consent for an action that already exists.
    pub fn for_existing_action(
        subject_id: ResourceId,
        action: ActionRef,
        consent_payload: ConsentPayload,
    ) -> Self {
        Self {
            subject_id,
            existing_action_id: Some(action),
            action_payload: None,
            medical_payload: None,
            consent_payload,
        }
    }

    pub fn with_medical_payload(mut self, medical_payload: MedicalPayload) -> Self {
        self.medical_payload = Some(medical_payload);
        self
    }
}
