//! Wire models for the clinic API.
//!
//! Request and response bodies are kept separate from the `vetrec-core` domain types and
//! translated at the edge. Response bodies are decoded with `serde_path_to_error` so a schema
//! mismatch names the failing field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vetrec_core::{
    ClientError, ClientResult, ConsentKind, ConsentPayload, FieldError, LegalText,
    LegalTextCatalogue, NonEmptyText, ResourceId, SignatureArtifact,
};

/// Body returned by every create endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedWire {
    id: IdWire,
}

/// Some endpoints return numeric ids; they are opaque either way.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdWire {
    Text(String),
    Number(u64),
}

impl CreatedWire {
    pub(crate) fn into_id(self) -> ClientResult<ResourceId> {
        let raw = match self.id {
            IdWire::Text(text) => text,
            IdWire::Number(number) => number.to_string(),
        };
        ResourceId::parse(raw)
            .map_err(|e| ClientError::Unknown(format!("server returned an unusable id: {e}")))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignatureWire {
    data: String,
    media_type: &'static str,
    sha256: String,
}

impl From<&SignatureArtifact> for SignatureWire {
    fn from(signature: &SignatureArtifact) -> Self {
        Self {
            data: signature.to_base64(),
            media_type: signature.media_type(),
            sha256: signature.sha256_hex(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConsentWire<'a> {
    consent_type: &'static str,
    signer_name: &'a str,
    signer_relation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<SignatureWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emergency_contact_name: Option<&'a str>,
    emergency_contact_phone: &'a str,
    legal_text_version: &'a str,
}

impl<'a> From<&'a ConsentPayload> for ConsentWire<'a> {
    fn from(consent: &'a ConsentPayload) -> Self {
        Self {
            consent_type: consent.consent_kind.as_str(),
            signer_name: consent.signer_name.trim(),
            signer_relation: consent.signer_relation.trim(),
            signature: consent.signature.as_ref().map(SignatureWire::from),
            emergency_contact_name: consent
                .emergency_contact_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty()),
            emergency_contact_phone: consent.emergency_contact_phone.trim(),
            legal_text_version: consent.legal_text_version.trim(),
        }
    }
}

/// Structured error body returned by the API on validation failures.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBodyWire {
    message: String,
    #[serde(default)]
    errors: Vec<FieldErrorWire>,
}

#[derive(Debug, Deserialize)]
struct FieldErrorWire {
    field: String,
    message: String,
}

/// Maps a non-2xx response to a [`ClientError`].
///
/// A structured error body means the server understood and refused the request. Anything
/// else is treated as unknown.
pub(crate) fn error_from_response(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorBodyWire>(body) {
        Ok(wire) => ClientError::Rejected {
            status,
            message: wire.message,
            field_errors: wire
                .errors
                .into_iter()
                .map(|e| FieldError {
                    field: e.field,
                    message: e.message,
                })
                .collect(),
        },
        Err(_) => {
            let snippet: String = body.chars().take(200).collect();
            if snippet.trim().is_empty() {
                ClientError::Unknown(format!("HTTP {status} with no body"))
            } else {
                ClientError::Unknown(format!("HTTP {status}: {}", snippet.trim()))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegalTextWire {
    version: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

/// `GET /legal-texts` body: one entry per consent type.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub(crate) struct LegalTextsWire(BTreeMap<String, LegalTextWire>);

impl LegalTextsWire {
    pub(crate) fn into_catalogue(self) -> ClientResult<LegalTextCatalogue> {
        let mut texts = Vec::with_capacity(self.0.len());
        for (key, wire) in self.0 {
            let kind: ConsentKind = key
                .parse()
                .map_err(|e| ClientError::Unknown(format!("legal texts: {e}")))?;
            let version = NonEmptyText::new(&wire.version).map_err(|_| {
                ClientError::Unknown(format!("legal text for {kind} has an empty version"))
            })?;
            texts.push(LegalText {
                kind,
                version,
                title: wire.title,
                body: wire.body,
            });
        }
        LegalTextCatalogue::from_texts(texts)
            .map_err(|e| ClientError::Unknown(format!("legal texts: {e}")))
    }
}

/// Decode a success body, reporting the failing path on mismatch.
pub(crate) fn decode<T>(body: &str) -> ClientResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let deserializer = &mut serde_json::Deserializer::from_str(body);
    match serde_path_to_error::deserialize::<_, T>(deserializer) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(ClientError::Unknown(format!(
                "response schema mismatch at {path}: {source}"
            )))
        }
    }
}
