//! Request shape checks run before any network call.
//!
//! The form in front of the workflow performs similar checks, but the workflow re-asserts
//! them as its own gate. A request that passes is converted into a [`ValidatedRequest`] in
//! which the action source is a single tagged value, so later steps never re-inspect the
//! request shape.

use vetrec_types::ResourceId;

use crate::model::{ActionPayload, ActionRef, ConsentPayload, MedicalPayload, WorkflowRequest};
use crate::result::WorkflowError;

/// Where the action the consent attaches to comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionSource {
    Existing(ActionRef),
    New(ActionPayload),
}

/// A request that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedRequest {
    pub subject_id: ResourceId,
    pub action: ActionSource,
    pub medical_payload: Option<MedicalPayload>,
    pub consent: ConsentPayload,
}

/// Validates the request shape and splits out the action source.
///
/// # Errors
///
/// Returns a [`WorkflowError`] of kind `VALIDATION` if:
/// - neither or both of `existingActionId` / `actionPayload` are set,
/// - the signature artifact is missing or empty,
/// - the emergency contact phone is blank,
/// - the signer name, signer relation or legal text version is empty.
pub fn validate_request(request: WorkflowRequest) -> Result<ValidatedRequest, WorkflowError> {
    let WorkflowRequest {
        subject_id,
        existing_action_id,
        action_payload,
        medical_payload,
        consent_payload,
    } = request;

    let action = match (existing_action_id, action_payload) {
        (Some(existing), None) => ActionSource::Existing(existing),
        (None, Some(payload)) => ActionSource::New(payload),
        (None, None) => {
            return Err(WorkflowError::validation(
                "either an existing action or a new action payload is required",
            ))
        }
        (Some(_), Some(_)) => {
            return Err(WorkflowError::validation(
                "an existing action and a new action payload cannot both be given",
            ))
        }
    };

    validate_consent(&consent_payload)?;

    Ok(ValidatedRequest {
        subject_id,
        action,
        medical_payload,
        consent: consent_payload,
    })
}

fn validate_consent(consent: &ConsentPayload) -> Result<(), WorkflowError> {
    match &consent.signature {
        None => return Err(WorkflowError::validation("a signature is required")),
        Some(signature) if signature.is_empty() => {
            return Err(WorkflowError::validation("the signature is empty"))
        }
        Some(_) => {}
    }

    validate_phone(&consent.emergency_contact_phone)?;

    if consent.signer_name.trim().is_empty() {
        return Err(WorkflowError::validation("the signer name is required"));
    }
    if consent.signer_relation.trim().is_empty() {
        return Err(WorkflowError::validation("the signer relation is required"));
    }
    if consent.legal_text_version.trim().is_empty() {
        return Err(WorkflowError::validation(
            "the legal text version is required",
        ));
    }

    Ok(())
}

/// The phone is free-form text; only a blank value is refused.
fn validate_phone(phone: &str) -> Result<(), WorkflowError> {
    if phone.trim().is_empty() {
        return Err(WorkflowError::validation(
            "an emergency contact phone is required",
        ));
    }
    Ok(())
}
