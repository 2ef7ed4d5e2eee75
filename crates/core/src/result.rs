//! Terminal results of a workflow run.

use serde::{Deserialize, Serialize};
use std::fmt;
use vetrec_types::ResourceId;

use crate::classifier::{ErrorKind, Step};
use crate::error::ClientError;
use crate::state::WorkflowState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Success,
    PartialSuccess,
    Failed,
}

impl WorkflowStatus {
    /// The absorbing state that corresponds to this status.
    pub const fn terminal_state(self) -> WorkflowState {
        match self {
            Self::Success => WorkflowState::Succeeded,
            Self::PartialSuccess => WorkflowState::PartiallySucceeded,
            Self::Failed => WorkflowState::Failed,
        }
    }
}

/// The failure that ended a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowError {
    pub kind: ErrorKind,
    /// Step that failed; absent for failures raised before any step ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    pub message: String,
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            step: None,
            message: message.into(),
        }
    }

    pub fn already_in_progress(state: WorkflowState) -> Self {
        let message = if state.is_terminal() {
            format!("this submission already finished ({state})")
        } else {
            format!("this submission is already in progress ({state})")
        };
        Self {
            kind: ErrorKind::AlreadyInProgress,
            step: None,
            message,
        }
    }

    pub fn from_client(step: Step, kind: ErrorKind, error: &ClientError) -> Self {
        Self {
            kind,
            step: Some(step),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(f, "{} at {}: {}", self.kind, step, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// A non-fatal step failure recorded while the workflow carried on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepWarning {
    pub step: Step,
    pub kind: ErrorKind,
    pub message: String,
}

/// The single, immutable outcome of one workflow invocation.
///
/// `error` is present exactly when `status` is [`WorkflowStatus::Failed`]. Use the
/// constructors to keep that true.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_id: Option<ResourceId>,
    #[serde(default)]
    pub warnings: Vec<StepWarning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WorkflowError>,
}

impl WorkflowResult {
    /// A failed run. `action_id` is set when the action already exists server-side.
    pub fn failed(error: WorkflowError, action_id: Option<ResourceId>) -> Self {
        Self {
            status: WorkflowStatus::Failed,
            action_id,
            consent_id: None,
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    /// A run whose consent was created; warnings downgrade it to a partial success.
    pub fn completed(
        action_id: ResourceId,
        consent_id: ResourceId,
        warnings: Vec<StepWarning>,
    ) -> Self {
        let status = if warnings.is_empty() {
            WorkflowStatus::Success
        } else {
            WorkflowStatus::PartialSuccess
        };
        Self {
            status,
            action_id: Some(action_id),
            consent_id: Some(consent_id),
            warnings,
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == WorkflowStatus::Failed
    }

    /// The one message shown to the user for this run.
    ///
    /// Only the first warning or the terminal error is surfaced, even when more than one
    /// thing went wrong.
    pub fn user_message(&self) -> String {
        match self.status {
            WorkflowStatus::Success => "Consent signed and saved.".to_string(),
            WorkflowStatus::PartialSuccess => {
                let degraded = self
                    .warnings
                    .first()
                    .map(|w| w.step.subject())
                    .unwrap_or("some optional data");
                format!("Consent signed and saved, but {degraded} could not be saved.")
            }
            WorkflowStatus::Failed => match &self.error {
                Some(error) => failure_message(error),
                None => "The consent could not be saved.".to_string(),
            },
        }
    }
}

fn failure_message(error: &WorkflowError) -> String {
    let subject = error.step.map(Step::subject).unwrap_or("the consent");
    match error.kind {
        ErrorKind::Validation => format!("Please review the consent form: {}.", error.message),
        ErrorKind::Network => format!(
            "Could not reach the server while saving {subject}. Check your connection and try again."
        ),
        ErrorKind::Rejected => {
            format!("The server did not accept {subject}: {}", error.message)
        }
        ErrorKind::Unknown => format!("Something went wrong while saving {subject}."),
        ErrorKind::AlreadyInProgress => {
            "This consent is already being submitted. Please wait.".to_string()
        }
    }
}
