//! Outcome classification for workflow steps.
//!
//! [`classify`] is the only place that decides whether a failed step aborts the workflow.
//! The orchestrator asks it for every client failure and acts on the answer.
//!
//! | Step                | Network / Timeout | Rejected | Unknown |
//! |---------------------|-------------------|----------|---------|
//! | resolve action      | fatal             | fatal    | fatal   |
//! | attach medical data | non-fatal         | non-fatal (step abandoned) | non-fatal |
//! | create consent      | fatal             | fatal    | fatal   |
//!
//! A rejected payload is never repaired or retried. On the medical-data step that means the
//! clinical note is dropped and recorded as a warning; the consent still goes ahead.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ClientError;

/// The network-bearing steps of the workflow, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    ResolveAction,
    AttachMedicalData,
    CreateConsent,
}

impl Step {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolveAction => "resolve_action",
            Self::AttachMedicalData => "attach_medical_data",
            Self::CreateConsent => "create_consent",
        }
    }

    /// What the step produces, phrased for end users.
    pub const fn subject(self) -> &'static str {
        match self {
            Self::ResolveAction => "the procedure or vaccination record",
            Self::AttachMedicalData => "the clinical data",
            Self::CreateConsent => "the signed consent",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow-level error taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Request shape checks failed; nothing was sent.
    Validation,
    /// No response: connectivity failure or timeout.
    Network,
    /// The server rejected the payload.
    Rejected,
    Unknown,
    /// The workflow instance was not idle when `run` was called.
    AlreadyInProgress,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Network => "NETWORK",
            Self::Rejected => "REJECTED",
            Self::Unknown => "UNKNOWN",
            Self::AlreadyInProgress => "ALREADY_IN_PROGRESS",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the workflow must treat one failed step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Disposition {
    /// `true` aborts the remaining steps with a `FAILED` result.
    pub fatal: bool,
    pub kind: ErrorKind,
}

/// Maps a client failure on `step` to its workflow disposition.
pub fn classify(step: Step, error: &ClientError) -> Disposition {
    let kind = match error {
        ClientError::Network(_) | ClientError::Timeout(_) => ErrorKind::Network,
        ClientError::Rejected { .. } => ErrorKind::Rejected,
        ClientError::Unknown(_) => ErrorKind::Unknown,
    };

    let fatal = match (step, kind) {
        (Step::AttachMedicalData, _) => false,
        (Step::ResolveAction | Step::CreateConsent, _) => true,
    };

    Disposition { fatal, kind }
}
