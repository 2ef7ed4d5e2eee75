use crate::model::ConsentKind;
use crate::state::WorkflowState;
use std::time::Duration;

/// A single field-level complaint returned by the server alongside a rejection.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// The classified failure a resource client raises for one network operation.
///
/// Clients are responsible for mapping their transport into these variants; the workflow
/// never inspects transport details.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// No response was received (connection refused, DNS failure, dropped connection).
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a structured validation failure.
    #[error("rejected by server (status {status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        field_errors: Vec<FieldError>,
    },

    /// Anything else: unexpected status without a structured body, undecodable response, etc.
    #[error("unexpected failure: {0}")]
    Unknown(String),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid value: {0}")]
    InvalidValue(#[from] vetrec_types::TypeError),

    #[error("illegal workflow transition from {from} to {to}")]
    IllegalTransition {
        from: WorkflowState,
        to: WorkflowState,
    },

    #[error("duplicate legal text for consent kind {0}")]
    DuplicateLegalText(ConsentKind),

    #[error("no legal text available for consent kind {0}")]
    MissingLegalText(ConsentKind),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
