//! # vetrec Core
//!
//! The informed-consent signing workflow for veterinary records.
//!
//! Starting from a pending medical action (a procedure or a vaccination) that may not exist
//! yet, a [`ConsentWorkflow`] creates the action, optionally attaches clinical data, and then
//! creates the signed consent tied to it. Each step is a network call that can fail on its
//! own; the [`classifier`] decides which failures abort the run and which are recorded as
//! warnings, and the [`state`] machine guards against double submission.
//!
//! **No transport concerns**: HTTP, authentication and token refresh belong in
//! `vetrec-client` or the caller. This crate only talks to the [`ResourceClient`] and
//! [`SessionProvider`] traits.

pub mod classifier;
pub mod client;
pub mod error;
pub mod legal_text;
pub mod model;
pub mod orchestrator;
pub mod result;
pub mod session;
pub mod state;
pub mod validation;

#[cfg(test)]
mod testing;

pub use classifier::{classify, Disposition, ErrorKind, Step};
pub use client::ResourceClient;
pub use error::{ClientError, ClientResult, CoreError, CoreResult, FieldError};
pub use legal_text::{LegalText, LegalTextCatalogue};
pub use model::{
    ActionKind, ActionPayload, ActionRef, ConsentKind, ConsentPayload, MedicalPayload,
    ProcedurePayload, SignatureArtifact, VaccinePayload, WorkflowRequest,
};
pub use orchestrator::ConsentWorkflow;
pub use result::{StepWarning, WorkflowError, WorkflowResult, WorkflowStatus};
pub use session::{SessionIdentity, SessionProvider, SessionRole, StaticSession};
pub use state::{WorkflowState, WorkflowStateMachine};

// Re-exported so callers do not need a direct dependency for identifiers.
pub use vetrec_types::{NonEmptyText, ResourceId};
