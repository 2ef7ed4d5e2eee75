//! Workflow progress state machine.
//!
//! ```text
//! Idle -> ResolvingAction -> [AttachingMedicalData] -> CreatingConsent -> Succeeded
//!                                                                       -> PartiallySucceeded
//! (any in-flight state) -> Failed
//! ```
//!
//! `Idle` is initial; `Succeeded`, `PartiallySucceeded` and `Failed` are absorbing. Leaving
//! `Idle` is the in-flight guard: only one caller can win [`WorkflowStateMachine::try_begin`].
//! The current state is published through a `tokio::sync::watch` channel so callers can
//! observe progress without being able to change it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

use crate::error::{CoreError, CoreResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    Idle,
    ResolvingAction,
    AttachingMedicalData,
    CreatingConsent,
    Succeeded,
    PartiallySucceeded,
    Failed,
}

impl WorkflowState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::ResolvingAction => "RESOLVING_ACTION",
            Self::AttachingMedicalData => "ATTACHING_MEDICAL_DATA",
            Self::CreatingConsent => "CREATING_CONSENT",
            Self::Succeeded => "SUCCEEDED",
            Self::PartiallySucceeded => "PARTIALLY_SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::PartiallySucceeded | Self::Failed)
    }

    pub const fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, next),
            (Idle, ResolvingAction)
                | (ResolvingAction, AttachingMedicalData)
                | (ResolvingAction, CreatingConsent)
                | (ResolvingAction, Failed)
                | (AttachingMedicalData, CreatingConsent)
                | (AttachingMedicalData, Failed)
                | (CreatingConsent, Succeeded)
                | (CreatingConsent, PartiallySucceeded)
                | (CreatingConsent, Failed)
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the state of one workflow instance.
#[derive(Debug)]
pub struct WorkflowStateMachine {
    tx: watch::Sender<WorkflowState>,
}

impl Default for WorkflowStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowStateMachine {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WorkflowState::Idle);
        Self { tx }
    }

    pub fn current(&self) -> WorkflowState {
        *self.tx.borrow()
    }

    /// Read-only view of the state; receivers see every committed transition.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.tx.subscribe()
    }

    /// Atomically moves `Idle -> ResolvingAction`.
    ///
    /// Returns `false` without changing anything if the machine is not idle.
    pub fn try_begin(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == WorkflowState::Idle {
                *state = WorkflowState::ResolvingAction;
                true
            } else {
                false
            }
        })
    }

    /// Moves to `next` if the transition is legal.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IllegalTransition`] and leaves the state untouched otherwise.
    pub fn advance(&self, next: WorkflowState) -> CoreResult<()> {
        let mut from = next;
        let moved = self.tx.send_if_modified(|state| {
            from = *state;
            if state.can_transition_to(next) {
                *state = next;
                true
            } else {
                false
            }
        });

        if moved {
            tracing::debug!(%from, to = %next, "workflow state changed");
            Ok(())
        } else {
            Err(CoreError::IllegalTransition { from, to: next })
        }
    }
}
