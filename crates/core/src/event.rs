// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only log of facts the task state machine is built from.
//!
//! `TaskEvent` is a closed tagged union: every variant is something that
//! happened, never an instruction. The rules engine only ever reads this
//! log; it never mutates it, and nothing downstream infers state from
//! anywhere else.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskEvent {
    #[serde(rename = "image:build_started")]
    ImageBuildStarted { container: String },
    #[serde(rename = "image:build_progress")]
    ImageBuildProgress { container: String, message: String },
    #[serde(rename = "image:built")]
    ImageBuilt { container: String },
    #[serde(rename = "image:build_failed")]
    ImageBuildFailed { container: String, message: String },

    #[serde(rename = "image:pull_started")]
    ImagePullStarted { container: String },
    #[serde(rename = "image:pull_progress")]
    ImagePullProgress { container: String, message: String },
    #[serde(rename = "image:pulled")]
    ImagePulled { container: String },
    #[serde(rename = "image:pull_failed")]
    ImagePullFailed { container: String, message: String },

    #[serde(rename = "network:created")]
    NetworkCreated,
    #[serde(rename = "network:creation_failed")]
    NetworkCreationFailed { message: String },
    #[serde(rename = "network:deleted")]
    NetworkDeleted,
    #[serde(rename = "network:deletion_failed")]
    NetworkDeletionFailed { message: String },

    #[serde(rename = "container:created")]
    ContainerCreated { container: String },
    #[serde(rename = "container:creation_failed")]
    ContainerCreationFailed { container: String, message: String },
    #[serde(rename = "container:started")]
    ContainerStarted { container: String },
    #[serde(rename = "container:start_failed")]
    ContainerStartFailed { container: String, message: String },
    #[serde(rename = "container:became_healthy")]
    ContainerBecameHealthy { container: String },
    #[serde(rename = "container:health_check_failed")]
    ContainerHealthCheckFailed { container: String, message: String },
    #[serde(rename = "container:exited")]
    ContainerExited { container: String, exit_code: i32 },
    #[serde(rename = "container:stopped")]
    ContainerStopped { container: String },
    #[serde(rename = "container:stop_failed")]
    ContainerStopFailed { container: String, message: String },
    #[serde(rename = "container:removed")]
    ContainerRemoved { container: String },
    #[serde(rename = "container:removal_failed")]
    ContainerRemovalFailed { container: String, message: String },
    #[serde(rename = "container:run_progress")]
    ContainerRunProgress { container: String, message: String },

    /// A task-level fatal failure: a bug, a precondition violation, or an
    /// unexpected dispatcher exception that isn't attributable to any one
    /// resource. Forces Run→Cleanup from whichever stage it is posted in
    /// (spec.md §7 category 2).
    #[serde(rename = "task:execution_failed")]
    ExecutionFailed { message: String },

    #[serde(rename = "task:user_interrupted")]
    UserInterruptedExecution,
    #[serde(rename = "task:cleanup_completed")]
    CleanupCompleted,
    #[serde(rename = "task:cleanup_failed")]
    CleanupFailed { message: String },

    /// Catch-all for forward compatibility with log lines written by a
    /// newer binary. Never produced by this crate, never matched by any
    /// rule; it exists only so a structured log read back by an older
    /// version doesn't fail to deserialize outright.
    #[serde(other, skip_serializing)]
    Custom,
}

impl TaskEvent {
    /// The container this event concerns, if any.
    pub fn container(&self) -> Option<&str> {
        use TaskEvent::*;
        match self {
            ImageBuildStarted { container }
            | ImageBuildProgress { container, .. }
            | ImageBuilt { container }
            | ImageBuildFailed { container, .. }
            | ImagePullStarted { container }
            | ImagePullProgress { container, .. }
            | ImagePulled { container }
            | ImagePullFailed { container, .. }
            | ContainerCreated { container }
            | ContainerCreationFailed { container, .. }
            | ContainerStarted { container }
            | ContainerStartFailed { container, .. }
            | ContainerBecameHealthy { container }
            | ContainerHealthCheckFailed { container, .. }
            | ContainerExited { container, .. }
            | ContainerStopped { container }
            | ContainerStopFailed { container, .. }
            | ContainerRemoved { container }
            | ContainerRemovalFailed { container, .. }
            | ContainerRunProgress { container, .. } => Some(container),
            NetworkCreated
            | NetworkCreationFailed { .. }
            | NetworkDeleted
            | NetworkDeletionFailed { .. }
            | ExecutionFailed { .. }
            | UserInterruptedExecution
            | CleanupCompleted
            | CleanupFailed { .. }
            | Custom => None,
        }
    }

    /// True for events representing a failure of some kind, used by the
    /// rules engine to decide whether to suppress dependents or begin
    /// cleanup.
    pub fn is_failure(&self) -> bool {
        use TaskEvent::*;
        matches!(
            self,
            ImageBuildFailed { .. }
                | ImagePullFailed { .. }
                | NetworkCreationFailed { .. }
                | NetworkDeletionFailed { .. }
                | ContainerCreationFailed { .. }
                | ContainerStartFailed { .. }
                | ContainerHealthCheckFailed { .. }
                | ContainerStopFailed { .. }
                | ContainerRemovalFailed { .. }
                | CleanupFailed { .. }
                | ExecutionFailed { .. }
        )
    }

    /// The textual form spec.md §4.1 requires: the variant name plus its
    /// significant identifiers, e.g.
    /// `ImageBuildProgressEvent(container: 'app', message: 'step 3/10')`.
    /// Used by the structured log writer and the console UI so a reader
    /// never loses the error text or exit code behind a bare variant name.
    pub fn summary(&self) -> String {
        use TaskEvent::*;
        match self {
            ImageBuildStarted { container } => format!("ImageBuildStartedEvent(container: '{container}')"),
            ImageBuildProgress { container, message } => {
                format!("ImageBuildProgressEvent(container: '{container}', message: '{message}')")
            }
            ImageBuilt { container } => format!("ImageBuiltEvent(container: '{container}')"),
            ImageBuildFailed { container, message } => {
                format!("ImageBuildFailedEvent(container: '{container}', message: '{message}')")
            }
            ImagePullStarted { container } => format!("ImagePullStartedEvent(container: '{container}')"),
            ImagePullProgress { container, message } => {
                format!("ImagePullProgressEvent(container: '{container}', message: '{message}')")
            }
            ImagePulled { container } => format!("ImagePulledEvent(container: '{container}')"),
            ImagePullFailed { container, message } => {
                format!("ImagePullFailedEvent(container: '{container}', message: '{message}')")
            }
            NetworkCreated => "NetworkCreatedEvent".to_string(),
            NetworkCreationFailed { message } => format!("NetworkCreationFailedEvent(message: '{message}')"),
            NetworkDeleted => "NetworkDeletedEvent".to_string(),
            NetworkDeletionFailed { message } => format!("NetworkDeletionFailedEvent(message: '{message}')"),
            ContainerCreated { container } => format!("ContainerCreatedEvent(container: '{container}')"),
            ContainerCreationFailed { container, message } => {
                format!("ContainerCreationFailedEvent(container: '{container}', message: '{message}')")
            }
            ContainerStarted { container } => format!("ContainerStartedEvent(container: '{container}')"),
            ContainerStartFailed { container, message } => {
                format!("ContainerStartFailedEvent(container: '{container}', message: '{message}')")
            }
            ContainerBecameHealthy { container } => format!("ContainerBecameHealthyEvent(container: '{container}')"),
            ContainerHealthCheckFailed { container, message } => {
                format!("ContainerHealthCheckFailedEvent(container: '{container}', message: '{message}')")
            }
            ContainerExited { container, exit_code } => {
                format!("ContainerExitedEvent(container: '{container}', exit_code: {exit_code})")
            }
            ContainerStopped { container } => format!("ContainerStoppedEvent(container: '{container}')"),
            ContainerStopFailed { container, message } => {
                format!("ContainerStopFailedEvent(container: '{container}', message: '{message}')")
            }
            ContainerRemoved { container } => format!("ContainerRemovedEvent(container: '{container}')"),
            ContainerRemovalFailed { container, message } => {
                format!("ContainerRemovalFailedEvent(container: '{container}', message: '{message}')")
            }
            ContainerRunProgress { container, message } => {
                format!("ContainerRunProgressEvent(container: '{container}', message: '{message}')")
            }
            ExecutionFailed { message } => format!("ExecutionFailedEvent(message: '{message}')"),
            UserInterruptedExecution => "UserInterruptedExecutionEvent".to_string(),
            CleanupCompleted => "CleanupCompletedEvent".to_string(),
            CleanupFailed { message } => format!("CleanupFailedEvent(message: '{message}')"),
            Custom => "CustomEvent".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
