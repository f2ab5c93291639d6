// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The UI event logger contract (spec.md §6): a pure sink the parallel
//! execution manager notifies before the state machine ever sees an event.

use async_trait::async_trait;

use taskforge_core::{Step, TaskEvent};

/// Consumes step/event notifications for rendering to a human. Must never
/// fail: a broken terminal or renderer is not grounds for aborting task
/// execution, so implementations swallow their own I/O errors (matching
/// the teacher's `JobLogger::append`, which logs-and-continues on failure
/// rather than propagating).
#[async_trait]
pub trait UiEventLogger: Send + Sync {
    /// Called once, right before the manager dispatches `step` to a worker.
    async fn on_starting_task_step(&self, step: &Step);

    /// Called for every event posted to the task, in the exact order the
    /// state machine will process them — strictly before it does.
    async fn post_event(&self, event: &TaskEvent);
}

/// A logger that discards everything. Useful for CLI `--quiet` runs and as
/// the inert half of tests that only care about the state machine side.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUiLogger;

#[async_trait]
impl UiEventLogger for NullUiLogger {
    async fn on_starting_task_step(&self, _step: &Step) {}
    async fn post_event(&self, _event: &TaskEvent) {}
}
