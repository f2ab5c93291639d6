// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The structural "UI-before-state-machine" guarantee (spec.md §4.5 bullet
//! 2, §8 P2): one type owns both consumers, so no caller can observe — or
//! accidentally produce — the wrong order.
//!
//! Grounded in the teacher's `event_tx.send(event)` forwarding in
//! `executor.rs::execute_inner`, generalized from "send to one channel"
//! into "forward to the UI listener, then the state machine, with no gap
//! either caller can land in between".

use std::sync::Arc;

use serde_json::json;

use taskforge_core::{Step, TaskEvent, TaskStateMachine};

use crate::structured_log::{Severity, StructuredLogWriter};
use crate::ui::UiEventLogger;

/// Owns the one state machine a task run drives, the UI listener, and the
/// structured log writer. Every event posted through here is observed by
/// the UI strictly before the state machine acts on it (P2); the
/// structured log writer is a secondary, order-independent diagnostic
/// sink (spec.md §6).
pub struct EventSink<U: UiEventLogger> {
    state_machine: Arc<TaskStateMachine>,
    ui: Arc<U>,
    log: Arc<dyn StructuredLogWriter>,
    quiet_output: bool,
}

impl<U: UiEventLogger> EventSink<U> {
    pub fn new(
        state_machine: Arc<TaskStateMachine>,
        ui: Arc<U>,
        log: Arc<dyn StructuredLogWriter>,
        quiet_output: bool,
    ) -> Self {
        Self { state_machine, ui, log, quiet_output }
    }

    /// Notifies the UI that `step` is about to be dispatched. Not an event
    /// posted to the state machine — this is the "starting X" line spec.md
    /// §9's design notes call out as the reason UI-before-SM matters.
    pub async fn starting(&self, step: &Step) {
        self.ui.on_starting_task_step(step).await;
    }

    /// Posts `event`: UI first, then the state machine, then the
    /// structured log. Any synthetic follow-on events the state machine
    /// produces (e.g. a health-check-less container's synthetic
    /// `ContainerBecameHealthy`) are forwarded through the exact same path,
    /// recursively, so they too reach the UI before anything downstream
    /// could have reacted to them.
    pub async fn post(&self, event: TaskEvent) {
        self.deliver_one(&event).await;
        let synthetic = self.state_machine.post_event(event);
        for follow_on in synthetic {
            self.deliver_one(&follow_on).await;
        }
    }

    async fn deliver_one(&self, event: &TaskEvent) {
        if !(self.quiet_output && is_progress(event)) {
            self.ui.post_event(event).await;
        }
        let severity = if event.is_failure() { Severity::Error } else { Severity::Info };
        let extra: Vec<(&str, serde_json::Value)> = match event.container() {
            Some(container) => vec![("container", json!(container))],
            None => vec![],
        };
        self.log.write(severity, &event.summary(), &extra);
    }
}

fn is_progress(event: &TaskEvent) -> bool {
    matches!(
        event,
        TaskEvent::ImageBuildProgress { .. } | TaskEvent::ImagePullProgress { .. } | TaskEvent::ContainerRunProgress { .. }
    )
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
