// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use taskforge_core::{ContainerNode, ImageSource, RunOptions, Step, Task, TaskEvent, TaskStateMachine};

use super::*;

#[derive(Default, Clone)]
struct RecordingLog(Arc<Mutex<Vec<String>>>);

impl StructuredLogWriter for RecordingLog {
    fn write(&self, _severity: Severity, message: &str, _extra: &[(&str, serde_json::Value)]) {
        self.0.lock().push(message.to_string());
    }
}

#[derive(Default, Clone)]
struct RecordingUi(Arc<Mutex<Vec<String>>>);

#[async_trait]
impl UiEventLogger for RecordingUi {
    async fn on_starting_task_step(&self, step: &Step) {
        self.0.lock().push(format!("starting:{step}"));
    }

    async fn post_event(&self, event: &TaskEvent) {
        self.0.lock().push(format!("event:{}", event.summary()));
    }
}

fn single_container_task() -> Task {
    let web = ContainerNode::new("web", ImageSource::Pull { image: "nginx:latest".into() }).is_main(true);
    Task::new("demo", vec![web]).validate().expect("valid task")
}

#[tokio::test]
async fn ui_observes_every_event_before_the_state_machine_does() {
    let sm = Arc::new(TaskStateMachine::new(single_container_task(), RunOptions::default()));
    let ui = Arc::new(RecordingUi::default());
    let log = Arc::new(RecordingLog::default());
    let sink = EventSink::new(Arc::clone(&sm), Arc::clone(&ui), log, false);

    assert!(sm.log_snapshot().is_empty());
    sink.post(TaskEvent::ImagePullStarted { container: "web".into() }).await;

    // By the time `post` returns, both have observed it; what we can assert
    // structurally is that the UI recorded it and the state machine's log
    // grew by exactly one entry (no re-ordering, no loss).
    assert_eq!(ui.0.lock().len(), 1);
    assert_eq!(sm.log_snapshot().len(), 1);
}

#[tokio::test]
async fn synthetic_follow_on_events_are_forwarded_through_the_same_path() {
    // `web` has no health check, so starting it produces a synthetic
    // `ContainerBecameHealthy` the sink must forward to the UI too.
    let sm = Arc::new(TaskStateMachine::new(single_container_task(), RunOptions::default()));
    let ui = Arc::new(RecordingUi::default());
    let log = Arc::new(RecordingLog::default());
    let sink = EventSink::new(Arc::clone(&sm), Arc::clone(&ui), Arc::clone(&log) as Arc<dyn StructuredLogWriter>, false);

    sink.post(TaskEvent::ContainerStarted { container: "web".into() }).await;

    let recorded = ui.0.lock().clone();
    assert_eq!(recorded.len(), 2);
    assert!(recorded[0].contains("ContainerStartedEvent"));
    assert!(recorded[1].contains("ContainerBecameHealthyEvent"));
    assert_eq!(sm.log_snapshot().len(), 2);
}

#[tokio::test]
async fn quiet_output_suppresses_progress_events_from_the_ui_but_not_the_log() {
    let sm = Arc::new(TaskStateMachine::new(single_container_task(), RunOptions::default()));
    let ui = Arc::new(RecordingUi::default());
    let log = Arc::new(RecordingLog::default());
    let sink = EventSink::new(Arc::clone(&sm), Arc::clone(&ui), Arc::clone(&log) as Arc<dyn StructuredLogWriter>, true);

    sink.post(TaskEvent::ImagePullProgress { container: "web".into(), message: "layer 1/4".into() }).await;

    assert!(ui.0.lock().is_empty());
    assert_eq!(log.0.lock().len(), 1);
    assert_eq!(sm.log_snapshot().len(), 1);
}

#[tokio::test]
async fn starting_notifies_the_ui_without_touching_the_state_machine() {
    let sm = Arc::new(TaskStateMachine::new(single_container_task(), RunOptions::default()));
    let ui = Arc::new(RecordingUi::default());
    let log = Arc::new(RecordingLog::default());
    let sink = EventSink::new(Arc::clone(&sm), Arc::clone(&ui), log, false);

    sink.starting(&Step::PullImage { container: "web".into() }).await;

    assert_eq!(ui.0.lock().len(), 1);
    assert!(sm.log_snapshot().is_empty());
}
