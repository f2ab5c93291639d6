// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn serializes_with_tagged_type_field() {
    let event = TaskEvent::ContainerStarted { container: "web".into() };
    let json = serde_json::to_value(&event).expect("serialize");
    assert_eq!(json["type"], "container:started");
    assert_eq!(json["container"], "web");
}

#[test]
fn unknown_type_deserializes_to_custom() {
    let json = serde_json::json!({ "type": "some:future_event", "anything": 1 });
    let event: TaskEvent = serde_json::from_value(json).expect("deserialize");
    assert_eq!(event, TaskEvent::Custom);
}

#[test]
fn container_returns_none_for_task_scoped_events() {
    assert_eq!(TaskEvent::NetworkCreated.container(), None);
    assert_eq!(TaskEvent::UserInterruptedExecution.container(), None);
}

#[test]
fn is_failure_is_true_only_for_failure_variants() {
    assert!(TaskEvent::ImageBuildFailed { container: "a".into(), message: "boom".into() }.is_failure());
    assert!(!TaskEvent::ImageBuilt { container: "a".into() }.is_failure());
}

#[test]
fn execution_failed_is_a_task_scoped_failure() {
    let event = TaskEvent::ExecutionFailed { message: "RuntimeError: boom".into() };
    assert!(event.is_failure());
    assert_eq!(event.container(), None);
}

#[test]
fn summary_includes_the_variant_name_and_payload_fields() {
    let event = TaskEvent::ContainerExited { container: "app".into(), exit_code: 1 };
    assert_eq!(event.summary(), "ContainerExitedEvent(container: 'app', exit_code: 1)");
    assert_eq!(TaskEvent::NetworkCreated.summary(), "NetworkCreatedEvent");

    let failed = TaskEvent::ImageBuildFailed { container: "app".into(), message: "no such file".into() };
    assert_eq!(failed.summary(), "ImageBuildFailedEvent(container: 'app', message: 'no such file')");
}
