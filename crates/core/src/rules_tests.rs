// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;
use crate::container::{ContainerNode, ImageSource};

fn pull(name: &str) -> ContainerNode {
    ContainerNode::new(name, ImageSource::Pull { image: format!("{name}:latest") })
}

fn diamond_task() -> Task {
    Task::new(
        "build",
        vec![
            pull("base"),
            pull("left").depends_on(vec!["base".to_string()]),
            pull("right").depends_on(vec!["base".to_string()]),
            pull("app").is_main(true).depends_on(vec!["left".to_string(), "right".to_string()]),
        ],
    )
}

#[test]
fn first_step_is_pulling_the_first_declared_container() {
    let task = diamond_task();
    let rules = running_rules();
    let step = rules.next_step(&task, &[]).expect("a step should be enabled");
    assert_eq!(step, Step::PullImage { container: "base".into() });
}

#[test]
fn same_log_always_yields_the_same_next_step() {
    let task = diamond_task();
    let rules = running_rules();
    let log = vec![TaskEvent::ImagePullStarted { container: "base".into() }];
    let a = rules.next_step(&task, &log);
    let b = rules.next_step(&task, &log);
    assert_eq!(a, b);
}

#[test]
fn a_step_already_started_is_never_enabled_again() {
    let task = diamond_task();
    let rules = running_rules();
    let log = vec![TaskEvent::ImagePullStarted { container: "base".into() }];
    let steps = rules.enabled_steps(&task, &log);
    assert!(!steps.contains(&Step::PullImage { container: "base".into() }));
}

#[test]
fn container_is_not_created_until_its_dependencies_are_healthy() {
    let task = diamond_task();
    let rules = running_rules();
    let log = vec![
        TaskEvent::NetworkCreated,
        TaskEvent::ImagePullStarted { container: "left".into() },
        TaskEvent::ImagePulled { container: "left".into() },
    ];
    // left's image is ready, but its dependency `base` hasn't even been pulled.
    let steps = rules.enabled_steps(&task, &log);
    assert!(!steps.contains(&Step::CreateContainer { container: "left".into() }));

    let mut base_healthy = log.clone();
    base_healthy.push(TaskEvent::ImagePullStarted { container: "base".into() });
    base_healthy.push(TaskEvent::ImagePulled { container: "base".into() });
    base_healthy.push(TaskEvent::ContainerCreated { container: "base".into() });
    base_healthy.push(TaskEvent::ContainerStarted { container: "base".into() });
    base_healthy.push(TaskEvent::ContainerBecameHealthy { container: "base".into() });
    let steps_after_base_healthy = rules.enabled_steps(&task, &base_healthy);
    assert!(steps_after_base_healthy.contains(&Step::CreateContainer { container: "left".into() }));
}

#[test]
fn create_container_waits_for_network() {
    let task = diamond_task();
    let rules = running_rules();
    let log = vec![TaskEvent::ImagePullStarted { container: "base".into() }, TaskEvent::ImagePulled { container: "base".into() }];
    let steps = rules.enabled_steps(&task, &log);
    assert!(!steps.iter().any(|s| matches!(s, Step::CreateContainer { .. })));
}

#[test]
fn failed_image_suppresses_only_its_dependents() {
    let task = diamond_task();
    let log = vec![
        TaskEvent::NetworkCreated,
        TaskEvent::ImagePullStarted { container: "base".into() },
        TaskEvent::ImagePullFailed { container: "base".into(), message: "no such image".into() },
        TaskEvent::ImagePullStarted { container: "right".into() },
        TaskEvent::ImagePulled { container: "right".into() },
    ];
    assert!(ancestor_failed(&task, &log, "left"));
    assert!(ancestor_failed(&task, &log, "app"));
    assert!(!ancestor_failed(&task, &log, "right"));
}

#[test]
fn run_container_is_enabled_only_for_the_healthy_main_container() {
    let task = diamond_task();
    let rules = running_rules();
    let log = vec![TaskEvent::ContainerBecameHealthy { container: "left".into() }];
    assert!(!rules.enabled_steps(&task, &log).contains(&Step::RunContainer { container: "left".into() }));

    let mut with_main_healthy = log;
    with_main_healthy.push(TaskEvent::ContainerBecameHealthy { container: "right".into() });
    with_main_healthy.push(TaskEvent::ContainerBecameHealthy { container: "app".into() });
    assert!(rules
        .enabled_steps(&task, &with_main_healthy)
        .contains(&Step::RunContainer { container: "app".into() }));
}

#[test]
fn run_container_is_not_re_enabled_after_the_main_container_exits() {
    let task = diamond_task();
    let rules = running_rules();
    let log = vec![
        TaskEvent::ContainerBecameHealthy { container: "left".into() },
        TaskEvent::ContainerBecameHealthy { container: "right".into() },
        TaskEvent::ContainerBecameHealthy { container: "app".into() },
        TaskEvent::ContainerExited { container: "app".into(), exit_code: 0 },
    ];
    assert!(!rules.enabled_steps(&task, &log).contains(&Step::RunContainer { container: "app".into() }));
}

#[test]
fn main_container_exit_triggers_cleanup() {
    let task = diamond_task();
    let log = vec![TaskEvent::ContainerExited { container: "app".into(), exit_code: 0 }];
    assert!(should_begin_cleanup(&task, &log));
}

#[test]
fn non_main_container_exit_does_not_trigger_cleanup() {
    let task = diamond_task();
    let log = vec![TaskEvent::ContainerExited { container: "left".into(), exit_code: 137 }];
    assert!(!should_begin_cleanup(&task, &log));
}

#[test]
fn execution_failed_always_triggers_cleanup() {
    let task = diamond_task();
    let log = vec![TaskEvent::ExecutionFailed { message: "RuntimeError: boom".into() }];
    assert!(should_begin_cleanup(&task, &log));
}

#[test]
fn user_interrupt_always_triggers_cleanup() {
    let task = diamond_task();
    let log = vec![TaskEvent::UserInterruptedExecution];
    assert!(should_begin_cleanup(&task, &log));
}

#[test]
fn cleanup_rules_stop_before_remove_before_delete_network() {
    let task = Task::new("build", vec![pull("app").is_main(true)]);
    let rules = cleanup_rules();

    let created = vec![TaskEvent::NetworkCreated, TaskEvent::ContainerCreated { container: "app".into() }, TaskEvent::ContainerStarted { container: "app".into() }];
    assert_eq!(rules.next_step(&task, &created), Some(Step::StopContainer { container: "app".into() }));

    let mut stopped = created.clone();
    stopped.push(TaskEvent::ContainerStopped { container: "app".into() });
    assert_eq!(rules.next_step(&task, &stopped), Some(Step::RemoveContainer { container: "app".into() }));

    let mut removed = stopped.clone();
    removed.push(TaskEvent::ContainerRemoved { container: "app".into() });
    assert_eq!(rules.next_step(&task, &removed), Some(Step::DeleteNetwork));
}

#[test]
fn cleanup_is_complete_once_every_created_resource_resolves() {
    let task = Task::new("build", vec![pull("app").is_main(true)]);
    let log = vec![
        TaskEvent::NetworkCreated,
        TaskEvent::ContainerCreated { container: "app".into() },
        TaskEvent::ContainerStarted { container: "app".into() },
        TaskEvent::ContainerStopped { container: "app".into() },
        TaskEvent::ContainerRemoved { container: "app".into() },
    ];
    assert!(!cleanup_is_complete(&task, &log));

    let mut done = log;
    done.push(TaskEvent::NetworkDeleted);
    assert!(cleanup_is_complete(&task, &done));
}

#[test]
fn cleanup_is_complete_when_nothing_was_ever_created() {
    let task = Task::new("build", vec![pull("app").is_main(true)]);
    assert!(cleanup_is_complete(&task, &[]));
}

// ── Property tests: rule ordering is a pure function of the log ────────────

/// Every event the diamond task's log could plausibly contain, in the
/// order the happy path would append them. A property case picks an
/// arbitrary subset, preserving this relative order, so we exercise event
/// logs that would never occur in one run (e.g. `left` healthy before
/// `base` finishes) alongside ones that would.
fn candidate_events() -> Vec<TaskEvent> {
    let mut events = Vec::new();
    for name in ["base", "left", "right", "app"] {
        events.push(TaskEvent::ImagePullStarted { container: name.into() });
        events.push(TaskEvent::ImagePulled { container: name.into() });
    }
    events.push(TaskEvent::NetworkCreated);
    for name in ["base", "left", "right", "app"] {
        events.push(TaskEvent::ContainerCreated { container: name.into() });
        events.push(TaskEvent::ContainerStarted { container: name.into() });
        events.push(TaskEvent::ContainerBecameHealthy { container: name.into() });
    }
    events
}

fn arb_event_log() -> impl Strategy<Value = Vec<TaskEvent>> {
    let pool = candidate_events();
    prop::collection::vec(any::<bool>(), pool.len())
        .prop_map(move |keep| pool.iter().zip(keep).filter(|(_, k)| *k).map(|(e, _)| e.clone()).collect())
}

proptest! {
    #[test]
    fn next_step_and_enabled_steps_are_deterministic_for_any_log(log in arb_event_log()) {
        let task = diamond_task();
        let rules = running_rules();

        prop_assert_eq!(rules.next_step(&task, &log), rules.next_step(&task, &log));
        prop_assert_eq!(rules.enabled_steps(&task, &log), rules.enabled_steps(&task, &log));
    }

    #[test]
    fn enabled_steps_never_repeats_a_step_already_started(log in arb_event_log()) {
        let task = diamond_task();
        let rules = running_rules();
        let steps = rules.enabled_steps(&task, &log);

        for name in ["base", "left", "right", "app"] {
            let pull_started = log.contains(&TaskEvent::ImagePullStarted { container: name.into() });
            prop_assert!(!(pull_started && steps.contains(&Step::PullImage { container: name.into() })));

            let created = log.contains(&TaskEvent::ContainerCreated { container: name.into() });
            prop_assert!(!(created && steps.contains(&Step::CreateContainer { container: name.into() })));

            let started = log.contains(&TaskEvent::ContainerStarted { container: name.into() });
            prop_assert!(!(started && steps.contains(&Step::StartContainer { container: name.into() })));
        }
    }

    #[test]
    fn next_step_is_always_one_of_enabled_steps(log in arb_event_log()) {
        let task = diamond_task();
        let rules = running_rules();
        let enabled = rules.enabled_steps(&task, &log);

        if let Some(step) = rules.next_step(&task, &log) {
            prop_assert!(enabled.contains(&step));
        } else {
            prop_assert!(enabled.is_empty());
        }
    }
}
