// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task state machine: the single point through which steps are
//! dispatched and events are recorded.
//!
//! Everything here lives behind one [`parking_lot::Mutex`]. `pop_next_step`
//! and `post_event` both take the lock for their whole body, so a rule
//! never observes the log changing underneath it and two workers never
//! receive the same step twice.

use parking_lot::Mutex;

use crate::event::TaskEvent;
use crate::rules::{self, RuleSet};
use crate::run_options::{BehaviourAfterFailure, RunOptions, TaskExitStatus, TaskFailureReason};
use crate::stage::Stage;
use crate::step::Step;
use crate::task::Task;

struct Inner {
    log: Vec<TaskEvent>,
    stage: Stage,
    /// Steps handed out by `pop_next_step` that have not yet had their
    /// corresponding `*Started`/terminal event posted back. Without this,
    /// two calls to `pop_next_step` before the first worker logs anything
    /// would both see the step as enabled and dispatch it twice.
    in_flight: Vec<Step>,
    /// Set when `behaviour_after_failure` is `DontCleanUp` and cleanup
    /// would otherwise have started: the task is reported finished without
    /// ever running the cleanup rule set.
    finished_without_cleanup: bool,
}

pub struct TaskStateMachine {
    task: Task,
    run_options: RunOptions,
    running_rules: RuleSet,
    cleanup_rules: RuleSet,
    inner: Mutex<Inner>,
}

impl TaskStateMachine {
    pub fn new(task: Task, run_options: RunOptions) -> Self {
        Self::with_initial_log(task, run_options, Stage::Running, Vec::new())
    }

    pub fn with_initial_log(task: Task, run_options: RunOptions, stage: Stage, log: Vec<TaskEvent>) -> Self {
        Self {
            task,
            run_options,
            running_rules: rules::running_rules(),
            cleanup_rules: rules::cleanup_rules(),
            inner: Mutex::new(Inner { log, stage, in_flight: Vec::new(), finished_without_cleanup: false }),
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn current_stage(&self) -> Stage {
        self.inner.lock().stage
    }

    pub fn log_snapshot(&self) -> Vec<TaskEvent> {
        self.inner.lock().log.clone()
    }

    /// Returns the next step to dispatch, marking it in-flight so it is
    /// not handed out again until its outcome is posted back.
    pub fn pop_next_step(&self) -> Option<Step> {
        let mut inner = self.inner.lock();
        let rules = match inner.stage {
            Stage::Running => &self.running_rules,
            Stage::CleaningUp => &self.cleanup_rules,
        };
        let candidate = rules
            .enabled_steps(&self.task, &inner.log)
            .into_iter()
            .find(|s| !inner.in_flight.contains(s))?;
        inner.in_flight.push(candidate.clone());
        Some(candidate)
    }

    /// Records an event, resolving any matching in-flight step, applying
    /// synthetic events, and advancing the stage if warranted. Returns any
    /// synthetic events produced so the caller's event sink can forward
    /// them downstream exactly as if the runner had posted them itself.
    pub fn post_event(&self, event: TaskEvent) -> Vec<TaskEvent> {
        let mut inner = self.inner.lock();
        resolve_in_flight(&mut inner.in_flight, &event);
        inner.log.push(event.clone());

        let mut synthetic = Vec::new();
        if let TaskEvent::ContainerStarted { container } = &event {
            if let Some(node) = self.task.container(container) {
                if node.health_check.is_none() {
                    let healthy = TaskEvent::ContainerBecameHealthy { container: container.clone() };
                    inner.log.push(healthy.clone());
                    synthetic.push(healthy);
                }
            }
        }

        if inner.stage == Stage::Running && rules::should_begin_cleanup(&self.task, &inner.log) {
            match self.run_options.behaviour_after_failure {
                BehaviourAfterFailure::CleanUp => inner.stage = Stage::CleaningUp,
                BehaviourAfterFailure::DontCleanUp => inner.finished_without_cleanup = true,
            }
        }

        if inner.stage == Stage::CleaningUp
            && rules::cleanup_is_complete(&self.task, &inner.log)
            && !inner.log.contains(&TaskEvent::CleanupCompleted)
        {
            let completed = TaskEvent::CleanupCompleted;
            inner.log.push(completed.clone());
            synthetic.push(completed);
        }

        synthetic
    }

    pub fn is_finished(&self) -> bool {
        let inner = self.inner.lock();
        if inner.finished_without_cleanup {
            return true;
        }
        inner.stage == Stage::CleaningUp && rules::cleanup_is_complete(&self.task, &inner.log)
    }

    pub fn exit_status(&self) -> TaskExitStatus {
        let inner = self.inner.lock();
        exit_status_from_log(&self.task, &inner.log)
    }
}

fn resolve_in_flight(in_flight: &mut Vec<Step>, event: &TaskEvent) {
    let resolved = match event {
        TaskEvent::ImageBuildStarted { container } | TaskEvent::ImageBuildFailed { container, .. } => {
            Some(Step::BuildImage { container: container.clone() })
        }
        TaskEvent::ImagePullStarted { container } | TaskEvent::ImagePullFailed { container, .. } => {
            Some(Step::PullImage { container: container.clone() })
        }
        TaskEvent::NetworkCreated | TaskEvent::NetworkCreationFailed { .. } => Some(Step::CreateNetwork),
        TaskEvent::ContainerCreated { container } | TaskEvent::ContainerCreationFailed { container, .. } => {
            Some(Step::CreateContainer { container: container.clone() })
        }
        TaskEvent::ContainerStarted { container } | TaskEvent::ContainerStartFailed { container, .. } => {
            Some(Step::StartContainer { container: container.clone() })
        }
        TaskEvent::ContainerBecameHealthy { container }
        | TaskEvent::ContainerHealthCheckFailed { container, .. } => {
            Some(Step::WaitForHealthy { container: container.clone() })
        }
        TaskEvent::ContainerExited { container, .. } => Some(Step::RunContainer { container: container.clone() }),
        TaskEvent::ContainerStopped { container } | TaskEvent::ContainerStopFailed { container, .. } => {
            Some(Step::StopContainer { container: container.clone() })
        }
        TaskEvent::ContainerRemoved { container } | TaskEvent::ContainerRemovalFailed { container, .. } => {
            Some(Step::RemoveContainer { container: container.clone() })
        }
        TaskEvent::NetworkDeleted | TaskEvent::NetworkDeletionFailed { .. } => Some(Step::DeleteNetwork),
        _ => None,
    };
    if let Some(step) = resolved {
        in_flight.retain(|s| s != &step);
    }
}

fn exit_status_from_log(task: &Task, log: &[TaskEvent]) -> TaskExitStatus {
    if log.contains(&TaskEvent::UserInterruptedExecution) {
        return TaskExitStatus::Failed(TaskFailureReason::Interrupted);
    }

    if let Some(TaskEvent::ExecutionFailed { message }) =
        log.iter().find(|e| matches!(e, TaskEvent::ExecutionFailed { .. }))
    {
        return TaskExitStatus::Failed(TaskFailureReason::ExecutionFailed { message: message.clone() });
    }

    if let Some(main) = task.main_container() {
        for event in log {
            match event {
                TaskEvent::ContainerExited { container, exit_code } if container == &main.name => {
                    if *exit_code == 0 {
                        return TaskExitStatus::Success;
                    }
                    return TaskExitStatus::Failed(TaskFailureReason::MainContainerFailed { exit_code: *exit_code });
                }
                TaskEvent::ContainerHealthCheckFailed { container, .. } if container != &main.name => {
                    return TaskExitStatus::Failed(TaskFailureReason::DependencyUnhealthy {
                        container: container.clone(),
                    });
                }
                TaskEvent::ImageBuildFailed { container, message }
                | TaskEvent::ImagePullFailed { container, message } => {
                    return TaskExitStatus::Failed(TaskFailureReason::ExecutionFailed {
                        message: format!("{container}: {message}"),
                    });
                }
                _ => {}
            }
        }
    }

    if log.iter().any(|e| matches!(e, TaskEvent::CleanupFailed { .. })) {
        return TaskExitStatus::Failed(TaskFailureReason::CleanupIncomplete);
    }

    TaskExitStatus::Success
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
