// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C5: the parallel execution manager. Drains the state machine with a
//! worker pool bounded by *level-of-parallelism*, dispatches each step to
//! the step runner (C6) through the event sink, and loops until no step is
//! enabled and no worker is active (spec.md §4.5).
//!
//! Grounded in the teacher's phase-based `Semaphore`-bounded executor
//! (the closest shape in the retrieval pack to a bounded worker pool is
//! `WorkflowEngine::execute`, which spawns one `tokio::spawn` per ready
//! step behind `Arc<Semaphore>::acquire_owned`), generalized from "one
//! semaphore-gated batch per topological phase" into "pop one step at a
//! time, spawn it behind a permit, wake the scheduling loop when a worker
//! finishes or an external event lands" — the dynamic-discovery shape
//! spec.md §4.5 requires instead of a static phase list.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Notify, Semaphore};

use taskforge_core::{TaskEvent, TaskExitStatus, TaskStateMachine};
use taskforge_driver::ContainerEngineDriver;

use crate::dispatcher::StepRunner;
use crate::sink::EventSink;
use crate::ui::UiEventLogger;

/// Owns the worker pool for one task run. `run` drives the task to
/// completion; `post_event` is the external entry point a signal handler
/// or other out-of-band source uses to inject an event (e.g.
/// `UserInterruptedExecution`) without bypassing the UI-before-SM
/// ordering the sink enforces.
pub struct ParallelExecutionManager<D: ContainerEngineDriver, U: UiEventLogger> {
    state_machine: Arc<TaskStateMachine>,
    sink: Arc<EventSink<U>>,
    runner: Arc<StepRunner<D>>,
    level_of_parallelism: usize,
    /// Mirrors `RunOptions::is_interruptible`. When `false`,
    /// `UserInterruptedExecution` posted through `post_event` is dropped
    /// rather than forced into the log (spec.md §6).
    is_interruptible: bool,
    wake: Arc<Notify>,
}

impl<D, U> ParallelExecutionManager<D, U>
where
    D: ContainerEngineDriver + 'static,
    U: UiEventLogger + 'static,
{
    pub fn new(
        state_machine: Arc<TaskStateMachine>,
        sink: Arc<EventSink<U>>,
        runner: Arc<StepRunner<D>>,
        level_of_parallelism: usize,
        is_interruptible: bool,
    ) -> Self {
        Self {
            state_machine,
            sink,
            runner,
            level_of_parallelism: level_of_parallelism.max(1),
            is_interruptible,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Posts `event` through the same sink the worker pool uses, then
    /// wakes the scheduling loop so it can react immediately (e.g. an
    /// interrupt enabling the cleanup rule set) instead of waiting for a
    /// worker to finish first. A `UserInterruptedExecution` is silently
    /// dropped when the run was configured with `is_interruptible: false`.
    pub async fn post_event(&self, event: TaskEvent) {
        if !self.is_interruptible && matches!(event, TaskEvent::UserInterruptedExecution) {
            return;
        }
        self.sink.post(event).await;
        self.wake.notify_one();
    }

    /// Drives the task to completion and returns its final status. Never
    /// returns before every spawned worker has finished.
    pub async fn run(&self) -> TaskExitStatus {
        let semaphore = Arc::new(Semaphore::new(self.level_of_parallelism));
        let active = Arc::new(AtomicUsize::new(0));

        loop {
            while let Some(step) = self.state_machine.pop_next_step() {
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => unreachable!("the semaphore is never closed"),
                };
                active.fetch_add(1, Ordering::SeqCst);

                let runner = Arc::clone(&self.runner);
                let sink = Arc::clone(&self.sink);
                let active = Arc::clone(&active);
                let wake = Arc::clone(&self.wake);
                tokio::spawn(async move {
                    runner.run(step, &sink).await;
                    drop(permit);
                    active.fetch_sub(1, Ordering::SeqCst);
                    wake.notify_one();
                });
            }

            if self.state_machine.is_finished() && active.load(Ordering::SeqCst) == 0 {
                break;
            }

            self.wake.notified().await;
        }

        self.state_machine.exit_status()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
