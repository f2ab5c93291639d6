// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level task run: wires the planner (C2), state machine (C4), the
//! parallel execution manager (C5), and the step runner (C6) into the
//! single call a caller needs for "run this task to completion."

use std::sync::Arc;

use taskforge_core::{plan_initial_stage, RunOptions, Task, TaskExitStatus, TaskStateMachine};
use taskforge_driver::ContainerEngineDriver;

use crate::dispatcher::StepRunner;
use crate::manager::ParallelExecutionManager;
use crate::sink::EventSink;
use crate::structured_log::StructuredLogWriter;
use crate::ui::UiEventLogger;

/// Builds a manager for `task` without running it. Returned behind an
/// `Arc` so a caller can `tokio::spawn` `manager.run()` while retaining a
/// handle to call `post_event` concurrently — the shape a signal handler
/// posting `UserInterruptedExecution` needs (spec.md §4.5's `postEvent`
/// entry point).
pub fn build<D, U>(
    task: Task,
    run_options: RunOptions,
    driver: Arc<D>,
    ui: Arc<U>,
    log: Arc<dyn StructuredLogWriter>,
    network_name: impl Into<String>,
) -> Arc<ParallelExecutionManager<D, U>>
where
    D: ContainerEngineDriver + 'static,
    U: UiEventLogger + 'static,
{
    let (stage, log_seed) = plan_initial_stage(&task);
    let quiet_output = run_options.quiet_output;
    let level_of_parallelism = run_options.level_of_parallelism;
    let is_interruptible = run_options.is_interruptible;
    let additional_command_args = run_options.additional_command_args.clone();
    let state_machine = Arc::new(TaskStateMachine::with_initial_log(task.clone(), run_options, stage, log_seed));
    let sink = Arc::new(EventSink::new(Arc::clone(&state_machine), ui, log, quiet_output));
    let runner = Arc::new(StepRunner::new(task, driver, network_name, additional_command_args));
    Arc::new(ParallelExecutionManager::new(state_machine, sink, runner, level_of_parallelism, is_interruptible))
}

/// Convenience wrapper for callers that have no need to post external
/// events mid-run: builds the manager and drives it to completion.
pub async fn run<D, U>(
    task: Task,
    run_options: RunOptions,
    driver: Arc<D>,
    ui: Arc<U>,
    log: Arc<dyn StructuredLogWriter>,
    network_name: impl Into<String>,
) -> TaskExitStatus
where
    D: ContainerEngineDriver + 'static,
    U: UiEventLogger + 'static,
{
    build(task, run_options, driver, ui, log, network_name).run().await
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
