// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Options controlling a single task execution, and the outcome it ends in.

/// What to do with containers and the network once the main container has
/// finished, failed, or the task was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviourAfterFailure {
    /// Always stop and remove every resource this run created.
    CleanUp,
    /// Leave containers and the network running for inspection. The task
    /// is reported finished without ever entering the cleanup rule set.
    DontCleanUp,
}

impl Default for BehaviourAfterFailure {
    fn default() -> Self {
        Self::CleanUp
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// The task's name, as given in the task file. Carried here (rather
    /// than read back off `Task`) because spec.md §6 defines it as part of
    /// the run configuration a caller supplies, independent of the task
    /// graph itself — e.g. for diagnostics emitted before the task even
    /// loads.
    pub task_name: String,
    /// Extra arguments appended to the main container's command at
    /// `CreateContainer` time (spec.md §6
    /// `additionalCommandArgs`/`additionalTaskCommandArguments`).
    pub additional_command_args: Vec<String>,
    /// Maximum number of steps the parallel execution manager may have
    /// in flight at once.
    pub level_of_parallelism: usize,
    pub behaviour_after_failure: BehaviourAfterFailure,
    /// Whether a `UserInterruptedExecution` posted from outside the worker
    /// loop (e.g. a Ctrl-C handler) is honoured. When `false` the manager
    /// ignores such events outright rather than beginning cleanup early.
    pub is_interruptible: bool,
    /// Suppress forwarding `*Progress` events to the UI listener. They are
    /// still written to the structured log.
    pub quiet_output: bool,
}

impl RunOptions {
    pub fn new(level_of_parallelism: usize) -> Self {
        Self {
            task_name: String::new(),
            additional_command_args: Vec::new(),
            level_of_parallelism: level_of_parallelism.max(1),
            behaviour_after_failure: BehaviourAfterFailure::default(),
            is_interruptible: true,
            quiet_output: false,
        }
    }

    crate::setters! {
        into { task_name: String }
        set { additional_command_args: Vec<String> }
        set { behaviour_after_failure: BehaviourAfterFailure }
        set { is_interruptible: bool }
        set { quiet_output: bool }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Why a task did not end in plain success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailureReason {
    MainContainerFailed { exit_code: i32 },
    DependencyUnhealthy { container: String },
    ExecutionFailed { message: String },
    Interrupted,
    CleanupIncomplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskExitStatus {
    Success,
    Failed(TaskFailureReason),
}

impl TaskExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskExitStatus::Success)
    }
}
