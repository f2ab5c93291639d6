// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! taskforge-core: the event-sourced task execution engine.
//!
//! This crate has no I/O and no async runtime dependency. It owns the
//! data model (container/task graph), the append-only event log, the
//! rules engine that decides which steps are enabled, and the state
//! machine that ties them together. Everything that talks to a container
//! engine, a terminal, or a file lives in the crates that depend on this
//! one.

pub mod macros;

pub mod container;
pub mod error;
pub mod event;
pub mod id;
pub mod planner;
pub mod rules;
pub mod run_options;
pub mod stage;
pub mod state_machine;
pub mod step;
pub mod task;

pub use container::{ContainerNode, EnvValue, HealthCheckConfig, ImageSource, MountMode, PortMapping, VolumeMount};
pub use error::CoreError;
pub use event::TaskEvent;
pub use id::{short, IdBuf};
pub use planner::{plan_cleanup_only, plan_initial_stage};
pub use rules::{cleanup_rules, running_rules, RuleSet};
pub use run_options::{BehaviourAfterFailure, RunOptions, TaskExitStatus, TaskFailureReason};
pub use stage::Stage;
pub use state_machine::TaskStateMachine;
pub use step::Step;
pub use task::Task;
