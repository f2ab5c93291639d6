// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! taskforge-engine: drives a validated task to completion against a
//! [`taskforge_driver::ContainerEngineDriver`].
//!
//! Owns the pieces that sit between the pure state machine in
//! `taskforge-core` and a concrete container engine: the UI event
//! contract, the structured diagnostic log writer, the event sink that
//! structurally enforces "UI before state machine," the step dispatcher
//! (C6), and the bounded-concurrency parallel execution manager (C5).
//! [`run::run`] is the single entry point most callers need.

pub mod dispatcher;
pub mod error;
pub mod manager;
pub mod run;
pub mod sink;
pub mod structured_log;
pub mod ui;

pub use dispatcher::StepRunner;
pub use error::EngineError;
pub use manager::ParallelExecutionManager;
pub use run::run;
pub use sink::EventSink;
pub use structured_log::{JsonLinesWriter, Severity, StructuredLogWriter};
pub use ui::{NullUiLogger, UiEventLogger};
