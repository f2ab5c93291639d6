// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ConsoleUiLogger`: the one real [`UiEventLogger`] implementation,
//! rendering "starting X" / event lines to stderr so stdout stays free for
//! whatever the main container itself writes.

use async_trait::async_trait;

use taskforge_core::{Step, TaskEvent};
use taskforge_engine::UiEventLogger;

/// Writes one line per step-start and per event to stderr. `quiet`
/// suppresses `*Progress` lines (build/pull/run streaming output) while
/// still showing start/terminal events — the same distinction
/// `RunOptions::quiet_output` makes for the structured log.
pub struct ConsoleUiLogger {
    quiet: bool,
}

impl ConsoleUiLogger {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

#[async_trait]
impl UiEventLogger for ConsoleUiLogger {
    async fn on_starting_task_step(&self, step: &Step) {
        eprintln!("==> {step}");
    }

    async fn post_event(&self, event: &TaskEvent) {
        if self.quiet && is_progress(event) {
            return;
        }
        if event.is_failure() {
            eprintln!("xx  {}", event.summary());
        } else {
            eprintln!("--  {}", event.summary());
        }
    }
}

fn is_progress(event: &TaskEvent) -> bool {
    matches!(
        event,
        TaskEvent::ImageBuildProgress { .. } | TaskEvent::ImagePullProgress { .. } | TaskEvent::ContainerRunProgress { .. }
    )
}
