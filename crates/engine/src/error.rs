// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("task failed validation: {0}")]
    InvalidTask(#[from] taskforge_core::CoreError),

    #[error("structured log writer error: {0}")]
    Log(#[from] std::io::Error),
}
