// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver error type.

use thiserror::Error;

/// A failure from a single container-engine operation. The core never
/// inspects the variant; it only ever sees the formatted message through a
/// `…Failed` event (spec.md §7, category 1).
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("docker daemon error: {0}")]
    Daemon(#[from] bollard::errors::Error),

    #[error("build context {path:?} is not readable: {message}")]
    BuildContext { path: std::path::PathBuf, message: String },

    #[error("container {container:?} did not become healthy: {reason}")]
    NotHealthy { container: String, reason: String },

    #[error("container {0:?} exited without a reported exit code")]
    MissingExitCode(String),

    #[error("{0}")]
    Other(String),
}
