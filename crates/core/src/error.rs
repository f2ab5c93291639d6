// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core error types.

use thiserror::Error;

/// Errors that can occur constructing or validating a [`crate::task::Task`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("container name {0:?} is used by more than one node")]
    DuplicateContainerName(String),

    #[error("container {container:?} depends on unknown container {depends_on:?}")]
    UnknownDependency { container: String, depends_on: String },

    #[error("task has no main container")]
    NoMainContainer,

    #[error("task has more than one main container: {0:?} and {1:?}")]
    MultipleMainContainers(String, String),

    #[error("dependency graph contains a cycle involving {0:?}")]
    DependencyCycle(String),
}
