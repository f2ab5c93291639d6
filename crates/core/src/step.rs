// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of units of work the rules engine can enable and the
//! step runner can dispatch.

/// One unit of dispatchable work against a single container or the task's
/// shared network. Every variant maps to exactly one
/// [`taskforge_driver::ContainerEngineDriver`] call in the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    BuildImage { container: String },
    PullImage { container: String },
    CreateNetwork,
    CreateContainer { container: String },
    StartContainer { container: String },
    WaitForHealthy { container: String },
    /// Blocks until the container exits and posts its exit code. Only ever
    /// enabled for the task's main container — dependency containers are
    /// long-lived services whose lifetime ends at cleanup, not at exit.
    RunContainer { container: String },
    StopContainer { container: String },
    RemoveContainer { container: String },
    DeleteNetwork,
}

impl Step {
    /// The container this step acts on, if any (`CreateNetwork` and
    /// `DeleteNetwork` act on the task's shared network instead).
    pub fn container(&self) -> Option<&str> {
        match self {
            Step::BuildImage { container }
            | Step::PullImage { container }
            | Step::CreateContainer { container }
            | Step::StartContainer { container }
            | Step::WaitForHealthy { container }
            | Step::RunContainer { container }
            | Step::StopContainer { container }
            | Step::RemoveContainer { container } => Some(container),
            Step::CreateNetwork | Step::DeleteNetwork => None,
        }
    }
}

/// The textual form spec.md §4.1 requires: the variant name plus its
/// significant identifiers, e.g. `BuildImage(container: 'app')`.
impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::BuildImage { container } => write!(f, "BuildImage(container: '{container}')"),
            Step::PullImage { container } => write!(f, "PullImage(container: '{container}')"),
            Step::CreateNetwork => write!(f, "CreateNetwork"),
            Step::CreateContainer { container } => write!(f, "CreateContainer(container: '{container}')"),
            Step::StartContainer { container } => write!(f, "StartContainer(container: '{container}')"),
            Step::WaitForHealthy { container } => write!(f, "WaitForHealthy(container: '{container}')"),
            Step::RunContainer { container } => write!(f, "RunContainer(container: '{container}')"),
            Step::StopContainer { container } => write!(f, "StopContainer(container: '{container}')"),
            Step::RemoveContainer { container } => write!(f, "RemoveContainer(container: '{container}')"),
            Step::DeleteNetwork => write!(f, "DeleteNetwork"),
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
