// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seeds the initial stage a validated task starts execution in.

use crate::event::TaskEvent;
use crate::stage::Stage;
use crate::task::Task;

/// Every task begins in `Running` with an empty log. The planner exists as
/// its own step, separate from the state machine's constructor, so that a
/// task-level fatal failure discovered before execution starts (for
/// example, a dependency the container-engine driver rejects outright) can
/// instead seed `CleaningUp` directly with no resources yet created.
pub fn plan_initial_stage(_task: &Task) -> (Stage, Vec<TaskEvent>) {
    (Stage::Running, Vec::new())
}

/// Bypasses the running stage entirely: used when task construction fails
/// before any container has been touched.
pub fn plan_cleanup_only(reason: TaskEvent) -> (Stage, Vec<TaskEvent>) {
    (Stage::CleaningUp, vec![reason])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerNode, ImageSource};

    #[test]
    fn initial_stage_is_running_with_empty_log() {
        let task = Task::new(
            "build",
            vec![ContainerNode::new("app", ImageSource::Pull { image: "app:latest".into() }).is_main(true)],
        );
        let (stage, log) = plan_initial_stage(&task);
        assert_eq!(stage, Stage::Running);
        assert!(log.is_empty());
    }

    #[test]
    fn cleanup_only_seeds_cleaning_up_with_the_given_reason() {
        let reason = TaskEvent::CleanupFailed { message: "no driver available".into() };
        let (stage, log) = plan_cleanup_only(reason.clone());
        assert_eq!(stage, Stage::CleaningUp);
        assert_eq!(log, vec![reason]);
    }
}
