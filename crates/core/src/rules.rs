// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure functions over the event log that decide which steps are enabled.
//!
//! Every rule answers one question: "given everything that has happened so
//! far, is there a container (or the network) for which this kind of step
//! may now run, and hasn't already run?" A rule's enabling and suppression
//! logic lives entirely in its closure; nothing here mutates the log, and
//! a rule never re-enters the log to emit further events itself.

use std::collections::HashSet;

use crate::container::ContainerNode;
use crate::event::TaskEvent;
use crate::step::Step;
use crate::task::Task;

/// One rule: a name (for diagnostics) and a function producing every step
/// it currently permits, across all containers, in the task's declared
/// order. The rules engine takes the first non-empty rule's first step, so
/// ordering within and across rules is what makes `pop_next_step`
/// deterministic.
pub struct Rule {
    pub name: &'static str,
    evaluate: fn(&Task, &[TaskEvent]) -> Vec<Step>,
}

impl Rule {
    fn run(&self, task: &Task, log: &[TaskEvent]) -> Vec<Step> {
        (self.evaluate)(task, log)
    }
}

/// An ordered collection of rules scanned top to bottom.
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Returns the next enabled step, or `None` if nothing is currently
    /// runnable. Scans rules in declaration order and, within a rule,
    /// containers in the task's declared order — both fixed, so two calls
    /// against the same log always agree.
    pub fn next_step(&self, task: &Task, log: &[TaskEvent]) -> Option<Step> {
        for rule in &self.rules {
            let mut steps = rule.run(task, log);
            if !steps.is_empty() {
                return Some(steps.remove(0));
            }
        }
        None
    }

    /// Every step currently enabled, in the same order `next_step` would
    /// hand them out one at a time. Used by the parallel execution manager
    /// to fill idle worker slots in one pass.
    pub fn enabled_steps(&self, task: &Task, log: &[TaskEvent]) -> Vec<Step> {
        self.rules.iter().flat_map(|r| r.run(task, log)).collect()
    }
}

fn already_started(log: &[TaskEvent], matches: impl Fn(&TaskEvent) -> bool) -> bool {
    log.iter().any(matches)
}

fn image_ready(log: &[TaskEvent], name: &str) -> bool {
    log.iter().any(|e| match e {
        TaskEvent::ImageBuilt { container } | TaskEvent::ImagePulled { container } => container == name,
        _ => false,
    })
}

/// True if `name`'s image failed, or any container it (transitively)
/// depends on failed anywhere along the chain. Resolves the scoped-failure
/// design decision: a failure only suppresses its own dependents.
fn ancestor_failed(task: &Task, log: &[TaskEvent], name: &str) -> bool {
    let mut stack = vec![name.to_string()];
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        let node_failed = log.iter().any(|e| match e {
            TaskEvent::ImageBuildFailed { container }
            | TaskEvent::ImagePullFailed { container }
            | TaskEvent::ContainerCreationFailed { container, .. }
            | TaskEvent::ContainerStartFailed { container, .. }
            | TaskEvent::ContainerHealthCheckFailed { container, .. } => container == &current,
            _ => false,
        });
        if node_failed {
            return true;
        }
        if let Some(node) = task.container(&current) {
            stack.extend(node.depends_on.iter().cloned());
        }
    }
    false
}

fn network_ready(log: &[TaskEvent]) -> bool {
    log.contains(&TaskEvent::NetworkCreated)
}

fn network_failed(log: &[TaskEvent]) -> bool {
    log.iter().any(|e| matches!(e, TaskEvent::NetworkCreationFailed { .. }))
}

fn container_created(log: &[TaskEvent], name: &str) -> bool {
    log.iter().any(|e| matches!(e, TaskEvent::ContainerCreated { container } if container == name))
}

fn container_started(log: &[TaskEvent], name: &str) -> bool {
    log.iter().any(|e| matches!(e, TaskEvent::ContainerStarted { container } if container == name))
}

fn container_healthy(log: &[TaskEvent], name: &str) -> bool {
    log.iter().any(|e| matches!(e, TaskEvent::ContainerBecameHealthy { container } if container == name))
}

fn container_exited(log: &[TaskEvent], name: &str) -> bool {
    log.iter().any(|e| matches!(e, TaskEvent::ContainerExited { container, .. } if container == name))
}

fn dependencies_healthy(log: &[TaskEvent], node: &ContainerNode) -> bool {
    node.depends_on.iter().all(|dep| container_healthy(log, dep))
}

/// Rules that apply while the task is in the `Running` stage.
pub fn running_rules() -> RuleSet {
    RuleSet {
        rules: vec![
            Rule {
                name: "build_or_pull_image",
                evaluate: |task, log| {
                    task.containers
                        .iter()
                        .filter(|c| !ancestor_failed(task, log, &c.name))
                        .filter_map(|c| match &c.image_source {
                            crate::container::ImageSource::Build { .. } => {
                                let started = already_started(log, |e| {
                                    matches!(e, TaskEvent::ImageBuildStarted { container } if container == &c.name)
                                });
                                (!started).then(|| Step::BuildImage { container: c.name.clone() })
                            }
                            crate::container::ImageSource::Pull { .. } => {
                                let started = already_started(log, |e| {
                                    matches!(e, TaskEvent::ImagePullStarted { container } if container == &c.name)
                                });
                                (!started).then(|| Step::PullImage { container: c.name.clone() })
                            }
                        })
                        .collect()
                },
            },
            Rule {
                name: "create_network",
                evaluate: |task, log| {
                    let needs_network = !task.containers.is_empty();
                    let started = already_started(log, |e| {
                        matches!(e, TaskEvent::NetworkCreated | TaskEvent::NetworkCreationFailed { .. })
                    });
                    if needs_network && !started { vec![Step::CreateNetwork] } else { vec![] }
                },
            },
            Rule {
                name: "create_container",
                evaluate: |task, log| {
                    if !network_ready(log) || network_failed(log) {
                        return vec![];
                    }
                    task.containers
                        .iter()
                        .filter(|c| image_ready(log, &c.name) && !ancestor_failed(task, log, &c.name))
                        .filter(|c| dependencies_healthy(log, c))
                        .filter(|c| !container_created(log, &c.name))
                        .map(|c| Step::CreateContainer { container: c.name.clone() })
                        .collect()
                },
            },
            Rule {
                name: "start_container",
                evaluate: |task, log| {
                    task.containers
                        .iter()
                        .filter(|c| container_created(log, &c.name))
                        .filter(|c| !ancestor_failed(task, log, &c.name))
                        .filter(|c| !container_started(log, &c.name))
                        .map(|c| Step::StartContainer { container: c.name.clone() })
                        .collect()
                },
            },
            Rule {
                name: "wait_for_healthy",
                evaluate: |task, log| {
                    task.containers
                        .iter()
                        .filter(|c| c.health_check.is_some())
                        .filter(|c| container_started(log, &c.name))
                        .filter(|c| !container_healthy(log, &c.name))
                        .filter(|c| {
                            !already_started(log, |e| {
                                matches!(e, TaskEvent::ContainerHealthCheckFailed { container, .. } if container == &c.name)
                            })
                        })
                        .map(|c| Step::WaitForHealthy { container: c.name.clone() })
                        .collect()
                },
            },
            Rule {
                name: "run_main_container",
                evaluate: |task, log| {
                    task.containers
                        .iter()
                        .filter(|c| c.is_main)
                        .filter(|c| container_healthy(log, &c.name))
                        .filter(|c| dependencies_healthy(log, c))
                        .filter(|c| !container_exited(log, &c.name))
                        .map(|c| Step::RunContainer { container: c.name.clone() })
                        .collect()
                },
            },
        ],
    }
}

/// Rules that apply once the task has moved to `CleaningUp`. Every
/// container that reached `ContainerCreated` gets stopped then removed,
/// regardless of how the running stage ended; the network is deleted only
/// after every container in it is gone.
pub fn cleanup_rules() -> RuleSet {
    RuleSet {
        rules: vec![
            Rule {
                name: "stop_container",
                evaluate: |task, log| {
                    task.containers
                        .iter()
                        .filter(|c| container_created(log, &c.name))
                        .filter(|c| container_started(log, &c.name))
                        .filter(|c| {
                            !already_started(log, |e| {
                                matches!(
                                    e,
                                    TaskEvent::ContainerStopped { container }
                                        | TaskEvent::ContainerStopFailed { container, .. }
                                        | TaskEvent::ContainerExited { container, .. }
                                        if container == &c.name
                                )
                            })
                        })
                        .map(|c| Step::StopContainer { container: c.name.clone() })
                        .collect()
                },
            },
            Rule {
                name: "remove_container",
                evaluate: |task, log| {
                    task.containers
                        .iter()
                        .filter(|c| container_created(log, &c.name))
                        .filter(|c| {
                            already_started(log, |e| {
                                matches!(
                                    e,
                                    TaskEvent::ContainerStopped { container }
                                        | TaskEvent::ContainerStopFailed { container, .. }
                                        | TaskEvent::ContainerExited { container, .. }
                                        if container == &c.name
                                )
                            })
                        })
                        .filter(|c| {
                            !already_started(log, |e| {
                                matches!(
                                    e,
                                    TaskEvent::ContainerRemoved { container }
                                        | TaskEvent::ContainerRemovalFailed { container, .. }
                                        if container == &c.name
                                )
                            })
                        })
                        .map(|c| Step::RemoveContainer { container: c.name.clone() })
                        .collect()
                },
            },
            Rule {
                name: "delete_network",
                evaluate: |task, log| {
                    if !network_ready(log) {
                        return vec![];
                    }
                    let all_removed = task.containers.iter().filter(|c| container_created(log, &c.name)).all(|c| {
                        already_started(log, |e| {
                            matches!(e, TaskEvent::ContainerRemoved { container } if container == &c.name)
                        })
                    });
                    let already_deleted = already_started(log, |e| {
                        matches!(e, TaskEvent::NetworkDeleted | TaskEvent::NetworkDeletionFailed { .. })
                    });
                    if all_removed && !already_deleted { vec![Step::DeleteNetwork] } else { vec![] }
                },
            },
        ],
    }
}

/// Whether the running stage should end and cleanup should begin: the main
/// container reached a terminal event, the user interrupted execution, or
/// the network itself could never be created.
pub fn should_begin_cleanup(task: &Task, log: &[TaskEvent]) -> bool {
    if log.contains(&TaskEvent::UserInterruptedExecution) {
        return true;
    }
    if log.iter().any(|e| matches!(e, TaskEvent::ExecutionFailed { .. })) {
        return true;
    }
    if network_failed(log) {
        return true;
    }
    let Some(main) = task.main_container() else { return false };
    log.iter().any(|e| match e {
        TaskEvent::ContainerExited { container, .. } => container == &main.name,
        TaskEvent::ContainerStartFailed { container, .. } => container == &main.name,
        TaskEvent::ContainerCreationFailed { container, .. } => container == &main.name,
        TaskEvent::ImageBuildFailed { container } | TaskEvent::ImagePullFailed { container } => {
            container == &main.name
        }
        TaskEvent::ContainerHealthCheckFailed { container, .. } => container == &main.name,
        _ => false,
    })
}

/// Whether cleanup itself has run to completion: every container ever
/// created has reached a removed/failed-to-remove outcome, and the network
/// (if it was ever created) has been deleted or failed to delete.
pub fn cleanup_is_complete(task: &Task, log: &[TaskEvent]) -> bool {
    let containers_done = task.containers.iter().filter(|c| container_created(log, &c.name)).all(|c| {
        already_started(log, |e| {
            matches!(
                e,
                TaskEvent::ContainerRemoved { container } | TaskEvent::ContainerRemovalFailed { container, .. }
                    if container == &c.name
            )
        })
    });
    let network_done = !network_ready(log)
        || already_started(log, |e| matches!(e, TaskEvent::NetworkDeleted | TaskEvent::NetworkDeletionFailed { .. }));
    containers_done && network_done
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
