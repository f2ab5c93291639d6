// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task graph construction and validation.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

use crate::container::ContainerNode;
use crate::error::CoreError;

/// A named set of containers and the dependency edges between them.
///
/// `Task::validate` is the only place the core checks that a graph is
/// well-formed; once constructed, every other component assumes a valid,
/// acyclic `Task` with exactly one `is_main` container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub containers: Vec<ContainerNode>,
}

impl Task {
    pub fn new(name: impl Into<String>, containers: Vec<ContainerNode>) -> Self {
        Self { name: name.into(), containers }
    }

    /// The container whose lifecycle determines the task's overall outcome.
    pub fn main_container(&self) -> Option<&ContainerNode> {
        self.containers.iter().find(|c| c.is_main)
    }

    pub fn container(&self, name: &str) -> Option<&ContainerNode> {
        self.containers.iter().find(|c| c.name == name)
    }

    /// Direct dependents of `name` (containers that list it in `depends_on`).
    pub fn dependents_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ContainerNode> {
        self.containers.iter().filter(move |c| c.depends_on.iter().any(|d| d == name))
    }

    /// Validate uniqueness of names, that every dependency resolves, that
    /// exactly one container is marked main, and that the dependency graph
    /// is acyclic. Returns the validated task unchanged on success.
    pub fn validate(self) -> Result<Self, CoreError> {
        let mut seen = HashMap::new();
        for c in &self.containers {
            if seen.insert(c.name.as_str(), ()).is_some() {
                return Err(CoreError::DuplicateContainerName(c.name.clone()));
            }
        }

        for c in &self.containers {
            for dep in &c.depends_on {
                if !seen.contains_key(dep.as_str()) {
                    return Err(CoreError::UnknownDependency {
                        container: c.name.clone(),
                        depends_on: dep.clone(),
                    });
                }
            }
        }

        let mains: Vec<&str> = self.containers.iter().filter(|c| c.is_main).map(|c| c.name.as_str()).collect();
        match mains.as_slice() {
            [] => return Err(CoreError::NoMainContainer),
            [_] => {}
            [first, second, ..] => {
                return Err(CoreError::MultipleMainContainers(first.to_string(), second.to_string()))
            }
        }

        self.check_acyclic()?;
        Ok(self)
    }

    fn check_acyclic(&self) -> Result<(), CoreError> {
        let mut graph = DiGraph::<&str, ()>::new();
        let mut indices = HashMap::new();
        for c in &self.containers {
            let idx = graph.add_node(c.name.as_str());
            indices.insert(c.name.as_str(), idx);
        }
        for c in &self.containers {
            let from = indices[c.name.as_str()];
            for dep in &c.depends_on {
                let to = indices[dep.as_str()];
                // an edge dep -> c: dep must become healthy before c starts
                graph.add_edge(to, from, ());
            }
        }
        toposort(&graph, None).map_err(|cycle| {
            let name = graph[cycle.node_id()].to_string();
            CoreError::DependencyCycle(name)
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
