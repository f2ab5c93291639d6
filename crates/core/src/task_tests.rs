// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::container::ImageSource;

fn pull(name: &str) -> ContainerNode {
    ContainerNode::new(name, ImageSource::Pull { image: format!("{name}:latest") })
}

#[test]
fn single_main_container_validates() {
    let task = Task::new("build", vec![pull("app").is_main(true)]);
    assert!(task.validate().is_ok());
}

#[test]
fn missing_main_container_is_rejected() {
    let task = Task::new("build", vec![pull("app")]);
    assert_eq!(task.validate().unwrap_err(), CoreError::NoMainContainer);
}

#[test]
fn two_main_containers_is_rejected() {
    let task = Task::new("build", vec![pull("app").is_main(true), pull("other").is_main(true)]);
    assert!(matches!(task.validate().unwrap_err(), CoreError::MultipleMainContainers(..)));
}

#[test]
fn duplicate_names_are_rejected() {
    let task = Task::new("build", vec![pull("app").is_main(true), pull("app")]);
    assert_eq!(task.validate().unwrap_err(), CoreError::DuplicateContainerName("app".into()));
}

#[test]
fn unknown_dependency_is_rejected() {
    let task = Task::new(
        "build",
        vec![pull("app").is_main(true).depends_on(vec!["db".to_string()])],
    );
    assert_eq!(
        task.validate().unwrap_err(),
        CoreError::UnknownDependency { container: "app".into(), depends_on: "db".into() }
    );
}

#[test]
fn direct_cycle_is_rejected() {
    let task = Task::new(
        "build",
        vec![
            pull("a").is_main(true).depends_on(vec!["b".to_string()]),
            pull("b").depends_on(vec!["a".to_string()]),
        ],
    );
    assert!(matches!(task.validate().unwrap_err(), CoreError::DependencyCycle(_)));
}

#[test]
fn diamond_dependency_graph_validates() {
    let task = Task::new(
        "build",
        vec![
            pull("base"),
            pull("left").depends_on(vec!["base".to_string()]),
            pull("right").depends_on(vec!["base".to_string()]),
            pull("app").is_main(true).depends_on(vec!["left".to_string(), "right".to_string()]),
        ],
    );
    assert!(task.validate().is_ok());
}

#[test]
fn dependents_of_returns_direct_dependents_only() {
    let task = Task::new(
        "build",
        vec![
            pull("base"),
            pull("left").depends_on(vec!["base".to_string()]),
            pull("app").is_main(true).depends_on(vec!["left".to_string()]),
        ],
    );
    let names: Vec<&str> = task.dependents_of("base").map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["left"]);
}
