// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal TOML task-file loading: a `TaskFile` DTO, independent of
//! `taskforge-core`'s types, resolved into a validated [`Task`] graph.
//!
//! Full schema validation, includes, and environment-file resolution are
//! out of scope (spec.md §1): this loader does just enough to construct a
//! graph the core can validate, then defers to [`Task::validate`] for the
//! DAG/uniqueness invariants.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use taskforge_core::{
    ContainerNode, EnvValue, HealthCheckConfig, ImageSource, MountMode, PortMapping, Task, VolumeMount,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read task file {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse task file {path:?}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("container {container:?} port mapping {local} is out of range (must be 1..=65535)")]
    PortOutOfRange { container: String, local: u32 },

    #[error(transparent)]
    Core(#[from] taskforge_core::CoreError),
}

#[derive(Debug, Deserialize)]
struct TaskFile {
    name: String,
    containers: Vec<ContainerSpec>,
}

#[derive(Debug, Deserialize)]
struct ContainerSpec {
    name: String,
    #[serde(flatten)]
    image: ImageSpec,
    #[serde(default)]
    command: Option<Vec<String>>,
    #[serde(default)]
    environment: HashMap<String, EnvSpec>,
    #[serde(default)]
    working_dir: Option<PathBuf>,
    #[serde(default)]
    volumes: Vec<VolumeSpec>,
    #[serde(default)]
    ports: Vec<PortSpec>,
    #[serde(default)]
    health_check: Option<HealthCheckSpec>,
    #[serde(default)]
    run_as_current_user: bool,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    main: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageSpec {
    Build { build: PathBuf, dockerfile: Option<PathBuf> },
    Pull { image: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvSpec {
    Literal(String),
    FromHost { from_host: String },
}

#[derive(Debug, Deserialize)]
struct VolumeSpec {
    host_path: PathBuf,
    container_path: PathBuf,
    #[serde(default)]
    read_only: bool,
}

#[derive(Debug, Deserialize)]
struct PortSpec {
    local: u32,
    container: u32,
}

#[derive(Debug, Deserialize)]
struct HealthCheckSpec {
    interval_ms: u64,
    retries: u32,
    start_period_ms: u64,
}

/// Loads `path` and resolves it into a validated [`Task`]. Cycle/uniqueness
/// checking happens inside [`Task::validate`]; this function only maps the
/// DTO shapes onto the core's types and range-checks ports, which the core
/// has no opinion about.
pub fn load_task(path: &Path) -> Result<Task, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let file: TaskFile =
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

    let mut containers = Vec::with_capacity(file.containers.len());
    for spec in file.containers {
        containers.push(resolve_container(spec)?);
    }

    Ok(Task::new(file.name, containers).validate()?)
}

fn resolve_container(spec: ContainerSpec) -> Result<ContainerNode, ConfigError> {
    let image_source = match spec.image {
        ImageSpec::Build { build, dockerfile } => ImageSource::Build { context: build, dockerfile },
        ImageSpec::Pull { image } => ImageSource::Pull { image },
    };

    let environment = spec
        .environment
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                EnvSpec::Literal(v) => EnvValue::Literal(v),
                EnvSpec::FromHost { from_host } => EnvValue::FromHost(from_host),
            };
            (key, value)
        })
        .collect();

    let mut ports = Vec::with_capacity(spec.ports.len());
    for port in spec.ports {
        for local in [port.local, port.container] {
            if local == 0 || local > u16::MAX as u32 {
                return Err(ConfigError::PortOutOfRange { container: spec.name.clone(), local });
            }
        }
        ports.push(PortMapping { local: port.local as u16, container: port.container as u16 });
    }

    let volume_mounts = spec
        .volumes
        .into_iter()
        .map(|v| VolumeMount {
            host_path: v.host_path,
            container_path: v.container_path,
            mode: if v.read_only { MountMode::ReadOnly } else { MountMode::ReadWrite },
        })
        .collect();

    let health_check = spec.health_check.map(|h| HealthCheckConfig {
        interval: std::time::Duration::from_millis(h.interval_ms),
        retries: h.retries,
        start_period: std::time::Duration::from_millis(h.start_period_ms),
    });

    Ok(ContainerNode::new(spec.name, image_source)
        .command(spec.command)
        .environment(environment)
        .working_dir(spec.working_dir)
        .volume_mounts(volume_mounts)
        .ports(ports)
        .health_check(health_check)
        .run_as_current_user(spec.run_as_current_user)
        .depends_on(spec.depends_on)
        .is_main(spec.main))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
