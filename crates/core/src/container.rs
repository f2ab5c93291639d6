// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container node definitions: the unit of work a task graph is built from.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where a container's image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Build from a Dockerfile rooted at `context`.
    Build {
        context: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dockerfile: Option<PathBuf>,
    },
    /// Pull a pre-built image by reference.
    Pull { image: String },
}

/// An environment variable value, resolved by the dispatcher at container
/// creation time. The rules engine never inspects these; it only reasons
/// about container identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvValue {
    Literal(String),
    /// Resolved from the named variable in the host process environment.
    FromHost(String),
}

/// Mount access mode for a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountMode {
    ReadWrite,
    ReadOnly,
}

impl Default for MountMode {
    fn default() -> Self {
        Self::ReadWrite
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub host_path: PathBuf,
    pub container_path: PathBuf,
    #[serde(default)]
    pub mode: MountMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub local: u16,
    pub container: u16,
}

/// Health check polling parameters. Containers without one are treated as
/// healthy the instant they start (see the rules engine's synthetic
/// `ContainerBecameHealthy` emission).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    #[serde(with = "duration_millis")]
    pub interval: Duration,
    pub retries: u32,
    #[serde(with = "duration_millis")]
    pub start_period: Duration,
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}

/// A single container in a task's dependency graph.
///
/// `name` is the graph key: other containers reference it in
/// `depends_on`, and events/steps identify the container by this name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerNode {
    pub name: String,
    pub image_source: ImageSource,
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub environment: Vec<(String, EnvValue)>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub health_check: Option<HealthCheckConfig>,
    /// Run the container's process as the UID/GID of the user invoking the
    /// task rather than the image's default user. Resolved by the
    /// dispatcher at `CreateContainer` time, same as `EnvValue::FromHost`.
    #[serde(default)]
    pub run_as_current_user: bool,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Whether this container is the task's main container: its exit code
    /// determines task success, and its completion triggers cleanup.
    #[serde(default)]
    pub is_main: bool,
}

impl ContainerNode {
    pub fn new(name: impl Into<String>, image_source: ImageSource) -> Self {
        Self {
            name: name.into(),
            image_source,
            command: None,
            environment: Vec::new(),
            working_dir: None,
            volume_mounts: Vec::new(),
            ports: Vec::new(),
            health_check: None,
            run_as_current_user: false,
            depends_on: Vec::new(),
            is_main: false,
        }
    }

    crate::setters! {
        set { command: Option<Vec<String>> }
        set { environment: Vec<(String, EnvValue)> }
        set { working_dir: Option<PathBuf> }
        set { volume_mounts: Vec<VolumeMount> }
        set { ports: Vec<PortMapping> }
        set { health_check: Option<HealthCheckConfig> }
        set { run_as_current_user: bool }
        set { depends_on: Vec<String> }
        set { is_main: bool }
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
