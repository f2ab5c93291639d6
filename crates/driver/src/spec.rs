// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain input data the dispatcher hands to a [`crate::ContainerEngineDriver`].
//!
//! These mirror `taskforge_core::container` shapes but deliberately don't
//! depend on the core crate: the driver's contract is the narrow one
//! spec.md §6 describes, resolvable from primitives alone. The dispatcher
//! (in `taskforge-engine`) is the only place that translates a
//! `ContainerNode` into one of these.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildSource {
    Build { context: PathBuf, dockerfile: Option<PathBuf> },
    Pull { image: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub host_path: PathBuf,
    pub container_path: PathBuf,
    pub mode: MountMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub local: u16,
    pub container: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheckSpec {
    pub interval: Duration,
    pub retries: u32,
    pub start_period: Duration,
}

/// Everything the driver needs to create one container. `name` becomes
/// both the docker container name and the value other containers resolve
/// it by on the task network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub network: String,
    pub command: Option<Vec<String>>,
    pub environment: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub volumes: Vec<VolumeMount>,
    pub ports: Vec<PortMapping>,
    pub run_as_current_user: bool,
}
