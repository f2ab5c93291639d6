// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! taskforge-driver: the container engine driver contract (spec.md §6).
//!
//! This crate knows nothing about tasks, steps, or event logs — it is the
//! narrow boundary the core's step runner dispatches through. One real
//! implementation, [`docker::BollardDriver`], talks to the Docker daemon
//! over `bollard`. A second, [`fake::FakeDriver`] (behind the
//! `test-support` feature), is a deterministic, rendezvous-capable double
//! used by `taskforge-engine`'s concurrency tests.

pub mod error;
pub mod spec;

pub mod docker;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;

pub use error::DriverError;
pub use spec::{BuildSource, ContainerSpec, HealthCheckSpec, MountMode, PortMapping, VolumeMount};

/// A callback the driver feeds streaming progress lines through. Never
/// panics; the driver treats it as a pure sink.
pub type ProgressSink<'a> = &'a mut dyn FnMut(String);

/// The operations the step runner (C6) dispatches each [`crate::spec`]
/// request through, matching spec.md §6's "to the engine driver" contract
/// one-for-one.
#[async_trait]
pub trait ContainerEngineDriver: Send + Sync {
    async fn build_image(&self, source: &BuildSource, progress: ProgressSink<'_>) -> Result<String, DriverError>;

    async fn pull_image(&self, image: &str, progress: ProgressSink<'_>) -> Result<String, DriverError>;

    async fn create_network(&self, name: &str) -> Result<(), DriverError>;

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DriverError>;

    async fn start_container(&self, container_id: &str) -> Result<(), DriverError>;

    async fn wait_for_healthy(&self, container_id: &str, health_check: &HealthCheckSpec) -> Result<(), DriverError>;

    /// Blocks until the container exits, returning its exit code.
    async fn run_container(&self, container_id: &str, progress: ProgressSink<'_>) -> Result<i32, DriverError>;

    async fn stop_container(&self, container_id: &str) -> Result<(), DriverError>;

    async fn remove_container(&self, container_id: &str) -> Result<(), DriverError>;

    async fn delete_network(&self, name: &str) -> Result<(), DriverError>;
}
