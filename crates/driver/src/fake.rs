// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A deterministic, inspectable [`ContainerEngineDriver`] double, gated
//! behind the `test-support` feature. Grounded in the teacher's
//! `FakeNotifyAdapter`/`FakeAgentAdapter` shape (`crates/adapters/src/notify.rs`):
//! an `Arc<Mutex<State>>` wrapping a call log plus per-target configurable
//! outcomes, `Clone` so every worker holds a handle to the same state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Barrier;

use crate::error::DriverError;
use crate::spec::{BuildSource, ContainerSpec, HealthCheckSpec};
use crate::{ContainerEngineDriver, ProgressSink};

struct FakeState {
    calls: Vec<String>,
    created_commands: HashMap<String, Option<Vec<String>>>,
    build_failures: HashMap<String, String>,
    pull_failures: HashMap<String, String>,
    create_failures: HashMap<String, String>,
    start_failures: HashMap<String, String>,
    health_failures: HashMap<String, String>,
    exit_codes: HashMap<String, i32>,
    stop_failures: HashMap<String, String>,
    remove_failures: HashMap<String, String>,
    network_create_failure: Option<String>,
    network_delete_failure: Option<String>,
    /// Named rendezvous points: a driver call blocks on `barrier.wait()`
    /// before returning if `"<step>:<target>"` matches a registered gate,
    /// or if the wildcard gate `"*"` is registered — letting a test force
    /// two or more workers to be in-flight at the same instant (spec.md §8
    /// scenario 3/4: "observes the other running ... using a rendezvous").
    gates: HashMap<String, Arc<Barrier>>,
}

/// Fake container engine driver for deterministic engine tests.
#[derive(Clone)]
pub struct FakeDriver {
    inner: Arc<Mutex<FakeState>>,
    concurrency: Arc<AtomicUsize>,
    max_concurrency: Arc<AtomicUsize>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                created_commands: HashMap::new(),
                build_failures: HashMap::new(),
                pull_failures: HashMap::new(),
                create_failures: HashMap::new(),
                start_failures: HashMap::new(),
                health_failures: HashMap::new(),
                exit_codes: HashMap::new(),
                stop_failures: HashMap::new(),
                remove_failures: HashMap::new(),
                network_create_failure: None,
                network_delete_failure: None,
                gates: HashMap::new(),
            })),
            concurrency: Arc::new(AtomicUsize::new(0)),
            max_concurrency: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fail_build(&self, context_key: impl Into<String>, message: impl Into<String>) {
        self.inner.lock().build_failures.insert(context_key.into(), message.into());
    }

    pub fn fail_pull(&self, image: impl Into<String>, message: impl Into<String>) {
        self.inner.lock().pull_failures.insert(image.into(), message.into());
    }

    pub fn fail_create(&self, container: impl Into<String>, message: impl Into<String>) {
        self.inner.lock().create_failures.insert(container.into(), message.into());
    }

    pub fn fail_start(&self, container: impl Into<String>, message: impl Into<String>) {
        self.inner.lock().start_failures.insert(container.into(), message.into());
    }

    pub fn fail_health(&self, container: impl Into<String>, message: impl Into<String>) {
        self.inner.lock().health_failures.insert(container.into(), message.into());
    }

    pub fn set_exit_code(&self, container: impl Into<String>, code: i32) {
        self.inner.lock().exit_codes.insert(container.into(), code);
    }

    pub fn fail_network_create(&self, message: impl Into<String>) {
        self.inner.lock().network_create_failure = Some(message.into());
    }

    pub fn fail_network_delete(&self, message: impl Into<String>) {
        self.inner.lock().network_delete_failure = Some(message.into());
    }

    /// Register (or fetch) a named rendezvous point that `parties` workers
    /// must all reach before any of them proceeds. Call sites match the
    /// gate name against `"<step>:<target>"`; the name `"*"` matches every
    /// call, useful for forcing any `parties` concurrent driver calls to
    /// rendezvous regardless of which steps they are.
    pub fn gate(&self, name: impl Into<String>, parties: usize) -> Arc<Barrier> {
        let mut inner = self.inner.lock();
        inner.gates.entry(name.into()).or_insert_with(|| Arc::new(Barrier::new(parties))).clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    /// The `command` field of the `ContainerSpec` last passed to
    /// `create_container` for `container`, if that container was created.
    pub fn created_command(&self, container: &str) -> Option<Vec<String>> {
        self.inner.lock().created_commands.get(container).cloned().flatten()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency.load(Ordering::SeqCst)
    }

    fn record(&self, call: impl Into<String>) {
        self.inner.lock().calls.push(call.into());
    }

    async fn enter(&self, gate_key: &str) -> ConcurrencyGuard<'_> {
        let current = self.concurrency.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrency.fetch_max(current, Ordering::SeqCst);

        let barrier = {
            let inner = self.inner.lock();
            inner.gates.get(gate_key).or_else(|| inner.gates.get("*")).cloned()
        };
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        ConcurrencyGuard { counter: &self.concurrency }
    }
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

struct ConcurrencyGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for ConcurrencyGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContainerEngineDriver for FakeDriver {
    async fn build_image(&self, source: &BuildSource, progress: ProgressSink<'_>) -> Result<String, DriverError> {
        let key = match source {
            BuildSource::Build { context, .. } => context.to_string_lossy().to_string(),
            BuildSource::Pull { image } => image.clone(),
        };
        let _guard = self.enter(&format!("build_image:{key}")).await;
        self.record(format!("build_image:{key}"));
        progress(format!("building {key}"));
        match self.inner.lock().build_failures.get(&key).cloned() {
            Some(message) => Err(DriverError::Other(message)),
            None => Ok(format!("{key}:built")),
        }
    }

    async fn pull_image(&self, image: &str, progress: ProgressSink<'_>) -> Result<String, DriverError> {
        let _guard = self.enter(&format!("pull_image:{image}")).await;
        self.record(format!("pull_image:{image}"));
        progress(format!("pulling {image}"));
        match self.inner.lock().pull_failures.get(image).cloned() {
            Some(message) => Err(DriverError::Other(message)),
            None => Ok(image.to_string()),
        }
    }

    async fn create_network(&self, name: &str) -> Result<(), DriverError> {
        let _guard = self.enter(&format!("create_network:{name}")).await;
        self.record(format!("create_network:{name}"));
        match self.inner.lock().network_create_failure.clone() {
            Some(message) => Err(DriverError::Other(message)),
            None => Ok(()),
        }
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DriverError> {
        let _guard = self.enter(&format!("create_container:{}", spec.name)).await;
        self.record(format!("create_container:{}", spec.name));
        self.inner.lock().created_commands.insert(spec.name.clone(), spec.command.clone());
        match self.inner.lock().create_failures.get(&spec.name).cloned() {
            Some(message) => Err(DriverError::Other(message)),
            None => Ok(format!("{}-id", spec.name)),
        }
    }

    async fn start_container(&self, container_id: &str) -> Result<(), DriverError> {
        let _guard = self.enter(&format!("start_container:{container_id}")).await;
        self.record(format!("start_container:{container_id}"));
        match self.inner.lock().start_failures.get(container_id).cloned() {
            Some(message) => Err(DriverError::Other(message)),
            None => Ok(()),
        }
    }

    async fn wait_for_healthy(&self, container_id: &str, _health_check: &HealthCheckSpec) -> Result<(), DriverError> {
        let _guard = self.enter(&format!("wait_for_healthy:{container_id}")).await;
        self.record(format!("wait_for_healthy:{container_id}"));
        match self.inner.lock().health_failures.get(container_id).cloned() {
            Some(message) => Err(DriverError::NotHealthy { container: container_id.to_string(), reason: message }),
            None => Ok(()),
        }
    }

    async fn run_container(&self, container_id: &str, progress: ProgressSink<'_>) -> Result<i32, DriverError> {
        let _guard = self.enter(&format!("run_container:{container_id}")).await;
        self.record(format!("run_container:{container_id}"));
        progress(format!("running {container_id}"));
        Ok(self.inner.lock().exit_codes.get(container_id).copied().unwrap_or(0))
    }

    async fn stop_container(&self, container_id: &str) -> Result<(), DriverError> {
        let _guard = self.enter(&format!("stop_container:{container_id}")).await;
        self.record(format!("stop_container:{container_id}"));
        match self.inner.lock().stop_failures.get(container_id).cloned() {
            Some(message) => Err(DriverError::Other(message)),
            None => Ok(()),
        }
    }

    async fn remove_container(&self, container_id: &str) -> Result<(), DriverError> {
        let _guard = self.enter(&format!("remove_container:{container_id}")).await;
        self.record(format!("remove_container:{container_id}"));
        match self.inner.lock().remove_failures.get(container_id).cloned() {
            Some(message) => Err(DriverError::Other(message)),
            None => Ok(()),
        }
    }

    async fn delete_network(&self, name: &str) -> Result<(), DriverError> {
        let _guard = self.enter(&format!("delete_network:{name}")).await;
        self.record(format!("delete_network:{name}"));
        match self.inner.lock().network_delete_failure.clone() {
            Some(message) => Err(DriverError::Other(message)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
