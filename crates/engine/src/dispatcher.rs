// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C6: the step runner. Maps each [`Step`] variant to exactly one
//! [`ContainerEngineDriver`] call, translating a [`ContainerNode`] into the
//! driver's plain [`taskforge_driver::spec`] shapes at the point of
//! dispatch, and posts `Started` → `Progress*` → exactly one terminal
//! event through the sink it is given.
//!
//! Grounded in the teacher's `Engine::run_step`-style dispatch table
//! (`engine/src/executor.rs`), generalized from a fixed phase order into
//! one entry per [`Step`] variant with an exhaustive match.

use std::collections::HashMap;
use std::sync::Arc;

use taskforge_core::{ContainerNode, EnvValue, ImageSource, Step, Task, TaskEvent};
use taskforge_driver::{BuildSource, ContainerEngineDriver, ContainerSpec, HealthCheckSpec, MountMode, VolumeMount};
use tokio::sync::mpsc;

use crate::sink::EventSink;
use crate::ui::UiEventLogger;

/// Container IDs the driver handed back at create time, keyed by container
/// name. Shared across workers so `StartContainer`, `WaitForHealthy`,
/// `RunContainer`, `StopContainer`, and `RemoveContainer` can all resolve
/// the same container by name without re-querying the driver.
pub type ContainerIds = Arc<parking_lot::Mutex<HashMap<String, String>>>;

/// Dispatches one step at a time against a driver, a task graph, and a
/// shared ID table. Stateless beyond those three references — one
/// dispatcher instance is shared by every worker in the pool.
pub struct StepRunner<D: ContainerEngineDriver> {
    task: Task,
    driver: Arc<D>,
    network_name: String,
    /// Appended to the main container's command at `CreateContainer` time
    /// (spec.md §6 `additionalCommandArgs`).
    additional_command_args: Vec<String>,
    container_ids: ContainerIds,
    /// Image reference `build_image` resolved to, keyed by container name.
    /// Populated on `ImageBuilt`, consumed by `create_container` — the
    /// driver hands back an engine-chosen tag that the dispatcher has no
    /// other way to recover.
    image_tags: ContainerIds,
}

impl<D: ContainerEngineDriver> StepRunner<D> {
    pub fn new(
        task: Task,
        driver: Arc<D>,
        network_name: impl Into<String>,
        additional_command_args: Vec<String>,
    ) -> Self {
        Self {
            task,
            driver,
            network_name: network_name.into(),
            additional_command_args,
            container_ids: Default::default(),
            image_tags: Default::default(),
        }
    }

    /// Runs `step` to completion, posting every event it produces through
    /// `sink`. Never returns an `Err` — driver failures are themselves
    /// posted as `…Failed` events (spec.md §7 category 1); only a logic
    /// error in the dispatcher itself (an unresolvable container name)
    /// surfaces as `ExecutionFailedEvent`.
    pub async fn run<U: UiEventLogger>(&self, step: Step, sink: &EventSink<U>) {
        sink.starting(&step).await;
        match step {
            Step::BuildImage { container } => self.build_image(&container, sink).await,
            Step::PullImage { container } => self.pull_image(&container, sink).await,
            Step::CreateNetwork => self.create_network(sink).await,
            Step::CreateContainer { container } => self.create_container(&container, sink).await,
            Step::StartContainer { container } => self.start_container(&container, sink).await,
            Step::WaitForHealthy { container } => self.wait_for_healthy(&container, sink).await,
            Step::RunContainer { container } => self.run_container(&container, sink).await,
            Step::StopContainer { container } => self.stop_container(&container, sink).await,
            Step::RemoveContainer { container } => self.remove_container(&container, sink).await,
            Step::DeleteNetwork => self.delete_network(sink).await,
        }
    }

    fn node(&self, name: &str) -> Option<&ContainerNode> {
        self.task.container(name)
    }

    fn container_id(&self, name: &str) -> Option<String> {
        self.container_ids.lock().get(name).cloned()
    }

    async fn build_image<U: UiEventLogger>(&self, container: &str, sink: &EventSink<U>) {
        let Some(node) = self.node(container) else {
            sink.post(execution_failed(format!("unknown container {container:?} in BuildImage"))).await;
            return;
        };
        let ImageSource::Build { context, dockerfile } = &node.image_source else {
            sink.post(execution_failed(format!("{container} has no build source"))).await;
            return;
        };

        sink.post(TaskEvent::ImageBuildStarted { container: container.to_string() }).await;
        let source = BuildSource::Build { context: context.clone(), dockerfile: dockerfile.clone() };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut on_line = move |line: String| {
            let _ = tx.send(line);
        };
        let build = self.driver.build_image(&source, &mut on_line);
        tokio::pin!(build);
        let result = loop {
            tokio::select! {
                Some(line) = rx.recv() => {
                    sink.post(TaskEvent::ImageBuildProgress { container: container.to_string(), message: line }).await;
                }
                result = &mut build => break result,
            }
        };
        drain_progress(&mut rx, sink, |message| TaskEvent::ImageBuildProgress {
            container: container.to_string(),
            message,
        })
        .await;
        match result {
            Ok(tag) => {
                self.image_tags.lock().insert(container.to_string(), tag);
                sink.post(TaskEvent::ImageBuilt { container: container.to_string() }).await;
            }
            Err(e) => {
                sink.post(TaskEvent::ImageBuildFailed { container: container.to_string(), message: e.to_string() })
                    .await
            }
        }
    }

    async fn pull_image<U: UiEventLogger>(&self, container: &str, sink: &EventSink<U>) {
        let Some(node) = self.node(container) else {
            sink.post(execution_failed(format!("unknown container {container:?} in PullImage"))).await;
            return;
        };
        let ImageSource::Pull { image } = &node.image_source else {
            sink.post(execution_failed(format!("{container} has no pull source"))).await;
            return;
        };

        sink.post(TaskEvent::ImagePullStarted { container: container.to_string() }).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut on_line = move |line: String| {
            let _ = tx.send(line);
        };
        let pull = self.driver.pull_image(image, &mut on_line);
        tokio::pin!(pull);
        let result = loop {
            tokio::select! {
                Some(line) = rx.recv() => {
                    sink.post(TaskEvent::ImagePullProgress { container: container.to_string(), message: line }).await;
                }
                result = &mut pull => break result,
            }
        };
        drain_progress(&mut rx, sink, |message| TaskEvent::ImagePullProgress {
            container: container.to_string(),
            message,
        })
        .await;
        match result {
            Ok(_) => sink.post(TaskEvent::ImagePulled { container: container.to_string() }).await,
            Err(e) => {
                sink.post(TaskEvent::ImagePullFailed { container: container.to_string(), message: e.to_string() })
                    .await
            }
        }
    }

    async fn create_network<U: UiEventLogger>(&self, sink: &EventSink<U>) {
        match self.driver.create_network(&self.network_name).await {
            Ok(()) => sink.post(TaskEvent::NetworkCreated).await,
            Err(e) => sink.post(TaskEvent::NetworkCreationFailed { message: e.to_string() }).await,
        }
    }

    async fn create_container<U: UiEventLogger>(&self, container: &str, sink: &EventSink<U>) {
        let Some(node) = self.node(container) else {
            sink.post(execution_failed(format!("unknown container {container:?} in CreateContainer"))).await;
            return;
        };
        let spec = self.container_spec(node);
        match self.driver.create_container(&spec).await {
            Ok(id) => {
                self.container_ids.lock().insert(container.to_string(), id);
                sink.post(TaskEvent::ContainerCreated { container: container.to_string() }).await;
            }
            Err(e) => {
                sink.post(TaskEvent::ContainerCreationFailed {
                    container: container.to_string(),
                    message: e.to_string(),
                })
                .await
            }
        }
    }

    async fn start_container<U: UiEventLogger>(&self, container: &str, sink: &EventSink<U>) {
        let Some(id) = self.container_id(container) else {
            sink.post(execution_failed(format!("{container} has no known container id"))).await;
            return;
        };
        match self.driver.start_container(&id).await {
            Ok(()) => sink.post(TaskEvent::ContainerStarted { container: container.to_string() }).await,
            Err(e) => {
                sink.post(TaskEvent::ContainerStartFailed { container: container.to_string(), message: e.to_string() })
                    .await
            }
        }
    }

    async fn wait_for_healthy<U: UiEventLogger>(&self, container: &str, sink: &EventSink<U>) {
        let (Some(id), Some(node)) = (self.container_id(container), self.node(container)) else {
            sink.post(execution_failed(format!("{container} has no known container id"))).await;
            return;
        };
        let Some(health_check) = &node.health_check else {
            // The state machine already emits a synthetic healthy event for
            // health-check-less containers; this step should never be
            // dispatched for one, but fail loudly rather than silently if it is.
            sink.post(execution_failed(format!("{container} has no health check configured"))).await;
            return;
        };
        let spec = HealthCheckSpec {
            interval: health_check.interval,
            retries: health_check.retries,
            start_period: health_check.start_period,
        };
        match self.driver.wait_for_healthy(&id, &spec).await {
            Ok(()) => sink.post(TaskEvent::ContainerBecameHealthy { container: container.to_string() }).await,
            Err(e) => {
                sink.post(TaskEvent::ContainerHealthCheckFailed {
                    container: container.to_string(),
                    message: e.to_string(),
                })
                .await
            }
        }
    }

    async fn run_container<U: UiEventLogger>(&self, container: &str, sink: &EventSink<U>) {
        let Some(id) = self.container_id(container) else {
            sink.post(execution_failed(format!("{container} has no known container id"))).await;
            return;
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut on_line = move |line: String| {
            let _ = tx.send(line);
        };
        let run = self.driver.run_container(&id, &mut on_line);
        tokio::pin!(run);
        let result = loop {
            tokio::select! {
                Some(line) = rx.recv() => {
                    sink.post(TaskEvent::ContainerRunProgress { container: container.to_string(), message: line }).await;
                }
                result = &mut run => break result,
            }
        };
        drain_progress(&mut rx, sink, |message| TaskEvent::ContainerRunProgress {
            container: container.to_string(),
            message,
        })
        .await;
        match result {
            Ok(exit_code) => sink.post(TaskEvent::ContainerExited { container: container.to_string(), exit_code }).await,
            Err(e) => sink.post(execution_failed(format!("{container}: {e}"))).await,
        }
    }

    async fn stop_container<U: UiEventLogger>(&self, container: &str, sink: &EventSink<U>) {
        let Some(id) = self.container_id(container) else {
            sink.post(execution_failed(format!("{container} has no known container id"))).await;
            return;
        };
        match self.driver.stop_container(&id).await {
            Ok(()) => sink.post(TaskEvent::ContainerStopped { container: container.to_string() }).await,
            Err(e) => {
                sink.post(TaskEvent::ContainerStopFailed { container: container.to_string(), message: e.to_string() })
                    .await
            }
        }
    }

    async fn remove_container<U: UiEventLogger>(&self, container: &str, sink: &EventSink<U>) {
        let Some(id) = self.container_id(container) else {
            sink.post(execution_failed(format!("{container} has no known container id"))).await;
            return;
        };
        match self.driver.remove_container(&id).await {
            Ok(()) => sink.post(TaskEvent::ContainerRemoved { container: container.to_string() }).await,
            Err(e) => {
                sink.post(TaskEvent::ContainerRemovalFailed {
                    container: container.to_string(),
                    message: e.to_string(),
                })
                .await
            }
        }
    }

    async fn delete_network<U: UiEventLogger>(&self, sink: &EventSink<U>) {
        match self.driver.delete_network(&self.network_name).await {
            Ok(()) => sink.post(TaskEvent::NetworkDeleted).await,
            Err(e) => sink.post(TaskEvent::NetworkDeletionFailed { message: e.to_string() }).await,
        }
    }

    fn container_spec(&self, node: &ContainerNode) -> ContainerSpec {
        let environment = node
            .environment
            .iter()
            .map(|(key, value)| {
                let resolved = match value {
                    EnvValue::Literal(v) => v.clone(),
                    EnvValue::FromHost(var) => std::env::var(var).unwrap_or_default(),
                };
                (key.clone(), resolved)
            })
            .collect();

        let image = match &node.image_source {
            ImageSource::Pull { image } => image.clone(),
            ImageSource::Build { .. } => self
                .image_tags
                .lock()
                .get(&node.name)
                .cloned()
                .unwrap_or_else(|| format!("taskforge/{}", node.name)),
        };

        let command = if node.is_main && !self.additional_command_args.is_empty() {
            let mut command = node.command.clone().unwrap_or_default();
            command.extend(self.additional_command_args.iter().cloned());
            Some(command)
        } else {
            node.command.clone()
        };

        ContainerSpec {
            name: node.name.clone(),
            image,
            network: self.network_name.clone(),
            command,
            environment,
            working_dir: node.working_dir.clone(),
            volumes: node.volume_mounts.iter().map(volume_from_node).collect(),
            ports: node
                .ports
                .iter()
                .map(|p| taskforge_driver::PortMapping { local: p.local, container: p.container })
                .collect(),
            run_as_current_user: node.run_as_current_user,
        }
    }
}

fn execution_failed(message: String) -> TaskEvent {
    TaskEvent::ExecutionFailed { message }
}

/// Forwards any progress lines still sitting in the channel after the
/// driver future has resolved. `select!` only polls `rx` between loop
/// iterations, so a line sent in the same wakeup as the final result can
/// be left behind; this picks it up before the terminal event is posted.
async fn drain_progress<U: UiEventLogger>(
    rx: &mut mpsc::UnboundedReceiver<String>,
    sink: &EventSink<U>,
    make_event: impl Fn(String) -> TaskEvent,
) {
    while let Ok(line) = rx.try_recv() {
        sink.post(make_event(line)).await;
    }
}

fn volume_from_node(mount: &taskforge_core::VolumeMount) -> VolumeMount {
    VolumeMount {
        host_path: mount.host_path.clone(),
        container_path: mount.container_path.clone(),
        mode: match mount.mode {
            taskforge_core::MountMode::ReadWrite => MountMode::ReadWrite,
            taskforge_core::MountMode::ReadOnly => MountMode::ReadOnly,
        },
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
