// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use super::*;

fn noop(_line: String) {}

#[tokio::test]
async fn pull_image_succeeds_and_is_recorded() {
    let driver = FakeDriver::new();
    let resolved = driver.pull_image("nginx:latest", &mut noop).await.expect("pull");
    assert_eq!(resolved, "nginx:latest");
    assert_eq!(driver.calls(), vec!["pull_image:nginx:latest".to_string()]);
}

#[tokio::test]
async fn configured_failure_surfaces_as_driver_error() {
    let driver = FakeDriver::new();
    driver.fail_start("web", "container refused to start");
    let err = driver.start_container("web").await.unwrap_err();
    assert_eq!(err.to_string(), "container refused to start");
}

#[tokio::test]
async fn exit_code_defaults_to_zero_unless_configured() {
    let driver = FakeDriver::new();
    let code = driver.run_container("app-id", &mut noop).await.expect("run");
    assert_eq!(code, 0);

    driver.set_exit_code("app-id", 17);
    let code = driver.run_container("app-id", &mut noop).await.expect("run");
    assert_eq!(code, 17);
}

#[tokio::test]
async fn two_workers_can_be_forced_to_run_concurrently_via_a_gate() {
    let driver = FakeDriver::new();
    let gate = driver.gate("*", 2);
    assert!(Arc::ptr_eq(&gate, &driver.gate("*", 2)));

    let d1 = driver.clone();
    let d2 = driver.clone();
    let t1 = tokio::spawn(async move { d1.pull_image("a", &mut noop).await });
    let t2 = tokio::spawn(async move { d2.pull_image("b", &mut noop).await });

    tokio::time::timeout(Duration::from_millis(200), async {
        t1.await.expect("join").expect("pull a");
        t2.await.expect("join").expect("pull b");
    })
    .await
    .expect("both pulls completed without deadlocking on each other's gate");

    assert_eq!(driver.max_concurrency(), 2);
}

#[tokio::test]
async fn build_context_identifies_failures_by_path() {
    let driver = FakeDriver::new();
    driver.fail_build("/ctx/a", "Dockerfile missing");
    let source = BuildSource::Build { context: PathBuf::from("/ctx/a"), dockerfile: None };
    let err = driver.build_image(&source, &mut noop).await.unwrap_err();
    assert_eq!(err.to_string(), "Dockerfile missing");
}
