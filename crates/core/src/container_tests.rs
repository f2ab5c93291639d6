// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_container_has_no_dependencies_and_is_not_main() {
    let node = ContainerNode::new("web", ImageSource::Pull { image: "nginx:latest".into() });
    assert!(node.depends_on.is_empty());
    assert!(!node.is_main);
    assert!(node.health_check.is_none());
}

#[test]
fn setters_build_up_a_full_node() {
    let node = ContainerNode::new(
        "app",
        ImageSource::Build { context: PathBuf::from("."), dockerfile: None },
    )
    .depends_on(vec!["db".to_string()])
    .is_main(true)
    .ports(vec![PortMapping { local: 8080, container: 80 }])
    .health_check(Some(HealthCheckConfig {
        interval: Duration::from_secs(1),
        retries: 3,
        start_period: Duration::from_secs(5),
    }));

    assert_eq!(node.depends_on, vec!["db".to_string()]);
    assert!(node.is_main);
    assert_eq!(node.ports[0].container, 80);
    assert_eq!(node.health_check.unwrap().retries, 3);
}

#[test]
fn health_check_duration_round_trips_through_json_as_milliseconds() {
    let hc = HealthCheckConfig {
        interval: Duration::from_millis(1500),
        retries: 2,
        start_period: Duration::from_millis(250),
    };
    let json = serde_json::to_value(hc).expect("serialize");
    assert_eq!(json["interval"], 1500);
    assert_eq!(json["start_period"], 250);

    let back: HealthCheckConfig = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, hc);
}

#[test]
fn working_dir_and_run_as_current_user_default_unset() {
    let node = ContainerNode::new("web", ImageSource::Pull { image: "nginx:latest".into() });
    assert!(node.working_dir.is_none());
    assert!(!node.run_as_current_user);

    let node = node.working_dir(Some(PathBuf::from("/srv/app"))).run_as_current_user(true);
    assert_eq!(node.working_dir, Some(PathBuf::from("/srv/app")));
    assert!(node.run_as_current_user);
}

#[test]
fn mount_mode_defaults_to_read_write() {
    let json = serde_json::json!({
        "host_path": "/tmp/a",
        "container_path": "/tmp/b"
    });
    let mount: VolumeMount = serde_json::from_value(json).expect("deserialize");
    assert_eq!(mount.mode, MountMode::ReadWrite);
}
