use std::io::Write;

use taskforge_core::{CoreError, ImageSource};

use super::*;

fn write_task_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn loads_a_minimal_single_container_task() {
    let file = write_task_file(
        r#"
        name = "build"

        [[containers]]
        name = "app"
        image = "app:latest"
        main = true
        "#,
    );

    let task = load_task(file.path()).expect("load task");
    assert_eq!(task.name, "build");
    assert_eq!(task.containers.len(), 1);
    let app = task.container("app").expect("app container");
    assert!(app.is_main);
    assert_eq!(app.image_source, ImageSource::Pull { image: "app:latest".into() });
}

#[test]
fn resolves_dependencies_environment_and_health_check() {
    let file = write_task_file(
        r#"
        name = "stack"

        [[containers]]
        name = "db"
        image = "postgres:16"

        [containers.health_check]
        interval_ms = 500
        retries = 5
        start_period_ms = 1000

        [[containers]]
        name = "app"
        build = "."
        main = true
        depends_on = ["db"]

        [containers.environment]
        DATABASE_URL = "postgres://db"
        HOME = { from_host = "HOME" }
        "#,
    );

    let task = load_task(file.path()).expect("load task");
    let app = task.container("app").expect("app container");
    assert_eq!(app.depends_on, vec!["db".to_string()]);
    assert!(app.environment.iter().any(|(k, v)| k == "DATABASE_URL" && *v == EnvValue::Literal("postgres://db".into())));
    assert!(app.environment.iter().any(|(k, v)| k == "HOME" && *v == EnvValue::FromHost("HOME".into())));

    let db = task.container("db").expect("db container");
    assert_eq!(db.health_check.expect("health check").retries, 5);
}

#[test]
fn rejects_out_of_range_ports() {
    let file = write_task_file(
        r#"
        name = "bad-ports"

        [[containers]]
        name = "app"
        image = "app:latest"
        main = true

        [[containers.ports]]
        local = 0
        container = 80
        "#,
    );

    let err = load_task(file.path()).expect_err("should reject port 0");
    assert!(matches!(err, ConfigError::PortOutOfRange { .. }));
}

#[test]
fn propagates_cycle_detection_from_the_core() {
    let file = write_task_file(
        r#"
        name = "cycle"

        [[containers]]
        name = "a"
        image = "a:latest"
        main = true
        depends_on = ["b"]

        [[containers]]
        name = "b"
        image = "b:latest"
        depends_on = ["a"]
        "#,
    );

    let err = load_task(file.path()).expect_err("should reject cycle");
    assert!(matches!(err, ConfigError::Core(CoreError::DependencyCycle(_))));
}

#[test]
fn missing_file_surfaces_a_read_error() {
    let err = load_task(Path::new("/nonexistent/task.toml")).expect_err("should fail to read");
    assert!(matches!(err, ConfigError::Read { .. }));
}
