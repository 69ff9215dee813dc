#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;

use eventdag::build_registry;
use eventdag::config::loader::load_and_validate;
use eventdag::engine::{JobStatus, Runner, RunnerOptions};
use eventdag::state::{JobStateStore, MemoryStateStore};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("Eventdag.toml");
    std::fs::write(&path, body).unwrap();
    path
}

/// End-to-end over real processes: a two-stage shell pipeline where the
/// second command only runs once the first raised its event.
#[tokio::test]
async fn command_pipeline_runs_in_dependency_order() -> TestResult {
    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("b_ran");

    let config_body = format!(
        r#"
[task.a]
cmd = "true"
produces = ["a_done"]

[task.b]
cmd = "touch {marker}"
depends_on = ["a_done"]
"#,
        marker = marker.display()
    );
    let config_path = write_config(dir.path(), &config_body);

    let cfg = load_and_validate(&config_path)?;
    let registry = Arc::new(build_registry(&cfg)?);

    let store = Arc::new(MemoryStateStore::new());
    let runner = Runner::new(
        registry,
        Arc::clone(&store) as Arc<dyn JobStateStore>,
        RunnerOptions::default(),
    );

    let mut job = runner.start_job("a", vec![], vec!["a".to_string()])?;
    let report = runner.run(&mut job).await?;

    assert_eq!(report.status, JobStatus::Completed);
    assert!(report.completed.contains("a"));
    assert!(report.completed.contains("b"));
    assert!(marker.exists());
    Ok(())
}

/// A command with a non-zero exit code fails its task and the exit code is
/// visible in the recorded message.
#[tokio::test]
async fn failing_command_records_exit_code() -> TestResult {
    let dir = tempfile::tempdir()?;
    let config_body = r#"
[task.broken]
cmd = "exit 3"
produces = ["never"]

[task.downstream]
cmd = "true"
depends_on = ["never"]
"#;
    let config_path = write_config(dir.path(), config_body);

    let cfg = load_and_validate(&config_path)?;
    let registry = Arc::new(build_registry(&cfg)?);

    let store = Arc::new(MemoryStateStore::new());
    let runner = Runner::new(
        registry,
        Arc::clone(&store) as Arc<dyn JobStateStore>,
        RunnerOptions::default(),
    );

    let mut job = runner.start_job("broken", vec![], vec!["broken".to_string()])?;
    let report = runner.run(&mut job).await?;

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report.failed.get("broken").unwrap().contains("code 3"));
    assert!(report.skipped.contains("downstream"));
    Ok(())
}

/// `enabled_tasks` in the config limits what gets registered.
#[tokio::test]
async fn enabled_tasks_limits_registration() -> TestResult {
    let dir = tempfile::tempdir()?;
    let config_body = r#"
[runner]
enabled_tasks = ["only"]

[task.only]
cmd = "true"

[task.ignored]
cmd = "true"
"#;
    let config_path = write_config(dir.path(), config_body);

    let cfg = load_and_validate(&config_path)?;
    let registry = build_registry(&cfg)?;

    assert_eq!(registry.len(), 1);
    assert!(registry.task("only").is_some());
    Ok(())
}
