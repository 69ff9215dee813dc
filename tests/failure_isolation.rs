mod common;

use std::error::Error;

use eventdag::engine::JobStatus;
use eventdag::state::JobStateStore;

use common::{log_entries, new_log, registry_of, runner_of, StubTask};

type TestResult = Result<(), Box<dyn Error>>;

/// Seed event `repo_updated`; X fails during execute. The job is failed,
/// nothing is completed, and Y (depending on X's event) never runs.
#[tokio::test]
async fn failing_task_fails_job_and_skips_dependents() -> TestResult {
    let log = new_log();
    let registry = registry_of(vec![
        StubTask::new("x", &log)
            .depends_on(&["repo_updated"])
            .produces(&["extracted"])
            .fails(),
        StubTask::new("y", &log).depends_on(&["extracted"]),
    ]);
    let (runner, _store) = runner_of(registry);

    let mut job = runner.start_job("job", vec!["repo_updated".to_string()], vec![])?;
    let report = runner.run(&mut job).await?;

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report.completed.is_empty());
    assert!(report.failed.contains_key("x"));
    assert!(report.skipped.contains("y"));
    assert_eq!(log_entries(&log), vec!["x"]);
    Ok(())
}

/// Partial failure: B fails, so B's dependent never becomes ready, but the
/// independent branch (C) still completes and its result is persisted.
#[tokio::test]
async fn independent_branch_survives_sibling_failure() -> TestResult {
    let log = new_log();
    let registry = registry_of(vec![
        StubTask::new("b", &log).depends_on(&["go"]).produces(&["b_done"]).fails(),
        StubTask::new("b_child", &log).depends_on(&["b_done"]),
        StubTask::new("c", &log).depends_on(&["go"]).produces(&["c_done"]),
        StubTask::new("c_child", &log).depends_on(&["c_done"]),
    ]);
    let (runner, store) = runner_of(registry);

    let mut job = runner.start_job("job", vec!["go".to_string()], vec![])?;
    let report = runner.run(&mut job).await?;

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report.completed.contains("c"));
    assert!(report.completed.contains("c_child"));
    assert!(report.skipped.contains("b_child"));

    let entries = log_entries(&log);
    assert!(!entries.contains(&"b_child".to_string()));

    // The failure is durable: the snapshot records completed work and the
    // failed task.
    assert!(!store.is_empty());
    let stored = store.load("job").await?;
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.completed_tasks.contains("c_child"));
    assert!(stored.failed_tasks.contains_key("b"));
    Ok(())
}

/// A failed task raises none of its declared events, even the ones it would
/// have produced: `raised_events` must not contain them.
#[tokio::test]
async fn failed_task_raises_nothing() -> TestResult {
    let log = new_log();
    let registry = registry_of(vec![StubTask::new("x", &log)
        .depends_on(&["go"])
        .produces(&["done"])
        .fails()]);
    let (runner, _store) = runner_of(registry);

    let mut job = runner.start_job("job", vec!["go".to_string()], vec![])?;
    runner.run(&mut job).await?;

    assert!(job.raised_events.contains("go"));
    assert!(!job.raised_events.contains("done"));
    Ok(())
}
