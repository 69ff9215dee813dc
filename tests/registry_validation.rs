mod common;

use std::collections::BTreeSet;
use std::error::Error;
use std::sync::Arc;

use eventdag::errors::RegistryError;
use eventdag::registry::{EventRegistry, RegistryConfig};

use common::{new_log, StubTask};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn duplicate_task_name_is_rejected() -> TestResult {
    let log = new_log();
    let mut registry = EventRegistry::new();

    registry.register(Arc::new(StubTask::new("dup", &log)))?;
    let err = registry
        .register(Arc::new(StubTask::new("dup", &log)))
        .unwrap_err();

    assert!(matches!(err, RegistryError::DuplicateTaskName(name) if name == "dup"));
    Ok(())
}

#[test]
fn event_indices_cover_producers_and_consumers() -> TestResult {
    let log = new_log();
    let mut registry = EventRegistry::new();
    registry.register(Arc::new(
        StubTask::new("extract", &log)
            .depends_on(&["repo_updated"])
            .produces(&["extracted"]),
    ))?;
    registry.register(Arc::new(
        StubTask::new("derive", &log).depends_on(&["extracted"]),
    ))?;

    let producers: Vec<_> = registry
        .tasks_producing("extracted")
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(producers, vec!["extract"]);

    let consumers: Vec<_> = registry
        .tasks_depending_on("extracted")
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(consumers, vec!["derive"]);

    assert!(registry.tasks_depending_on("repo_updated").len() == 1);
    assert!(registry.tasks_producing("repo_updated").is_empty());
    Ok(())
}

/// An event nobody produces is only a warning by default...
#[test]
fn unknown_event_is_tolerated_by_default() -> TestResult {
    let log = new_log();
    let mut registry = EventRegistry::new();
    registry.register(Arc::new(
        StubTask::new("orphan", &log).depends_on(&["never_produced"]),
    ))?;

    assert!(registry.validate().is_ok());
    Ok(())
}

/// ...but fatal in strict mode.
#[test]
fn unknown_event_is_fatal_in_strict_mode() -> TestResult {
    let log = new_log();
    let mut registry = EventRegistry::with_config(RegistryConfig {
        enabled_tasks: None,
        strict_events: true,
    });
    registry.register(Arc::new(
        StubTask::new("orphan", &log).depends_on(&["never_produced"]),
    ))?;

    let err = registry.validate().unwrap_err();
    assert!(matches!(
        err,
        RegistryError::UnknownEvent { task, event }
            if task == "orphan" && event == "never_produced"
    ));
    Ok(())
}

/// Strict mode does not flag events that some task does produce, and seed
/// events a driver plans to raise are declared by producing tasks anyway.
#[test]
fn strict_mode_accepts_produced_events() -> TestResult {
    let log = new_log();
    let mut registry = EventRegistry::with_config(RegistryConfig {
        enabled_tasks: None,
        strict_events: true,
    });
    registry.register(Arc::new(StubTask::new("src", &log).produces(&["ev"])))?;
    registry.register(Arc::new(StubTask::new("dst", &log).depends_on(&["ev"])))?;

    assert!(registry.validate().is_ok());
    Ok(())
}

/// Tasks outside the enabled set are skipped at registration time.
#[test]
fn enabled_set_filters_registration() -> TestResult {
    let log = new_log();
    let enabled: BTreeSet<String> = ["keep".to_string()].into_iter().collect();
    let mut registry = EventRegistry::with_config(RegistryConfig {
        enabled_tasks: Some(enabled),
        strict_events: false,
    });

    registry.register(Arc::new(StubTask::new("keep", &log)))?;
    registry.register(Arc::new(StubTask::new("drop", &log)))?;

    assert!(!registry.is_empty());
    assert_eq!(registry.len(), 1);
    assert!(registry.task("keep").is_some());
    assert!(registry.task("drop").is_none());
    Ok(())
}
