// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod registry;
pub mod state;
pub mod task;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::DepGraph;
use crate::engine::{Job, JobReport, JobStatus, Runner, RunnerOptions};
use crate::exec::CommandTask;
use crate::registry::{EventRegistry, RegistryConfig};
use crate::state::{FileStateStore, JobStateStore};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - event registry construction + validation
/// - file-backed job state store
/// - the runner loop
/// - Ctrl-C handling (cancellation between task executions)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    let registry = Arc::new(build_registry(&cfg)?);

    if args.dry_run {
        print_dry_run(&registry);
        return Ok(());
    }

    let store: Arc<dyn JobStateStore> = Arc::new(FileStateStore::new(&cfg.runner.state_dir));

    let options = RunnerOptions {
        parallel: cfg.runner.parallel,
        task_timeout: cfg.runner.task_timeout_secs.map(Duration::from_secs),
    };
    let runner = Runner::new(Arc::clone(&registry), Arc::clone(&store), options);

    // Ctrl-C → stop admitting new tasks; a task already running finishes
    // or fails on its own.
    {
        let cancel = runner.cancel_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
        });
    }

    let mut job = prepare_job(&args, &runner).await?;

    info!(job = %job.id, "starting run");
    let report = runner.run(&mut job).await?;
    print_report(&report);

    match (report.cancelled, report.status) {
        (true, _) => Err(anyhow!(
            "run cancelled; resume with --resume {}",
            report.job_id
        )),
        (false, JobStatus::Failed) => Err(anyhow!(
            "job '{}' finished with {} failed task(s); snapshot kept for --resume",
            report.job_id,
            report.failed.len()
        )),
        (false, _) => {
            if !args.keep_state {
                store.delete(&report.job_id).await?;
            }
            Ok(())
        }
    }
}

/// Build and validate the event registry from the config file.
///
/// Every `[task.<name>]` section becomes a registered [`CommandTask`];
/// library embedders would instead register their own `Task` impls here.
pub fn build_registry(cfg: &ConfigFile) -> Result<EventRegistry> {
    let registry_config = RegistryConfig {
        enabled_tasks: cfg
            .runner
            .enabled_tasks
            .as_ref()
            .map(|names| names.iter().cloned().collect::<BTreeSet<_>>()),
        strict_events: cfg.runner.strict_events,
    };

    let mut registry = EventRegistry::with_config(registry_config);
    for (name, task_cfg) in cfg.task.iter() {
        registry.register(Arc::new(CommandTask::from_config(name, task_cfg)))?;
    }
    registry.validate()?;

    Ok(registry)
}

/// Tasks with no dependency events.
///
/// "Run everything" seeds only these: each root raises its events, and the
/// scheduler admits downstream consumers once their inputs have actually
/// fired. Seeding a consumer directly would force it to run before its
/// producers.
pub fn root_tasks(registry: &EventRegistry) -> Vec<String> {
    registry
        .tasks()
        .filter(|task| task.depends_on().is_empty())
        .map(|task| task.name().to_string())
        .collect()
}

/// Decide what to run: resume a stored job, or start a fresh one from the
/// seeds given on the command line.
async fn prepare_job(args: &CliArgs, runner: &Runner) -> Result<Job> {
    if let Some(job_id) = &args.resume {
        return Ok(runner.resume_job(job_id).await?);
    }

    let seed_tasks: Vec<String> = if args.all {
        root_tasks(runner.registry())
    } else {
        args.task.iter().cloned().collect()
    };

    if seed_tasks.is_empty() && args.events.is_empty() {
        return Err(anyhow!(
            "nothing to run: pass --task <NAME>, --all, or at least one --event"
        ));
    }

    let job_id = args
        .job_id
        .clone()
        .or_else(|| args.task.clone())
        .unwrap_or_else(|| "all".to_string());

    Ok(runner.start_job(job_id, args.events.clone(), seed_tasks)?)
}

/// Per-task success/failure report for the driver's output.
fn print_report(report: &JobReport) {
    println!("job '{}': {:?}", report.job_id, report.status);

    for task in &report.completed {
        println!("  ok      {task}");
    }
    for (task, message) in &report.failed {
        println!("  failed  {task}: {message}");
    }
    for task in &report.skipped {
        println!("  skipped {task}");
    }
}

/// Simple dry-run output: print tasks, their events and the derived edges.
fn print_dry_run(registry: &EventRegistry) {
    let graph = DepGraph::from_registry(registry);

    println!("eventdag dry-run");
    println!("tasks ({}):", registry.len());
    for task in registry.tasks() {
        println!("  - {}", task.name());
        let depends_on = task.depends_on();
        if !depends_on.is_empty() {
            println!("      depends_on: {depends_on:?}");
        }
        let produces = task.produces();
        if !produces.is_empty() {
            println!("      produces: {produces:?}");
        }
    }

    println!();
    println!("edges (producer -> consumer):");
    for name in graph.tasks() {
        for dependent in graph.dependents_of(name) {
            println!("  {name} -> {dependent}");
        }
    }
}
