// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `eventdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "eventdag",
    version,
    about = "Run interdependent tasks incrementally, driven by raised events.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Eventdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Eventdag.toml")]
    pub config: String,

    /// Run this task and everything downstream of it.
    #[arg(long, value_name = "NAME", conflicts_with_all = ["all", "resume"])]
    pub task: Option<String>,

    /// Run every task defined in the config.
    #[arg(long, conflicts_with = "resume")]
    pub all: bool,

    /// Seed event(s) to raise before the run starts (repeatable).
    #[arg(long = "event", value_name = "NAME")]
    pub events: Vec<String>,

    /// Resume a previously interrupted or failed job by its id.
    #[arg(long, value_name = "JOB_ID")]
    pub resume: Option<String>,

    /// Job id for a fresh run.
    ///
    /// Defaults to the seed task name (or "all"); the id is also the key
    /// under which the job snapshot is persisted.
    #[arg(long, value_name = "ID")]
    pub job_id: Option<String>,

    /// Keep the job snapshot after a successful run instead of deleting it.
    #[arg(long)]
    pub keep_state: bool,

    /// Parse + validate, print tasks and dependency edges, but don't
    /// execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EVENTDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
