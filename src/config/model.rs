// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [runner]
/// state_dir = ".eventdag/jobs"
/// strict_events = true
/// task_timeout_secs = 120
///
/// [task.extract]
/// cmd = "scripts/extract.sh"
/// depends_on = ["repo_updated"]
/// produces = ["extracted"]
/// ```
///
/// All sections except `[task.*]` are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Global runner behaviour from `[runner]`.
    #[serde(default)]
    pub runner: RunnerSection,

    /// All tasks from `[task.<name>]`.
    ///
    /// Keys are the *task names*; `BTreeMap` keeps declaration handling and
    /// registration order deterministic.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Directory for persisted job snapshots.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Fail startup when a task depends on an event nothing produces,
    /// instead of just warning.
    #[serde(default)]
    pub strict_events: bool,

    /// Per-task execution timeout in seconds. `None` means unbounded.
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,

    /// Execute ready batches concurrently.
    #[serde(default)]
    pub parallel: bool,

    /// If present, only the named tasks are registered; everything else in
    /// the file is ignored. Replaces ambient settings-driven enablement.
    #[serde(default)]
    pub enabled_tasks: Option<Vec<String>>,
}

fn default_state_dir() -> String {
    crate::state::file::DEFAULT_STATE_DIR.to_string()
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            strict_events: false,
            task_timeout_secs: None,
            parallel: false,
            enabled_tasks: None,
        }
    }
}

/// `[task.<name>]` section: a command-backed task declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The command to execute (run through the platform shell).
    pub cmd: String,

    /// Events this task may raise. On exit code 0 the command is taken to
    /// have raised all of them.
    #[serde(default)]
    pub produces: Vec<String>,

    /// Events that must all be raised before this task becomes ready.
    #[serde(default)]
    pub depends_on: Vec<String>,
}
