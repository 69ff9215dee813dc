// src/exec/command.rs

use std::collections::BTreeSet;
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::model::TaskConfig;
use crate::errors::TaskError;
use crate::task::{EventName, JobContext, RaisedEvents, Task};

/// A task backed by a shell command.
///
/// Exit code 0 means the command succeeded and all of its declared
/// `produces` events are reported as raised; a non-zero exit is a task
/// failure. This is deliberately coarse: a command that wants to report
/// "nothing changed" should still exit 0 and simply be written so that its
/// downstream work tolerates re-runs (the idempotence contract applies to
/// commands like to any other task body).
pub struct CommandTask {
    name: String,
    cmd: String,
    produces: BTreeSet<EventName>,
    depends_on: BTreeSet<EventName>,
}

impl CommandTask {
    pub fn new(
        name: impl Into<String>,
        cmd: impl Into<String>,
        produces: BTreeSet<EventName>,
        depends_on: BTreeSet<EventName>,
    ) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            produces,
            depends_on,
        }
    }

    /// Build a task from a `[task.<name>]` config section.
    pub fn from_config(name: &str, cfg: &TaskConfig) -> Self {
        Self::new(
            name,
            &cfg.cmd,
            cfg.produces.iter().cloned().collect(),
            cfg.depends_on.iter().cloned().collect(),
        )
    }

    /// Build a shell command appropriate for the platform.
    fn shell_command(&self) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        }
    }
}

#[async_trait]
impl Task for CommandTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn produces(&self) -> BTreeSet<EventName> {
        self.produces.clone()
    }

    fn depends_on(&self) -> BTreeSet<EventName> {
        self.depends_on.clone()
    }

    async fn execute(&self, ctx: &JobContext) -> Result<RaisedEvents, TaskError> {
        info!(task = %self.name, cmd = %self.cmd, job = %ctx.job_id(), "starting task process");

        let mut cmd = self.shell_command();
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", self.name))
            .map_err(TaskError::from)?;

        // Consume both pipes so buffers don't fill; log at debug.
        if let Some(stdout) = child.stdout.take() {
            let task_name = self.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task_name, "stdout: {}", line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let task_name = self.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task_name, "stderr: {}", line);
                }
            });
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of task '{}'", self.name))
            .map_err(TaskError::from)?;

        let code = status.code().unwrap_or(-1);
        info!(
            task = %self.name,
            exit_code = code,
            success = status.success(),
            "task process exited"
        );

        if status.success() {
            Ok(self.produces.clone())
        } else {
            Err(TaskError::msg(format!(
                "command exited with code {code}"
            )))
        }
    }
}
