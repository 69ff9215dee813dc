// src/config/validate.rs

use anyhow::{anyhow, Result};

use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one task
/// - commands are non-empty
/// - no task declares the same event in both `produces` and `depends_on`
///   (it would trigger itself)
/// - `task_timeout_secs`, when present, is at least 1
/// - every name in `enabled_tasks` refers to a task in the file
///
/// It does **not** check event-level consistency across tasks; that is the
/// registry's job after registration (`EventRegistry::validate`), where
/// strictness is configurable.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_runner_section(cfg)?;
    validate_task_declarations(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(anyhow!(
            "config must contain at least one [task.<name>] section"
        ));
    }
    Ok(())
}

fn validate_runner_section(cfg: &ConfigFile) -> Result<()> {
    if let Some(secs) = cfg.runner.task_timeout_secs {
        if secs == 0 {
            return Err(anyhow!("[runner].task_timeout_secs must be >= 1 (got 0)"));
        }
    }

    if let Some(enabled) = &cfg.runner.enabled_tasks {
        for name in enabled {
            if !cfg.task.contains_key(name) {
                return Err(anyhow!(
                    "[runner].enabled_tasks names unknown task '{}'",
                    name
                ));
            }
        }
    }

    Ok(())
}

fn validate_task_declarations(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(anyhow!("task '{}' has an empty `cmd`", name));
        }

        for event in task.produces.iter() {
            if task.depends_on.contains(event) {
                return Err(anyhow!(
                    "task '{}' both produces and depends on event '{}'",
                    name,
                    event
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{RunnerSection, TaskConfig};
    use std::collections::BTreeMap;

    fn config_with(tasks: Vec<(&str, TaskConfig)>) -> ConfigFile {
        ConfigFile {
            runner: RunnerSection::default(),
            task: tasks
                .into_iter()
                .map(|(n, t)| (n.to_string(), t))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn task(cmd: &str, produces: &[&str], depends_on: &[&str]) -> TaskConfig {
        TaskConfig {
            cmd: cmd.into(),
            produces: produces.iter().map(|s| s.to_string()).collect(),
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn empty_config_is_rejected() {
        let cfg = config_with(vec![]);
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn self_triggering_task_is_rejected() {
        let cfg = config_with(vec![("a", task("echo a", &["x"], &["x"]))]);
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn unknown_enabled_task_is_rejected() {
        let mut cfg = config_with(vec![("a", task("echo a", &[], &[]))]);
        cfg.runner.enabled_tasks = Some(vec!["nope".into()]);
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn valid_pipeline_passes() {
        let cfg = config_with(vec![
            ("extract", task("echo x", &["extracted"], &["repo_updated"])),
            ("derive", task("echo y", &[], &["extracted"])),
        ]);
        assert!(validate_config(&cfg).is_ok());
    }
}
