//! Shell execution of resolved scripts
//!
//! Each script runs as `<shell> -c <script>` with its working directory
//! passed directly to the spawn call; the parent process never changes
//! its own directory, so scripts with differing `dir` values can run
//! concurrently. A non-zero exit is an outcome, not an error: stdout,
//! stderr, and the exit code are captured and reported.

use std::collections::HashMap;
use std::path::PathBuf;

use futures::future::join_all;
use log::{debug, info};
use thiserror::Error;
use tokio::process::Command;

use crate::commands::definition::{Script, Scripts};
use crate::registrar::OptionValue;
use crate::template;

/// Explicit executor configuration, passed in rather than read from
/// globals
#[derive(Debug, Clone)]
pub struct ExecConfig {
    pub shell: String,
    pub verbose: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        ExecConfig {
            shell: "bash".to_string(),
            verbose: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn `{shell} -c {script}`: {source}")]
    Spawn {
        shell: String,
        script: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one script run
#[derive(Debug)]
pub struct ScriptOutcome {
    /// The script after option templating
    pub script: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// The error-stream message for a failed run
    #[must_use]
    pub fn failure_summary(&self) -> String {
        match self.exit_code {
            Some(code) => format!("Exit code: {code}"),
            None => "Exit code: unknown (terminated by signal)".to_string(),
        }
    }
}

/// Expand a leading `~` to the user's home directory
#[must_use]
pub fn expand_tilde(dir: &str) -> PathBuf {
    if let Some(rest) = dir.strip_prefix('~')
        && let Some(home) = dirs::home_dir()
    {
        if rest.is_empty() {
            return home;
        }
        return home.join(rest.trim_start_matches('/'));
    }
    PathBuf::from(dir)
}

/// Run one script through the shell, capturing its output.
///
/// # Errors
///
/// Returns `ExecError::Spawn` if the subprocess cannot be started; a
/// non-zero exit is a normal [`ScriptOutcome`].
pub async fn run_script(
    script: &Script,
    values: &HashMap<String, OptionValue>,
    config: &ExecConfig,
) -> Result<ScriptOutcome, ExecError> {
    let filled = template::fill(&script.cmd, values);
    if config.verbose {
        info!("running `{filled}` (dir: {:?})", script.dir);
    } else {
        debug!("running `{filled}`");
    }

    let mut command = Command::new(&config.shell);
    command.arg("-c").arg(&filled);
    if let Some(dir) = &script.dir {
        command.current_dir(expand_tilde(dir));
    }

    let output = command.output().await.map_err(|e| ExecError::Spawn {
        shell: config.shell.clone(),
        script: filled.clone(),
        source: e,
    })?;

    Ok(ScriptOutcome {
        script: filled,
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run every script of a definition concurrently, collecting each outcome
/// independently. Nothing is cancelled when a sibling fails.
pub async fn run_all(
    scripts: &Scripts,
    values: &HashMap<String, OptionValue>,
    config: &ExecConfig,
) -> Vec<Result<ScriptOutcome, ExecError>> {
    join_all(
        scripts
            .as_slice()
            .iter()
            .map(|script| run_script(script, values, config)),
    )
    .await
}

/// Print an outcome the way the CLI reports it: stdout on success,
/// stderr plus the exit code on the error stream otherwise.
pub fn report(outcome: &ScriptOutcome) {
    if outcome.success() {
        print!("{}", outcome.stdout);
    } else {
        eprint!("{}", outcome.stderr);
        eprintln!("{}", outcome.failure_summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(cmd: &str) -> Script {
        Script {
            dir: None,
            cmd: cmd.to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_command_captures_stdout() {
        let outcome = run_script(&script("echo ok"), &HashMap::new(), &ExecConfig::default())
            .await
            .unwrap();
        assert!(outcome.success());
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.stdout.contains("ok"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_an_outcome_not_an_error() {
        let outcome = run_script(&script("exit 3"), &HashMap::new(), &ExecConfig::default())
            .await
            .unwrap();
        assert!(!outcome.success());
        assert_eq!(outcome.exit_code, Some(3));
        assert!(outcome.stdout.is_empty());
        assert!(outcome.failure_summary().contains("Exit code: 3"));
    }

    #[tokio::test]
    async fn test_stderr_captured_separately() {
        let outcome = run_script(
            &script("echo oops >&2; exit 1"),
            &HashMap::new(),
            &ExecConfig::default(),
        )
        .await
        .unwrap();
        assert!(outcome.stderr.contains("oops"));
        assert!(outcome.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_working_directory_applied_per_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        let outcome = run_script(
            &Script {
                dir: Some(canonical.to_string_lossy().into_owned()),
                cmd: "pwd".to_string(),
            },
            &HashMap::new(),
            &ExecConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.stdout.trim(), canonical.to_string_lossy());
    }

    #[tokio::test]
    async fn test_templating_applied_before_execution() {
        let mut values = HashMap::new();
        values.insert(
            "name".to_string(),
            OptionValue::String("world".to_string()),
        );
        let outcome = run_script(&script("echo hi ${name}"), &values, &ExecConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome.stdout.trim(), "hi world");
        assert_eq!(outcome.script, "echo hi world");
    }

    #[tokio::test]
    async fn test_multiple_scripts_all_run_to_completion() {
        let scripts = Scripts::Many(vec![script("echo one"), script("exit 2"), script("echo three")]);
        let outcomes = run_all(&scripts, &HashMap::new(), &ExecConfig::default()).await;
        assert_eq!(outcomes.len(), 3);
        let outcomes: Vec<_> = outcomes.into_iter().map(Result::unwrap).collect();
        assert!(outcomes[0].stdout.contains("one"));
        assert_eq!(outcomes[1].exit_code, Some(2));
        assert!(outcomes[2].stdout.contains("three"));
    }

    #[tokio::test]
    async fn test_spawn_failure_reported_as_error() {
        let config = ExecConfig {
            shell: "/definitely/not/a/shell".to_string(),
            verbose: false,
        };
        let result = run_script(&script("echo hi"), &HashMap::new(), &config).await;
        assert!(matches!(result, Err(ExecError::Spawn { .. })));
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("~/projects"), home.join("projects"));
        assert_eq!(expand_tilde("/tmp"), PathBuf::from("/tmp"));
    }
}
