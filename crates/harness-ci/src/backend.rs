//! Docker Compose backed build environment.
//!
//! The backend is driven purely through its command line: compose brings
//! the service up and down, and each compile runs through a command prefix
//! (by default `docker exec <container> esphome compile`).

use crate::batch::Compiler;
use crate::command::{CommandSpec, OutputMode};
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::runner::{CommandOutput, CommandRunner};
use async_trait::async_trait;
use harness_core::{HarnessError, Result, TestInput};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Backend command configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Compose executable plus leading arguments (e.g. `docker compose`).
    pub compose_command: Vec<String>,

    /// Compose file passed with `-f`; compose's default lookup otherwise.
    pub compose_file: Option<PathBuf>,

    /// Compose service whose logs are shown on failure.
    pub service: String,

    /// Compile command prefix; the input's mounted path is appended.
    pub compile_command: Vec<String>,

    /// Directory inside the backend where test inputs are mounted.
    pub mount_root: String,

    /// Per-input compile timeout in seconds (0 = none).
    pub compile_timeout_secs: u64,

    pub output_mode: OutputMode,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            compose_command: vec!["docker-compose".to_string()],
            compose_file: None,
            service: "esphome".to_string(),
            compile_command: ["docker", "exec", "esphome-test", "esphome", "compile"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mount_root: "/config/test_configs".to_string(),
            compile_timeout_secs: 900,
            output_mode: OutputMode::Capture,
        }
    }
}

/// Environment and compiler backed by Docker Compose.
pub struct ComposeBackend {
    config: BackendConfig,
    working_dir: Option<PathBuf>,
}

impl ComposeBackend {
    /// Backend commands run in `working_dir` (the harness cwd when `None`).
    pub fn new(config: BackendConfig, working_dir: Option<PathBuf>) -> Self {
        Self {
            config,
            working_dir,
        }
    }

    fn compose(&self, name: &str, args: &[&str]) -> CommandSpec {
        let mut command = self.config.compose_command.clone();
        if let Some(file) = &self.config.compose_file {
            command.push("-f".to_string());
            command.push(file.to_string_lossy().to_string());
        }
        command.extend(args.iter().map(|a| a.to_string()));
        CommandSpec::new(name, command).in_dir(self.working_dir.clone())
    }

    pub fn up_command(&self) -> CommandSpec {
        self.compose("compose_up", &["up", "-d", "--build"])
    }

    pub fn down_command(&self) -> CommandSpec {
        self.compose("compose_down", &["down", "-v"])
    }

    pub fn logs_command(&self, tail: usize) -> CommandSpec {
        let tail = format!("--tail={tail}");
        self.compose("compose_logs", &["logs", &tail, &self.config.service])
    }

    pub fn compile_command(&self, input: &TestInput) -> CommandSpec {
        let mut command = self.config.compile_command.clone();
        command.push(format!(
            "{}/{}",
            self.config.mount_root.trim_end_matches('/'),
            input.name
        ));
        CommandSpec::new(input.name.clone(), command)
            .with_timeout(self.config.compile_timeout_secs)
            .with_output(self.config.output_mode)
            .in_dir(self.working_dir.clone())
    }
}

#[async_trait]
impl Environment for ComposeBackend {
    async fn start(&self) -> Result<()> {
        let spec = self.up_command();
        info!(command = %spec.display(), "Starting environment");

        let output = CommandRunner::execute(&spec)
            .await
            .map_err(|e| HarnessError::Bootstrap {
                diagnostic: e.to_string(),
            })?;

        if !output.success() {
            return Err(HarnessError::Bootstrap {
                diagnostic: output.diagnostic().trim_end().to_string(),
            });
        }
        Ok(())
    }

    async fn stop(&self) -> ExecResult<()> {
        let output = CommandRunner::execute(&self.down_command()).await?;
        if !output.success() {
            warn!(exit_code = output.exit_code, stderr = %output.stderr.trim_end(), "compose down exited non-zero");
        }
        Ok(())
    }

    async fn logs(&self, tail: usize) -> ExecResult<String> {
        let output = CommandRunner::execute(&self.logs_command(tail)).await?;
        Ok(output.stdout)
    }

    fn teardown_hint(&self) -> String {
        let down = self.compose("compose_down", &["down"]).display();
        match &self.working_dir {
            Some(dir) => format!("cd {} && {}", dir.display(), down),
            None => down,
        }
    }
}

#[async_trait]
impl Compiler for ComposeBackend {
    async fn compile(&self, input: &TestInput) -> ExecResult<CommandOutput> {
        CommandRunner::execute(&self.compile_command(input)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn sh_prefix(script: &str) -> Vec<String> {
        // `$1` is the mounted input path appended by the backend.
        vec![
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
            "compile".to_string(),
        ]
    }

    fn backend(config: BackendConfig) -> ComposeBackend {
        ComposeBackend::new(config, None)
    }

    #[test]
    fn test_default_commands() {
        let backend = backend(BackendConfig::default());
        assert_eq!(backend.up_command().display(), "docker-compose up -d --build");
        assert_eq!(backend.down_command().display(), "docker-compose down -v");
        assert_eq!(backend.logs_command(50).display(), "docker-compose logs --tail=50 esphome");

        let compile = backend.compile_command(&TestInput::new("basic.yaml", "test_configs/basic.yaml"));
        assert_eq!(
            compile.display(),
            "docker exec esphome-test esphome compile /config/test_configs/basic.yaml"
        );
        assert_eq!(compile.timeout_secs, 900);
    }

    #[test]
    fn test_compose_file_and_plugin_syntax() {
        let backend = ComposeBackend::new(
            BackendConfig {
                compose_command: vec!["docker".to_string(), "compose".to_string()],
                compose_file: Some(PathBuf::from("docker-compose.test.yml")),
                ..Default::default()
            },
            Some(PathBuf::from("tests/integration")),
        );
        assert_eq!(
            backend.up_command().display(),
            "docker compose -f docker-compose.test.yml up -d --build"
        );
        assert_eq!(
            backend.up_command().working_dir,
            Some(PathBuf::from("tests/integration"))
        );
        assert_eq!(
            backend.teardown_hint(),
            "cd tests/integration && docker compose -f docker-compose.test.yml down"
        );
    }

    #[test]
    fn test_mount_root_trailing_slash() {
        let backend = backend(BackendConfig {
            mount_root: "/config/".to_string(),
            ..Default::default()
        });
        let compile = backend.compile_command(&TestInput::new("a.yaml", "a.yaml"));
        assert_eq!(compile.command.last().map(String::as_str), Some("/config/a.yaml"));
    }

    #[tokio::test]
    async fn test_compile_passes_and_fails_per_input() {
        let backend = backend(BackendConfig {
            compile_command: sh_prefix(
                r#"case "$1" in *b.yaml) echo 'syntax error' >&2; exit 1;; esac"#,
            ),
            compile_timeout_secs: 60,
            ..Default::default()
        });

        let ok = backend.compile(&TestInput::new("a.yaml", "a.yaml")).await.unwrap();
        assert!(ok.success());

        let failed = backend.compile(&TestInput::new("b.yaml", "b.yaml")).await.unwrap();
        assert_eq!(failed.exit_code, 1);
        assert_eq!(failed.stderr.trim(), "syntax error");
    }

    #[tokio::test]
    async fn test_compile_timeout_is_bounded() {
        let backend = backend(BackendConfig {
            compile_command: sh_prefix("exec sleep 30"),
            compile_timeout_secs: 1,
            ..Default::default()
        });

        let start = Instant::now();
        let err = backend
            .compile(&TestInput::new("slow.yaml", "slow.yaml"))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_start_failure_carries_diagnostic() {
        let backend = backend(BackendConfig {
            compose_command: sh_prefix("echo 'no such image' >&2; exit 1"),
            ..Default::default()
        });

        let err = backend.start().await.unwrap_err();
        match err {
            HarnessError::Bootstrap { diagnostic } => assert_eq!(diagnostic, "no such image"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_start_missing_program_is_bootstrap_error() {
        let backend = backend(BackendConfig {
            compose_command: vec!["definitely-not-compose-7e1a".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            backend.start().await,
            Err(HarnessError::Bootstrap { .. })
        ));
    }

    #[tokio::test]
    async fn test_logs_returns_stdout() {
        let backend = backend(BackendConfig {
            compose_command: vec!["echo".to_string()],
            ..Default::default()
        });
        let logs = backend.logs(50).await.unwrap();
        assert_eq!(logs.trim(), "logs --tail=50 esphome");
    }
}
