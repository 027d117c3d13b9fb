//! Compile Harness CLI
//!
//! The `compile-harness` command validates declarative firmware configs by
//! compiling each of them against a containerized build backend.
//!
//! ## Commands
//!
//! - `run`: start the backend, wait for it, compile every config, report
//! - `list`: show which configs a run would compile
//! - `show-config`: print the effective run configuration as JSON

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use harness_ci::{
    discover, BackendConfig, DiscoveryConfig, EnvironmentMode, HarnessConfig, Orchestrator,
    OutputMode, ReadinessConfig,
};
use harness_core::TestInput;
use std::convert::Infallible;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "compile-harness")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Integration test harness compiling declarative configs against a build backend", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the backend, compile every test config and report results
    Run(RunArgs),

    /// List the test configs a run would compile
    List(DiscoveryArgs),

    /// Print the effective run configuration as JSON
    ShowConfig(RunArgs),
}

#[derive(Args, Debug, Clone)]
struct DiscoveryArgs {
    /// Directory backend commands run in (holds the compose file)
    #[arg(short = 'C', long, env = "HARNESS_WORKING_DIR", default_value = ".")]
    working_dir: PathBuf,

    /// Directory with test configs, relative to the working directory
    #[arg(long, env = "HARNESS_CONFIG_DIR", default_value = "test_configs")]
    config_dir: PathBuf,

    /// Extension of test config files
    #[arg(long, env = "HARNESS_EXTENSION", default_value = "yaml")]
    extension: String,

    /// Only compile configs whose file name contains this text
    #[arg(long, env = "HARNESS_FILTER")]
    filter: Option<String>,
}

impl DiscoveryArgs {
    fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            dir: self.config_dir.clone(),
            extension: self.extension.clone(),
            filter: self.filter.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputArg {
    /// Capture compiler output and show it for failures
    Capture,
    /// Stream compiler output to the console
    Stream,
}

impl From<OutputArg> for OutputMode {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Capture => OutputMode::Capture,
            OutputArg::Stream => OutputMode::Stream,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    #[command(flatten)]
    discovery: DiscoveryArgs,

    /// Host of the backend readiness endpoint
    #[arg(long, env = "HARNESS_HOST", default_value = "localhost")]
    host: String,

    /// Port of the backend readiness endpoint
    #[arg(long, env = "HARNESS_PORT", default_value_t = 6052)]
    port: u16,

    /// Seconds to wait for the backend to become ready
    #[arg(long, env = "HARNESS_READY_TIMEOUT", default_value_t = 60)]
    ready_timeout: u64,

    /// Seconds between readiness probes
    #[arg(long, env = "HARNESS_POLL_INTERVAL", default_value_t = 2)]
    poll_interval: u64,

    /// Network timeout of a single readiness probe, in seconds
    #[arg(long, env = "HARNESS_PROBE_TIMEOUT", default_value_t = 2)]
    probe_timeout: u64,

    /// Per-config compile timeout in seconds (0 = none)
    #[arg(long, env = "HARNESS_COMPILE_TIMEOUT", default_value_t = 900)]
    compile_timeout: u64,

    /// What to do with compiler output
    #[arg(long, value_enum, env = "HARNESS_OUTPUT", default_value_t = OutputArg::Capture)]
    output: OutputArg,

    /// Compose command (e.g. "docker compose")
    #[arg(long, env = "HARNESS_COMPOSE", default_value = "docker-compose")]
    compose: String,

    /// Compose file to use instead of compose's default lookup
    #[arg(long, env = "HARNESS_COMPOSE_FILE")]
    compose_file: Option<PathBuf>,

    /// Compose service whose logs are shown on failure
    #[arg(long, env = "HARNESS_SERVICE", default_value = "esphome")]
    service: String,

    /// Compile command prefix; the mounted config path is appended
    #[arg(
        long,
        env = "HARNESS_COMPILE_COMMAND",
        default_value = "docker exec esphome-test esphome compile"
    )]
    compile_command: String,

    /// Directory inside the backend where test configs are mounted
    #[arg(long, env = "HARNESS_MOUNT_ROOT", default_value = "/config/test_configs")]
    mount_root: String,

    /// Backend log lines shown after a failure
    #[arg(long, env = "HARNESS_LOG_TAIL", default_value_t = 50)]
    log_tail: usize,

    /// Leave the environment running after the run
    #[arg(long, env = "KEEP_RUNNING", value_parser = parse_keep_running)]
    keep_running: bool,

    /// Use an already running backend; never start or stop it
    #[arg(long, env = "HARNESS_SKIP_BOOTSTRAP", conflicts_with = "keep_running")]
    skip_bootstrap: bool,

    /// Write a JSON run report to this path
    #[arg(long, env = "HARNESS_REPORT_JSON")]
    report_json: Option<PathBuf>,
}

impl RunArgs {
    fn into_config(self) -> HarnessConfig {
        let mode = if self.skip_bootstrap {
            EnvironmentMode::Attached
        } else {
            EnvironmentMode::Managed {
                keep_running: self.keep_running,
            }
        };

        HarnessConfig {
            discovery: self.discovery.discovery_config(),
            working_dir: self.discovery.working_dir,
            mode,
            backend: BackendConfig {
                compose_command: split_command(&self.compose),
                compose_file: self.compose_file,
                service: self.service,
                compile_command: split_command(&self.compile_command),
                mount_root: self.mount_root,
                compile_timeout_secs: self.compile_timeout,
                output_mode: self.output.into(),
            },
            readiness: ReadinessConfig {
                host: self.host,
                port: self.port,
                deadline_secs: self.ready_timeout,
                interval_secs: self.poll_interval,
                attempt_timeout_secs: self.probe_timeout,
            },
            log_tail_lines: self.log_tail,
            report_json: self.report_json,
        }
    }
}

/// `true` in any case keeps the environment; every other value tears it down.
fn parse_keep_running(value: &str) -> std::result::Result<bool, Infallible> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

/// Split a command line on whitespace; no quoting support.
fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    harness_core::init_tracing(cli.json, level);

    let outcome = match cli.command {
        Commands::Run(args) => cmd_run(args).await,
        Commands::List(args) => cmd_list(&args),
        Commands::ShowConfig(args) => cmd_show_config(args),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Harness run aborted");
            println!("\n✗ Tests aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run the full harness
async fn cmd_run(args: RunArgs) -> Result<ExitCode> {
    let config = args.into_config();
    let orchestrator = Orchestrator::compose(config).context("Failed to set up harness")?;

    let result = orchestrator.run(shutdown_signal()).await?;
    if let Some(path) = &result.report_path {
        println!("Report written to {}", path.display());
    }

    Ok(ExitCode::from(result.exit_code() as u8))
}

/// List discovered test configs
fn cmd_list(args: &DiscoveryArgs) -> Result<ExitCode> {
    let (dir, inputs) = list_inputs(args)?;
    if inputs.is_empty() {
        println!("✗ No test configurations found in {}", dir.display());
        return Ok(ExitCode::FAILURE);
    }

    info!(count = inputs.len(), "Listing test configs");
    for input in &inputs {
        println!("{}", input.name);
    }
    println!("\n{} test config(s)", inputs.len());
    Ok(ExitCode::SUCCESS)
}

fn list_inputs(args: &DiscoveryArgs) -> Result<(PathBuf, Vec<TestInput>)> {
    let config = args.discovery_config();
    let dir = config.resolve(&args.working_dir);
    let inputs = discover(&config, &args.working_dir)
        .with_context(|| format!("Failed to list test configs in {}", dir.display()))?;
    Ok((dir, inputs))
}

/// Print the effective configuration
fn cmd_show_config(args: RunArgs) -> Result<ExitCode> {
    let config = args.into_config();
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(ExitCode::SUCCESS)
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("compile-harness").chain(args.iter().copied()))
            .expect("parse failed")
    }

    fn run_args(args: &[&str]) -> RunArgs {
        let mut full = vec!["run"];
        full.extend_from_slice(args);
        match parse(&full).command {
            Commands::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults_match_config_defaults() {
        let config = run_args(&[]).into_config();
        assert_eq!(config, HarnessConfig::new("."));
    }

    #[test]
    fn test_run_flags_map_to_config() {
        let config = run_args(&[
            "--port",
            "6053",
            "--compile-timeout",
            "300",
            "--output",
            "stream",
            "--compose",
            "docker compose",
            "--keep-running",
            "--filter",
            "climate",
        ])
        .into_config();

        assert_eq!(config.readiness.port, 6053);
        assert_eq!(config.backend.compile_timeout_secs, 300);
        assert_eq!(config.backend.output_mode, OutputMode::Stream);
        assert_eq!(config.backend.compose_command, vec!["docker", "compose"]);
        assert_eq!(config.mode, EnvironmentMode::Managed { keep_running: true });
        assert_eq!(config.discovery.filter.as_deref(), Some("climate"));
    }

    #[test]
    fn test_skip_bootstrap_is_attached() {
        let config = run_args(&["--skip-bootstrap"]).into_config();
        assert_eq!(config.mode, EnvironmentMode::Attached);
    }

    #[test]
    fn test_skip_bootstrap_conflicts_with_keep_running() {
        let result = Cli::try_parse_from([
            "compile-harness",
            "run",
            "--skip-bootstrap",
            "--keep-running",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_keep_running_values() {
        for value in ["true", "TRUE", "True", " true "] {
            assert_eq!(parse_keep_running(value), Ok(true), "{value:?}");
        }
        for value in ["false", "FALSE", "1", "yes", "no", ""] {
            assert_eq!(parse_keep_running(value), Ok(false), "{value:?}");
        }
    }

    #[test]
    fn test_keep_running_flag_without_value() {
        let config = run_args(&["--keep-running"]).into_config();
        assert_eq!(config.mode, EnvironmentMode::Managed { keep_running: true });
    }

    #[test]
    fn test_split_command() {
        assert_eq!(
            split_command("  docker exec  esphome-test esphome compile "),
            vec!["docker", "exec", "esphome-test", "esphome", "compile"]
        );
    }

    #[test]
    fn test_list_finds_configs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("test_configs")).unwrap();
        let cli = parse(&["list", "-C", dir.path().to_str().unwrap()]);
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        let (listed_dir, inputs) = list_inputs(&args).unwrap();
        assert_eq!(listed_dir, dir.path().join("test_configs"));
        assert!(inputs.is_empty());

        std::fs::write(dir.path().join("test_configs/b.yaml"), "esphome:\n").unwrap();
        std::fs::write(dir.path().join("test_configs/a.yaml"), "esphome:\n").unwrap();
        let (_, inputs) = list_inputs(&args).unwrap();
        let names: Vec<_> = inputs.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a.yaml", "b.yaml"]);
    }
}
