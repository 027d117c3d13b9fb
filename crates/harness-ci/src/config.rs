//! Harness configuration.

use crate::backend::BackendConfig;
use crate::discovery::DiscoveryConfig;
use crate::environment::EnvironmentMode;
use crate::readiness::ReadinessConfig;
use harness_core::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything one harness run needs to know.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Directory backend commands run in; relative paths resolve here.
    pub working_dir: PathBuf,

    pub mode: EnvironmentMode,

    pub backend: BackendConfig,

    pub readiness: ReadinessConfig,

    pub discovery: DiscoveryConfig,

    /// Backend log lines shown after a failed run.
    pub log_tail_lines: usize,

    /// Where to write the JSON run report, if anywhere.
    pub report_json: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl HarnessConfig {
    /// Defaults for a run rooted at `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            mode: EnvironmentMode::default(),
            backend: BackendConfig::default(),
            readiness: ReadinessConfig::default(),
            discovery: DiscoveryConfig::default(),
            log_tail_lines: 50,
            report_json: None,
        }
    }

    /// Directory scanned for test inputs.
    pub fn inputs_dir(&self) -> PathBuf {
        self.discovery.resolve(&self.working_dir)
    }

    /// Backend working directory, `None` meaning the process cwd.
    pub fn backend_dir(&self) -> Option<PathBuf> {
        if self.working_dir.as_os_str().is_empty() {
            None
        } else {
            Some(self.working_dir.clone())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.compile_command.is_empty() {
            return Err(HarnessError::Config("compile command is empty".to_string()));
        }
        if self.backend.compose_command.is_empty() && self.mode != EnvironmentMode::Attached {
            return Err(HarnessError::Config("compose command is empty".to_string()));
        }
        if self.readiness.interval_secs == 0 {
            return Err(HarnessError::Config(
                "readiness interval must be at least one second".to_string(),
            ));
        }
        if self.readiness.attempt_timeout_secs == 0 {
            return Err(HarnessError::Config(
                "readiness probe timeout must be at least one second".to_string(),
            ));
        }
        if self.readiness.host.is_empty() {
            return Err(HarnessError::Config("readiness host is empty".to_string()));
        }
        if self.discovery.extension.is_empty() {
            return Err(HarnessError::Config("input extension is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = HarnessConfig::new(".");
        config.validate().unwrap();
        assert_eq!(config.log_tail_lines, 50);
        assert_eq!(config.inputs_dir(), PathBuf::from("./test_configs"));
        assert_eq!(
            config.mode,
            EnvironmentMode::Managed {
                keep_running: false
            }
        );
    }

    #[test]
    fn test_empty_compile_command_rejected() {
        let mut config = HarnessConfig::new(".");
        config.backend.compile_command.clear();
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_empty_compose_allowed_when_attached() {
        let mut config = HarnessConfig::new(".");
        config.backend.compose_command.clear();
        assert!(config.validate().is_err());
        config.mode = EnvironmentMode::Attached;
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = HarnessConfig::new(".");
        config.readiness.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_probe_timeout_rejected() {
        let mut config = HarnessConfig::new(".");
        config.readiness.attempt_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_backend_dir() {
        assert_eq!(HarnessConfig::new("").backend_dir(), None);
        assert_eq!(
            HarnessConfig::new("tests/integration").backend_dir(),
            Some(PathBuf::from("tests/integration"))
        );
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(HarnessConfig::new(".")).unwrap();
        assert_eq!(json["readiness"]["port"], 6052);
        assert_eq!(json["mode"]["mode"], "managed");
        assert_eq!(json["backend"]["output_mode"], "capture");
    }
}
