//! Test input discovery.

use harness_core::{HarnessError, Result, TestInput};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where and how to look for test inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Directory scanned (non-recursively) for inputs.
    pub dir: PathBuf,

    /// File extension without the leading dot.
    pub extension: String,

    /// Keep only inputs whose name contains this substring.
    pub filter: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("test_configs"),
            extension: "yaml".to_string(),
            filter: None,
        }
    }
}

impl DiscoveryConfig {
    /// Input directory with relative paths resolved against `working_dir`.
    pub fn resolve(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(&self.dir)
    }
}

/// Scan the configured input directory under `working_dir` for matching
/// files, sorted by name.
///
/// A missing directory yields no inputs; the empty-suite rule then fails
/// the run with a clearer message than a bare IO error.
pub fn discover(config: &DiscoveryConfig, working_dir: &Path) -> Result<Vec<TestInput>> {
    let dir = config.resolve(working_dir);
    let dir = dir.as_path();
    if !dir.exists() {
        warn!(dir = %dir.display(), "Test config directory does not exist");
        return Ok(Vec::new());
    }

    let discovery_err = |source| HarnessError::Discovery {
        dir: dir.to_path_buf(),
        source,
    };

    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(discovery_err)? {
        let path = entry.map_err(discovery_err)?.path();
        if !path.is_file() || !has_extension(&path, &config.extension) {
            continue;
        }
        let Some(input) = TestInput::from_path(&path) else {
            warn!(path = %path.display(), "Skipping input with non UTF-8 name");
            continue;
        };
        if let Some(filter) = &config.filter {
            if !input.name.contains(filter.as_str()) {
                debug!(input = %input.name, filter = %filter, "Filtered out");
                continue;
            }
        }
        inputs.push(input);
    }

    inputs.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = inputs.len(), dir = %dir.display(), "Discovered test inputs");
    Ok(inputs)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension)
}
