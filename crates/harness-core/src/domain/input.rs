//! Test input identity.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One declarative configuration file to validate by compilation.
///
/// `name` is the file name and is unique within a run, since inputs are
/// discovered from a single directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestInput {
    pub name: String,
    pub path: PathBuf,
}

impl TestInput {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Build an input from a path, using its file name as the input name.
    ///
    /// Returns `None` for paths without a UTF-8 file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self::new(name, path))
    }
}
