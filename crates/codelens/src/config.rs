//! Lens configuration.
//!
//! Configuration is read once, when a [`crate::LensProvider`] is built. It lives
//! in an optional `.codelens.yaml` found by walking up from the file's directory:
//!
//! ```yaml
//! history-lenses: true
//! blame:
//!   program: git
//!   stderr-policy: exit-status   # or: strict
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::blame::{GitBlame, StderrPolicy};
use crate::error::{Error, Result};

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = ".codelens.yaml";

/// Maximum directory depth to traverse when searching for a configuration file.
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Options that shape lens generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LensConfig {
    /// Emit and resolve history lenses (and run the history subprocess at all).
    pub history_lenses: bool,

    /// History subprocess settings.
    pub blame: BlameConfig,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            history_lenses: true,
            blame: BlameConfig::default(),
        }
    }
}

/// Settings for the history subprocess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BlameConfig {
    /// Version-control executable.
    pub program: String,

    /// How stderr output is judged.
    pub stderr_policy: StderrPolicy,
}

impl Default for BlameConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            stderr_policy: StderrPolicy::default(),
        }
    }
}

impl BlameConfig {
    /// Build the history fetcher these settings describe.
    #[must_use]
    pub fn git_blame(&self) -> GitBlame {
        GitBlame::new(self.program.clone(), self.stderr_policy)
    }
}

impl LensConfig {
    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the text is not valid configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if it
    /// is malformed.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::from_yaml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Find and load the nearest configuration file above `start`, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be loaded.
    pub async fn discover(start: &Path) -> Result<Self> {
        match find_config_file(start).await {
            Some(path) => {
                debug!(config = %path.display(), "Loading lens configuration");
                Self::load(&path).await
            }
            None => Ok(Self::default()),
        }
    }
}

/// Walk up from `start` looking for [`CONFIG_FILE_NAME`].
async fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    let mut depth = 0;

    while let Some(dir) = current {
        if depth >= MAX_TRAVERSAL_DEPTH {
            break;
        }
        let candidate = dir.join(CONFIG_FILE_NAME);
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Some(candidate);
        }
        current = dir.parent();
        depth += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_enable_history_lenses() {
        let config = LensConfig::default();
        assert!(config.history_lenses);
        assert_eq!(config.blame.program, "git");
        assert_eq!(config.blame.stderr_policy, StderrPolicy::ExitStatus);
    }

    #[test]
    fn parses_partial_yaml_with_defaults() {
        let config = LensConfig::from_yaml("history-lenses: false\n").expect("valid yaml");
        assert!(!config.history_lenses);
        assert_eq!(config.blame, BlameConfig::default());
    }

    #[test]
    fn parses_blame_section() {
        let yaml = "blame:\n  program: /usr/local/bin/git\n  stderr-policy: strict\n";
        let config = LensConfig::from_yaml(yaml).expect("valid yaml");

        assert!(config.history_lenses);
        assert_eq!(config.blame.program, "/usr/local/bin/git");
        assert_eq!(config.blame.stderr_policy, StderrPolicy::Strict);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(LensConfig::from_yaml("").unwrap(), LensConfig::default());
    }

    #[test]
    fn rejects_malformed_yaml() {
        let result = LensConfig::from_yaml("history-lenses: [not, a, bool]");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn discover_finds_config_in_parent_directory() {
        let dir = tempdir().expect("failed to create temp dir");
        let nested = dir.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).expect("failed to create nested dir");
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "history-lenses: false\n")
            .expect("failed to write config");

        let config = LensConfig::discover(&nested).await.expect("discover should succeed");
        assert!(!config.history_lenses);
    }

    #[tokio::test]
    async fn discover_without_config_returns_defaults() {
        let dir = tempdir().expect("failed to create temp dir");

        let config = LensConfig::discover(dir.path()).await.expect("discover should succeed");
        assert_eq!(config, LensConfig::default());
    }
}
