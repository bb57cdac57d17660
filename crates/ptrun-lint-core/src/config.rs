use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LintError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("ptrun-lint/", env!("CARGO_PKG_VERSION"));

/// Runtime configuration for a lint run.
///
/// Built once by the caller and threaded into the GitHub client; there is
/// no process-wide state.
#[derive(Debug, Clone)]
pub struct LintConfig {
    /// GitHub REST API base URL, without a trailing slash.
    pub api_url: String,
    pub user_agent: String,
    /// Timeout for API lookups.
    pub timeout: Duration,
    /// Timeout for release asset downloads.
    pub download_timeout: Duration,
    pub personal_access_token: Option<String>,
    /// Local readme used instead of the repository readme.
    pub readme: Option<PathBuf>,
    /// Local package used instead of the release packages.
    pub zip_file: Option<PathBuf>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(5),
            download_timeout: Duration::from_secs(60),
            personal_access_token: None,
            readme: None,
            zip_file: None,
        }
    }
}

/// Settings persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub personal_access_token: Option<String>,
}

impl Settings {
    /// `<config dir>/ptrun-lint/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ptrun-lint").join("settings.json"))
    }

    /// Loads settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| LintError::io(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| LintError::Settings(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LintError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| LintError::Settings(e.to_string()))?;
        fs::write(path, content).map_err(|e| LintError::io(path, e))?;
        info!(path = %path.display(), "settings saved");
        Ok(())
    }
}
