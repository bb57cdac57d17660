use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of a lint run.
///
/// Rule findings are never reported through this type; they are plain
/// diagnostic strings. A `LintError` means the run could not continue, e.g.
/// the package is not a zip or the plugin binary is not a CLI assembly.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid package archive {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid plugin metadata in {entry}: {source}")]
    Metadata {
        entry: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("bad image format in {entry}: {reason}")]
    BadImageFormat { entry: String, reason: String },

    #[error("settings error: {0}")]
    Settings(String),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

impl LintError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for a run aborted by this error.
    ///
    /// Uses the sysexits values for data (65) and I/O (74) failures so that
    /// a fatal abort is distinguishable from a small diagnostic count.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Zip { .. } | Self::Metadata { .. } | Self::BadImageFormat { .. } => 65,
            Self::Io { .. } => 74,
            Self::Settings(_) | Self::Http(_) => 1,
        }
    }
}

pub type Result<T, E = LintError> = std::result::Result<T, E>;
