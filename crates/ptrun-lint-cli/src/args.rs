use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "ptrun-lint",
    version,
    about = "Linter for PowerToys Run community plugins"
)]
pub struct Args {
    /// GitHub repository URL, plugin .zip, project directory, or a personal
    /// access token to save
    pub target: Option<String>,

    /// Local package used instead of the release packages
    #[arg(long, requires = "readme")]
    pub zip_file: Option<PathBuf>,

    /// Local readme used instead of the repository readme
    #[arg(long, requires = "zip_file")]
    pub readme: Option<PathBuf>,

    /// GitHub personal access token, overrides the saved one
    #[arg(long, env = "PTRUN_LINT_GITHUB_PAT", hide_env_values = true)]
    pub github_pat: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "PTRUN_LINT_API_URL", hide = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Log file, appended to
    #[arg(long, default_value = "ptrun-lint.log")]
    pub log_file: PathBuf,

    /// Log at debug level
    #[arg(long, short)]
    pub verbose: bool,

    /// Settings file, defaults to the platform config directory
    #[arg(long)]
    pub settings_file: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
