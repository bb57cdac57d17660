pub mod clr;
pub mod config;
pub mod error;
pub mod github;
pub mod model;
pub mod package;
pub mod project;
pub mod release;
pub mod report;
pub mod rules;
pub mod worker;

pub use config::{LintConfig, Settings};
pub use error::{LintError, Result};
pub use github::GitHubClient;
pub use worker::Worker;

pub const TOOL_NAME: &str = "ptrun-lint";
