use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use ptrun_lint_core::report::{Report, ToolInfo, render};
use ptrun_lint_core::rules::args::Target;
use ptrun_lint_core::{GitHubClient, LintConfig, LintError, Settings, TOOL_NAME, Worker};

mod args;
mod logging;

const MAX_EXIT_CODE: usize = 255;

#[tokio::main]
async fn main() {
    let args = args::Args::parse();

    let code = match run(args).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:#}");
            err.downcast_ref::<LintError>()
                .map_or(1, LintError::exit_code)
        }
    };

    std::process::exit(code);
}

/// Exit code: the number of diagnostic messages.
async fn run(args: args::Args) -> Result<i32> {
    logging::init(&args.log_file, args.verbose)?;

    let settings_path = args.settings_file.clone().or_else(Settings::default_path);
    let targets: Vec<String> = args.target.iter().cloned().collect();

    if let Some(Target::PersonalAccessToken(token)) =
        args.target.as_deref().and_then(Target::classify)
    {
        let path = settings_path.clone().context("no settings location available")?;
        let settings = Settings {
            personal_access_token: Some(token),
        };
        settings.save(&path)?;
        println!("Personal access token saved to {}", path.display());
    }

    let config = config(&args, settings_path)?;
    let github = GitHubClient::new(&config)?;
    let worker = Worker::new(github, config);

    let violations = match args.format {
        args::OutputFormat::Text => {
            worker
                .run(&targets, |violation| {
                    print!("{}", render::render_violation(violation))
                })
                .await?
        }
        args::OutputFormat::Json => worker.run(&targets, |_| {}).await?,
    };

    let tool = ToolInfo {
        name: TOOL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let report = Report::new(tool, args.target.clone(), violations);
    info!(errors = report.error_count, "lint finished");

    match args.format {
        args::OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        args::OutputFormat::Text => print!("{}", render::render_summary(&report)),
    }

    Ok(exit_code(report.error_count))
}

/// Exit statuses are a byte on Unix, so the count stops at 255.
fn exit_code(error_count: usize) -> i32 {
    error_count.min(MAX_EXIT_CODE) as i32
}

fn config(args: &args::Args, settings_path: Option<PathBuf>) -> Result<LintConfig> {
    let mut config = LintConfig {
        readme: args.readme.clone(),
        zip_file: args.zip_file.clone(),
        ..LintConfig::default()
    };
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }

    config.personal_access_token = match &args.github_pat {
        Some(token) => Some(token.clone()),
        None => match settings_path {
            Some(path) => Settings::load(&path)?.personal_access_token,
            None => None,
        },
    };
    Ok(config)
}
