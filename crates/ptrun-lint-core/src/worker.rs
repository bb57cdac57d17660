use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::LintConfig;
use crate::error::{LintError, Result};
use crate::github::{GitHubApi, RepositoryRef};
use crate::model::{Checksum, Metadata, Readme, Release, Repository, User};
use crate::package::Package;
use crate::project::Project;
use crate::release::ReleaseHandler;
use crate::rules::Rule;
use crate::rules::args::Target;
use crate::rules::eval::{Violation, evaluate};

/// Runs the rule tiers in order, stopping early when a tier makes the rest
/// meaningless.
pub struct Worker<G> {
    github: G,
    config: LintConfig,
}

/// Accumulates violations and forwards each one to the caller as it fires.
struct Session<F> {
    on_violation: F,
    violations: Vec<Violation>,
}

impl<F: FnMut(&Violation)> Session<F> {
    /// Evaluates `rules` in order. Returns whether any of them failed.
    fn validate(&mut self, rules: &[Rule<'_>]) -> Result<bool> {
        let mut failed = false;
        for rule in rules {
            match evaluate(rule)? {
                Some(violation) => {
                    info!(code = %violation.code, messages = violation.messages.len(), "rule failed");
                    (self.on_violation)(&violation);
                    self.violations.push(violation);
                    failed = true;
                }
                None => debug!(code = %rule.code(), "rule passed"),
            }
        }
        Ok(failed)
    }
}

impl<G: GitHubApi> Worker<G> {
    pub fn new(github: G, config: LintConfig) -> Self {
        Self { github, config }
    }

    /// Lints whatever `args[0]` names.
    ///
    /// `on_violation` sees every failing rule as soon as it is evaluated;
    /// the same violations are returned at the end. A token-shaped argument
    /// only passes the argument rule; persisting it is up to the caller.
    pub async fn run<F>(&self, args: &[String], on_violation: F) -> Result<Vec<Violation>>
    where
        F: FnMut(&Violation),
    {
        info!(?args, "linting");
        let mut session = Session {
            on_violation,
            violations: Vec::new(),
        };

        if session.validate(&[Rule::Args(args)])? {
            return Ok(session.violations);
        }

        match args.first().and_then(|arg| Target::classify(arg)) {
            Some(Target::Repository(repo)) => self.lint_repository(&repo, &mut session).await?,
            Some(Target::Package(path)) => self.lint_package(&path, &mut session).await?,
            Some(Target::Project(path)) => self.lint_project(&path, &mut session).await?,
            Some(Target::PersonalAccessToken(_)) | None => {}
        }

        Ok(session.violations)
    }

    async fn lint_repository<F: FnMut(&Violation)>(
        &self,
        repo: &RepositoryRef,
        session: &mut Session<F>,
    ) -> Result<()> {
        let repository = self.github.get_repository(repo).await;
        if session.validate(&[Rule::Repo(repository.as_ref())])? {
            return Ok(());
        }

        let (readme, release) = tokio::join!(self.readme(repo), self.github.get_latest_release(repo));
        let readme = readme?;

        session.validate(&[
            Rule::RepoDetails(repository.as_ref()),
            Rule::Readme(readme.as_ref()),
            Rule::Release(release.as_ref()),
        ])?;

        // Dropping the handler deletes every download, on all paths out of here.
        let handler = ReleaseHandler::new()?;
        let mut packages = match &self.config.zip_file {
            Some(path) => vec![Package::new(path)],
            None => handler.packages(release.as_ref(), &self.github).await?,
        };
        let checksums = handler.checksums(release.as_ref(), &self.github).await;
        let user = self.github.get_user(&repo.owner).await;

        for package in &mut packages {
            package.load()?;
            let result = session.validate(&release_package_rules(
                release.as_ref(),
                package,
                &checksums,
                repository.as_ref(),
                user.as_ref(),
            ));
            package.dispose();
            result?;
        }

        Ok(())
    }

    async fn lint_package<F: FnMut(&Violation)>(
        &self,
        path: &Path,
        session: &mut Session<F>,
    ) -> Result<()> {
        let mut package = Package::new(path);
        package.load()?;

        let (repository, user) = self.resolve_website(package.metadata()).await;
        let result = session.validate(&[
            Rule::Package(&package),
            Rule::PackageContent(&package),
            Rule::PluginDependencies(&package),
            Rule::PluginMetadata {
                package: &package,
                repository: repository.as_ref(),
                user: user.as_ref(),
            },
            Rule::Assembly(&package),
        ]);
        package.dispose();
        result.map(|_| ())
    }

    async fn lint_project<F: FnMut(&Violation)>(
        &self,
        path: &Path,
        session: &mut Session<F>,
    ) -> Result<()> {
        let mut project = Project::new(path);
        project.load()?;

        let (repository, user) = self.resolve_website(project.metadata()).await;
        session.validate(&[
            Rule::ProjectContent(&project),
            Rule::ProjectDependencies(&project),
            Rule::ProjectMetadata {
                project: &project,
                repository: repository.as_ref(),
                user: user.as_ref(),
            },
            Rule::Project(&project),
        ])?;
        Ok(())
    }

    /// The local readme override, or the repository readme.
    async fn readme(&self, repo: &RepositoryRef) -> Result<Option<Readme>> {
        let Some(path) = &self.config.readme else {
            return Ok(self.github.get_readme(repo).await);
        };
        let text = fs::read_to_string(path).map_err(|e| LintError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Some(Readme::from_text(&name, &text)))
    }

    /// Repository and owner named by the metadata `Website`, when it is a
    /// GitHub repository URL.
    async fn resolve_website(
        &self,
        metadata: Option<&Metadata>,
    ) -> (Option<Repository>, Option<User>) {
        let Some(repo) = metadata.and_then(|m| RepositoryRef::parse(&m.website)) else {
            debug!("metadata website is not a GitHub repository");
            return (None, None);
        };
        tokio::join!(
            self.github.get_repository(&repo),
            self.github.get_user(&repo.owner)
        )
    }
}

fn release_package_rules<'a>(
    release: Option<&'a Release>,
    package: &'a Package,
    checksums: &'a [Checksum],
    repository: Option<&'a Repository>,
    user: Option<&'a User>,
) -> [Rule<'a>; 7] {
    [
        Rule::ReleaseNotes { release, package },
        Rule::Package(package),
        Rule::PackageContent(package),
        Rule::PackageChecksum {
            release,
            package,
            checksums,
        },
        Rule::PluginDependencies(package),
        Rule::PluginMetadata {
            package,
            repository,
            user,
        },
        Rule::Assembly(package),
    ]
}
