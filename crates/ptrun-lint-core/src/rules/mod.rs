//! The closed rule catalog.
//!
//! Each [`Rule`] borrows the artifacts it inspects; any of them may be
//! absent. `validate` checks its required inputs first and, when one is
//! missing, yields a single explanatory message instead of the detail
//! checks.

use crate::error::Result;
use crate::model::{Checksum, Readme, Release, Repository, User};
use crate::package::Package;
use crate::project::Project;

pub mod args;
pub mod assembly;
pub mod catalog;
pub mod dependencies;
pub mod eval;
pub mod metadata;
pub mod package;
pub mod project;
pub mod repo;

use catalog::RuleId;

pub const MISSING_PACKAGE: &str = "Package missing";
pub const MISSING_REPOSITORY: &str = "Repository missing";
pub const MISSING_USER: &str = "User missing";

/// A rule bound to its artifacts.
#[derive(Debug, Clone, Copy)]
pub enum Rule<'a> {
    Args(&'a [String]),
    Repo(Option<&'a Repository>),
    RepoDetails(Option<&'a Repository>),
    Readme(Option<&'a Readme>),
    Release(Option<&'a Release>),
    ReleaseNotes {
        release: Option<&'a Release>,
        package: &'a Package,
    },
    Package(&'a Package),
    PackageContent(&'a Package),
    PackageChecksum {
        release: Option<&'a Release>,
        package: &'a Package,
        checksums: &'a [Checksum],
    },
    PluginMetadata {
        package: &'a Package,
        repository: Option<&'a Repository>,
        user: Option<&'a User>,
    },
    PluginDependencies(&'a Package),
    Assembly(&'a Package),
    ProjectContent(&'a Project),
    ProjectDependencies(&'a Project),
    ProjectMetadata {
        project: &'a Project,
        repository: Option<&'a Repository>,
        user: Option<&'a User>,
    },
    Project(&'a Project),
}

impl Rule<'_> {
    pub fn id(&self) -> RuleId {
        match self {
            Rule::Args(_) => RuleId::Args,
            Rule::Repo(_) => RuleId::Repo,
            Rule::RepoDetails(_) => RuleId::RepoDetails,
            Rule::Readme(_) => RuleId::Readme,
            Rule::Release(_) => RuleId::Release,
            Rule::ReleaseNotes { .. } => RuleId::ReleaseNotes,
            Rule::Package(_) => RuleId::Package,
            Rule::PackageContent(_) => RuleId::PackageContent,
            Rule::PackageChecksum { .. } => RuleId::PackageChecksum,
            Rule::PluginMetadata { .. } => RuleId::PluginMetadata,
            Rule::PluginDependencies(_) => RuleId::PluginDependencies,
            Rule::Assembly(_) => RuleId::Assembly,
            Rule::ProjectContent(_) => RuleId::ProjectContent,
            Rule::ProjectDependencies(_) => RuleId::ProjectDependencies,
            Rule::ProjectMetadata { .. } => RuleId::ProjectMetadata,
            Rule::Project(_) => RuleId::Project,
        }
    }

    pub fn code(&self) -> String {
        self.id().code()
    }

    /// Description with the package or project name appended, when the rule
    /// inspects one.
    pub fn description(&self) -> String {
        let base = self.id().description();
        match self.artifact_name() {
            Some(name) => format!("{base} ({name})"),
            None => base.to_string(),
        }
    }

    fn artifact_name(&self) -> Option<&str> {
        match self {
            Rule::ReleaseNotes { package, .. }
            | Rule::Package(package)
            | Rule::PackageContent(package)
            | Rule::PackageChecksum { package, .. }
            | Rule::PluginMetadata { package, .. }
            | Rule::PluginDependencies(package)
            | Rule::Assembly(package) => Some(package.name()),
            Rule::ProjectContent(project)
            | Rule::ProjectDependencies(project)
            | Rule::ProjectMetadata { project, .. }
            | Rule::Project(project) => Some(project.name()),
            _ => None,
        }
    }

    /// Diagnostics for this rule; empty when it passes.
    ///
    /// Only genuine I/O failures (hashing the package file) are errors.
    pub fn validate(&self) -> Result<Vec<String>> {
        let messages = match *self {
            Rule::Args(args) => args::validate(args),
            Rule::Repo(repository) => repo::validate_repo(repository),
            Rule::RepoDetails(repository) => repo::validate_details(repository),
            Rule::Readme(readme) => repo::validate_readme(readme),
            Rule::Release(release) => repo::validate_release(release),
            Rule::ReleaseNotes { release, package } => {
                repo::validate_release_notes(release, package)
            }
            Rule::Package(package) => package::validate_file_name(package),
            Rule::PackageContent(package) => package::validate_content(package),
            Rule::PackageChecksum {
                release,
                package,
                checksums,
            } => package::validate_checksum(release, package, checksums)?,
            Rule::PluginMetadata {
                package,
                repository,
                user,
            } => metadata::validate_package(package, repository, user),
            Rule::PluginDependencies(package) => dependencies::validate_package(package),
            Rule::Assembly(package) => assembly::validate(package),
            Rule::ProjectContent(project) => project::validate_content(project),
            Rule::ProjectDependencies(project) => dependencies::validate_project(project),
            Rule::ProjectMetadata {
                project,
                repository,
                user,
            } => metadata::validate_project(project, repository, user),
            Rule::Project(project) => project::validate(project),
        };
        Ok(messages)
    }
}
