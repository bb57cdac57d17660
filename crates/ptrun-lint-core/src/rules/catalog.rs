use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of every rule in the fixed catalog.
///
/// The numeric id groups rules into tiers: `0xxx` arguments, `10xx`
/// repository, `11xx` readme, `12xx` release, `13xx` package archive,
/// `14xx` package metadata and dependencies, `15xx` assembly, `2xxx`
/// project directory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleId {
    Args,
    Repo,
    RepoDetails,
    Readme,
    Release,
    ReleaseNotes,
    Package,
    PackageContent,
    PackageChecksum,
    PluginMetadata,
    PluginDependencies,
    Assembly,
    ProjectContent,
    ProjectDependencies,
    ProjectMetadata,
    Project,
}

impl RuleId {
    pub const ALL: [RuleId; 16] = [
        RuleId::Args,
        RuleId::Repo,
        RuleId::RepoDetails,
        RuleId::Readme,
        RuleId::Release,
        RuleId::ReleaseNotes,
        RuleId::Package,
        RuleId::PackageContent,
        RuleId::PackageChecksum,
        RuleId::PluginMetadata,
        RuleId::PluginDependencies,
        RuleId::Assembly,
        RuleId::ProjectContent,
        RuleId::ProjectDependencies,
        RuleId::ProjectMetadata,
        RuleId::Project,
    ];

    pub fn id(self) -> u16 {
        match self {
            RuleId::Args => 1,
            RuleId::Repo => 1001,
            RuleId::RepoDetails => 1002,
            RuleId::Readme => 1101,
            RuleId::Release => 1201,
            RuleId::ReleaseNotes => 1202,
            RuleId::Package => 1301,
            RuleId::PackageContent => 1302,
            RuleId::PackageChecksum => 1303,
            RuleId::PluginMetadata => 1401,
            RuleId::PluginDependencies => 1402,
            RuleId::Assembly => 1501,
            RuleId::ProjectContent => 2001,
            RuleId::ProjectDependencies => 2101,
            RuleId::ProjectMetadata => 2201,
            RuleId::Project => 2301,
        }
    }

    /// `PTRUN` followed by the zero-padded id, e.g. `PTRUN1301`.
    pub fn code(self) -> String {
        format!("PTRUN{:04}", self.id())
    }

    /// Static description. Package and project rules are shown with the
    /// artifact name appended, see `Rule::description`.
    pub fn description(self) -> &'static str {
        match self {
            RuleId::Args => "Args should be valid",
            RuleId::Repo => "Repo should be valid",
            RuleId::RepoDetails => "Repo details should be valid",
            RuleId::Readme => "Readme should be valid",
            RuleId::Release => "Release should be valid",
            RuleId::ReleaseNotes => "Release notes should be valid",
            RuleId::Package => "Package should be valid",
            RuleId::PackageContent => "Package content should be valid",
            RuleId::PackageChecksum => "Package checksum should be valid",
            RuleId::PluginMetadata => "Plugin metadata should be valid",
            RuleId::PluginDependencies => "Package dependencies should be valid",
            RuleId::Assembly => "Plugin assembly should be valid",
            RuleId::ProjectContent => "Project content should be valid",
            RuleId::ProjectDependencies => "Project dependencies should be valid",
            RuleId::ProjectMetadata => "Project metadata should be valid",
            RuleId::Project => "Project should be valid",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}
