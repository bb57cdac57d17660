//! Dependency rules for packages (1402) and project directories (2101).

use std::sync::LazyLock;

use regex::Regex;

use crate::package::Package;
use crate::project::Project;
use crate::rules::MISSING_PACKAGE;

/// Libraries PowerToys Run already loads into the plugin host.
pub const HOST_ASSEMBLIES: [&str; 5] = [
    "PowerToys.Common.UI.dll",
    "PowerToys.ManagedCommon.dll",
    "PowerToys.Settings.UI.Lib.dll",
    "Wox.Infrastructure.dll",
    "Wox.Plugin.dll",
];

const NEWTONSOFT_JSON: &str = "Newtonsoft.Json";

const CENTRAL_MANIFEST: &str = include_str!("../../resources/Directory.Packages.props.xml");

static PACKAGE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<PackageVersion\s+Include="([^"]+)"\s+Version="([^"]*)""#)
        .expect("package version pattern is valid")
});

/// A package pinned by PowerToys' central package management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralPackage {
    pub name: &'static str,
    pub version: &'static str,
}

static CENTRAL_PACKAGES: LazyLock<Vec<CentralPackage>> =
    LazyLock::new(|| parse_central_packages(CENTRAL_MANIFEST));

/// Packages listed in the bundled `Directory.Packages.props`.
pub fn central_packages() -> &'static [CentralPackage] {
    &CENTRAL_PACKAGES
}

fn parse_central_packages(manifest: &'static str) -> Vec<CentralPackage> {
    PACKAGE_VERSION
        .captures_iter(manifest)
        .filter_map(|c| {
            Some(CentralPackage {
                name: c.get(1)?.as_str(),
                version: c.get(2)?.as_str(),
            })
        })
        .collect()
}

fn newtonsoft_message() -> String {
    format!("Unnecessary dependency: {NEWTONSOFT_JSON}, consider using System.Text.Json")
}

pub fn validate_package(package: &Package) -> Vec<String> {
    if !package.is_loaded() {
        return vec![MISSING_PACKAGE.into()];
    }

    let contains = |file: &str| package.file_names().any(|f| f == file);
    let mut messages = Vec::new();

    for host in HOST_ASSEMBLIES {
        if contains(host) {
            messages.push(format!("Unnecessary dependency: {host}"));
        }
    }
    if contains(&format!("{NEWTONSOFT_JSON}.dll")) {
        messages.push(newtonsoft_message());
    }
    for central in central_packages() {
        if contains(&format!("{}.dll", central.name)) {
            messages.push(format!(
                "Unnecessary dependency: {}, already defined in Central Package Management (Directory.Packages.props)",
                central.name
            ));
        }
    }
    messages
}

pub fn validate_project(project: &Project) -> Vec<String> {
    let Some(project_file) = project.project_file() else {
        return vec!["Project missing".into()];
    };
    let references = &project_file.package_references;

    let mut messages = Vec::new();
    if references
        .iter()
        .any(|r| r.name.eq_ignore_ascii_case(NEWTONSOFT_JSON))
    {
        messages.push(newtonsoft_message());
    }
    for central in central_packages() {
        let inconsistent = references
            .iter()
            .any(|r| r.name.eq_ignore_ascii_case(central.name) && r.version != central.version);
        if inconsistent {
            messages.push(format!(
                "Inconstant dependency version: {}, use version \"{}\" as defined in Central Package Management (Directory.Packages.props)",
                central.name, central.version
            ));
        }
    }
    messages
}
