//! `plugin.json` rules for packages (1401) and project directories (2201).

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Metadata, Repository, User};
use crate::package::Package;
use crate::project::Project;
use crate::rules::{MISSING_PACKAGE, MISSING_REPOSITORY, MISSING_USER};

/// Action keywords already claimed by the built-in plugins.
pub const RESERVED_ACTION_KEYWORDS: [&str; 17] = [
    "=", "?", "!!", ".", "o:", ":", "!", ">", ")", "%%", "#", "//", "{", "??", "$", "_", "<",
];

static ASSEMBLY_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Community\.PowerToys\.Run\.Plugin\.(.+)\.dll$")
        .expect("assembly file name pattern is valid")
});

static DOTTED_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").expect("version pattern is valid"));

const EXECUTE_FILE_NAME_CONVENTION: &str =
    "ExecuteFileName does not match \"Community.PowerToys.Run.Plugin.<Name>.dll\" convention";

/// 32 hex digits without separators.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Two to four dot-separated non-negative integers.
pub fn is_valid_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    (2..=4).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) && p.parse::<i32>().is_ok())
}

/// First `major.minor.patch` substring of `text`.
pub fn dotted_version(text: &str) -> Option<&str> {
    DOTTED_VERSION.find(text).map(|m| m.as_str())
}

pub fn validate_package(
    package: &Package,
    repository: Option<&Repository>,
    user: Option<&User>,
) -> Vec<String> {
    let Some(metadata) = package.metadata() else {
        return vec![MISSING_PACKAGE.into()];
    };
    let Some(repository) = repository else {
        return vec![MISSING_REPOSITORY.into()];
    };
    let Some(user) = user else {
        return vec![MISSING_USER.into()];
    };

    let mut messages = Vec::new();
    check_identity(metadata, &mut messages);
    if package.plugin_folder() != Some(metadata.name.as_str()) {
        messages.push("Name does not match plugin folder".into());
    }
    if !metadata.has_valid_author(user) {
        messages.push("Author does not match GitHub user".into());
    }
    if !is_valid_version(&metadata.version) {
        messages.push("Version is invalid".into());
    }
    let file_version = dotted_version(package.file_name());
    if file_version.is_none() || dotted_version(&metadata.version) != file_version {
        messages.push("Version does not match filename version".into());
    }
    if metadata.website != repository.html_url {
        messages.push("Website does not match repo URL".into());
    }
    if !package.contains_path_suffix(&metadata.execute_file_name) {
        messages.push("ExecuteFileName missing in package".into());
    }
    if !ASSEMBLY_FILE_NAME.is_match(&metadata.execute_file_name) {
        messages.push(EXECUTE_FILE_NAME_CONVENTION.into());
    }
    if !package.contains_path_suffix(&metadata.ico_path_dark) {
        messages.push("IcoPathDark missing in package".into());
    }
    if !package.contains_path_suffix(&metadata.ico_path_light) {
        messages.push("IcoPathLight missing in package".into());
    }
    let assemblies = package.file_names().filter(|f| f.ends_with(".dll")).count();
    if metadata.dynamic_loading && assemblies == 1 {
        messages.push("DynamicLoading is unnecessary".into());
    }
    messages
}

pub fn validate_project(
    project: &Project,
    repository: Option<&Repository>,
    user: Option<&User>,
) -> Vec<String> {
    let Some(metadata) = project.metadata() else {
        return vec!["Metadata missing".into()];
    };
    let Some(repository) = repository else {
        return vec![MISSING_REPOSITORY.into()];
    };
    let Some(user) = user else {
        return vec![MISSING_USER.into()];
    };

    let mut messages = Vec::new();
    check_identity(metadata, &mut messages);
    if !metadata.has_valid_author(user) {
        messages.push("Author does not match GitHub user".into());
    }
    if !is_valid_version(&metadata.version) {
        messages.push("Version is invalid".into());
    }
    if metadata.website != repository.html_url {
        messages.push("Website does not match repo URL".into());
    }
    let assembly = project
        .project_file()
        .map(|p| format!("{}.dll", p.assembly_name));
    if assembly.as_deref() != Some(metadata.execute_file_name.as_str()) {
        messages.push("ExecuteFileName missing in project".into());
    }
    if !ASSEMBLY_FILE_NAME.is_match(&metadata.execute_file_name) {
        messages.push(EXECUTE_FILE_NAME_CONVENTION.into());
    }
    if !project.contains_path_suffix(&metadata.ico_path_dark) {
        messages.push("IcoPathDark missing in project".into());
    }
    if !project.contains_path_suffix(&metadata.ico_path_light) {
        messages.push("IcoPathLight missing in project".into());
    }
    messages
}

fn check_identity(metadata: &Metadata, messages: &mut Vec<String>) {
    if !is_valid_id(&metadata.id) {
        messages.push("ID is invalid".into());
    }
    if RESERVED_ACTION_KEYWORDS.contains(&metadata.action_keyword.as_str()) {
        messages.push("ActionKeyword is not unique".into());
    }
}
