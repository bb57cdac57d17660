//! Package archive tier: file name, content layout and checksum.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::model::{Checksum, Release};
use crate::package::{METADATA_FILE_NAME, Package};
use crate::rules::MISSING_PACKAGE;

static PACKAGE_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<name>[\w.]+)-(?<version>\d+\.\d+\.\d+)-(?<platform>(?i:arm64|x64))\.zip$")
        .expect("package file name pattern is valid")
});

pub fn is_conventional_file_name(file_name: &str) -> bool {
    PACKAGE_FILE_NAME.is_match(file_name)
}

pub fn validate_file_name(package: &Package) -> Vec<String> {
    if package.file_name().is_empty() {
        return vec![MISSING_PACKAGE.into()];
    }
    if !is_conventional_file_name(package.file_name()) {
        return vec![
            "Filename does not match \"<name>-<version>-<platform>.zip\" convention".into(),
        ];
    }
    vec![]
}

pub fn validate_content(package: &Package) -> Vec<String> {
    if !package.is_loaded() {
        return vec![MISSING_PACKAGE.into()];
    }

    let mut messages = Vec::new();
    if package.plugin_folder().is_none() {
        messages.push("Plugin folder missing".into());
    }
    if !package.file_names().any(|f| f == METADATA_FILE_NAME) {
        messages.push(format!("Metadata \"{METADATA_FILE_NAME}\" missing"));
    }
    if !package.file_names().any(|f| f.ends_with(".dll")) {
        messages.push("Assembly \".dll\" missing".into());
    }
    messages
}

/// The package hash must appear in the release notes or in the checksum
/// manifest next to the package name.
pub fn validate_checksum(
    release: Option<&Release>,
    package: &Package,
    checksums: &[Checksum],
) -> Result<Vec<String>> {
    let Some(body) = release.and_then(|r| r.body.as_deref()) else {
        return Ok(vec!["Release notes missing".into()]);
    };
    let Some(asset) = package.asset() else {
        return Ok(vec![MISSING_PACKAGE.into()]);
    };
    let Some(hash) = package.sha256()? else {
        return Ok(vec![MISSING_PACKAGE.into()]);
    };

    let in_notes = body.to_lowercase().contains(&hash.to_lowercase());
    let in_manifest = checksums.iter().any(|c| c.matches(&hash, &asset.name));

    if in_notes || in_manifest {
        Ok(vec![])
    } else {
        Ok(vec![format!("Hash \"{hash}\" missing")])
    }
}
