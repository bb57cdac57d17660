//! Repository tier: repository, readme and release rules.

use crate::model::{Readme, Release, Repository};
use crate::package::Package;
use crate::rules::{MISSING_PACKAGE, MISSING_REPOSITORY};

const PLUGIN_TOPIC: &str = "powertoys-run-plugin";

pub fn validate_repo(repository: Option<&Repository>) -> Vec<String> {
    match repository {
        Some(_) => vec![],
        None => vec![MISSING_REPOSITORY.into()],
    }
}

pub fn validate_details(repository: Option<&Repository>) -> Vec<String> {
    let Some(repository) = repository else {
        return vec![MISSING_REPOSITORY.into()];
    };

    let mut messages = Vec::new();
    let has_topic = repository
        .topics
        .as_deref()
        .is_some_and(|topics| topics.iter().any(|t| t == PLUGIN_TOPIC));
    if !has_topic {
        messages.push(format!("Topic \"{PLUGIN_TOPIC}\" missing"));
    }
    if repository.license.as_ref().and_then(|l| l.name.as_ref()).is_none() {
        messages.push("License missing".into());
    }
    messages
}

pub fn validate_readme(readme: Option<&Readme>) -> Vec<String> {
    let Some(readme) = readme else {
        return vec!["Readme missing".into()];
    };

    let text = readme.text().to_lowercase();
    let mut messages = Vec::new();
    if !text.contains("installation") {
        messages.push("Installation instructions missing".into());
    }
    if !text.contains("usage") {
        messages.push("Usage instructions missing".into());
    }
    messages
}

pub fn validate_release(release: Option<&Release>) -> Vec<String> {
    let Some(release) = release else {
        return vec!["Release missing".into()];
    };
    let Some(assets) = release.assets.as_deref() else {
        return vec!["Asset missing".into()];
    };
    if !assets.iter().any(|a| a.is_zip()) {
        return vec!["Asset \".zip\" missing".into()];
    }

    let has_platform = |platform: &str| {
        assets
            .iter()
            .any(|a| a.name.to_ascii_lowercase().contains(platform))
    };

    let mut messages = Vec::new();
    if !has_platform("arm64") {
        messages.push("Asset \"arm64\" platform missing".into());
    }
    if !has_platform("x64") {
        messages.push("Asset \"x64\" platform missing".into());
    }
    messages
}

pub fn validate_release_notes(release: Option<&Release>, package: &Package) -> Vec<String> {
    if release.and_then(|r| r.body.as_ref()).is_none() {
        return vec!["Release notes missing".into()];
    }
    if !package.is_loaded() {
        return vec![MISSING_PACKAGE.into()];
    }
    vec![]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Asset, License};

    fn repository(topics: Option<&[&str]>, license: Option<&str>) -> Repository {
        Repository {
            topics: topics.map(|t| t.iter().map(|s| s.to_string()).collect()),
            license: Some(License {
                name: license.map(str::to_string),
            }),
            ..Default::default()
        }
    }

    fn asset(name: &str, content_type: &str) -> Asset {
        Asset {
            name: name.into(),
            content_type: Some(content_type.into()),
            ..Default::default()
        }
    }

    fn release(assets: Option<Vec<Asset>>) -> Release {
        Release {
            assets,
            ..Default::default()
        }
    }

    #[test]
    fn missing_repository() {
        assert_eq!(validate_repo(None), vec!["Repository missing"]);
        assert!(validate_repo(Some(&Repository::default())).is_empty());
        assert_eq!(validate_details(None), vec!["Repository missing"]);
    }

    #[test]
    fn details_require_topic_and_license() {
        let valid = repository(Some(&["powertoys-run-plugin", "rust"]), Some("MIT License"));
        assert!(validate_details(Some(&valid)).is_empty());

        let invalid = repository(Some(&["powertoys"]), None);
        assert_eq!(
            validate_details(Some(&invalid)),
            vec!["Topic \"powertoys-run-plugin\" missing", "License missing"]
        );

        let bare = Repository::default();
        assert_eq!(validate_details(Some(&bare)).len(), 2);
    }

    #[test]
    fn readme_requires_installation_and_usage() {
        assert_eq!(validate_readme(None), vec!["Readme missing"]);

        let valid = Readme::from_text("README.md", "## Installation\n...\n## Usage\n...");
        assert!(validate_readme(Some(&valid)).is_empty());

        let empty = Readme::default();
        assert_eq!(
            validate_readme(Some(&empty)),
            vec![
                "Installation instructions missing",
                "Usage instructions missing"
            ]
        );
    }

    #[test]
    fn release_short_circuits_on_missing_assets() {
        assert_eq!(validate_release(None), vec!["Release missing"]);
        assert_eq!(validate_release(Some(&release(None))), vec!["Asset missing"]);
        assert_eq!(
            validate_release(Some(&release(Some(vec![asset("notes.txt", "text/plain")])))),
            vec!["Asset \".zip\" missing"]
        );
    }

    #[test]
    fn release_requires_both_platforms() {
        let both = release(Some(vec![
            asset("Sample-1.0.0-ARM64.zip", "application/zip"),
            asset("Sample-1.0.0-x64.zip", "application/x-zip-compressed"),
        ]));
        assert!(validate_release(Some(&both)).is_empty());

        let x64 = release(Some(vec![asset("Sample-1.0.0-x64.zip", "application/zip")]));
        assert_eq!(
            validate_release(Some(&x64)),
            vec!["Asset \"arm64\" platform missing"]
        );
    }

    #[test]
    fn release_notes_require_body_and_loaded_package() {
        let package = Package::new("Sample-1.0.0-x64.zip");
        assert_eq!(
            validate_release_notes(Some(&release(None)), &package),
            vec!["Release notes missing"]
        );

        let with_body = Release {
            body: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            validate_release_notes(Some(&with_body), &package),
            vec!["Package missing"]
        );
    }
}
