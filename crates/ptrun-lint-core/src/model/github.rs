//! GitHub REST API payloads consumed by the linter.
//!
//! Only the fields the rules inspect are modelled. Every struct tolerates
//! missing fields so a partially populated response still deserializes.

use serde::{Deserialize, Serialize};

/// `GET /users/{owner}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub login: String,
    pub name: Option<String>,
}

/// `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub topics: Option<Vec<String>>,
    pub license: Option<License>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct License {
    pub name: Option<String>,
}

/// `GET /repos/{owner}/{repo}/readme`
///
/// `content` is base64 encoded, wrapped with newlines by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Readme {
    #[serde(rename = "type")]
    pub kind: String,
    pub encoding: String,
    pub size: u64,
    pub name: String,
    pub path: String,
    pub content: Option<String>,
    pub html_url: String,
    pub download_url: Option<String>,
}

impl Readme {
    /// Wraps local readme text in the same shape the API returns.
    pub fn from_text(name: &str, text: &str) -> Self {
        use base64::Engine;

        Self {
            kind: "file".into(),
            encoding: "base64".into(),
            size: text.len() as u64,
            name: name.into(),
            path: name.into(),
            content: Some(base64::engine::general_purpose::STANDARD.encode(text)),
            ..Default::default()
        }
    }

    /// Decoded readme text. Undecodable content reads as empty.
    pub fn text(&self) -> String {
        use base64::Engine;

        let Some(content) = &self.content else {
            return String::new();
        };
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

/// `GET /repos/{owner}/{repo}/releases/latest`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    pub html_url: String,
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    pub assets: Option<Vec<Asset>>,
}

impl Release {
    /// Assets of the release; an absent array reads as empty.
    pub fn assets(&self) -> &[Asset] {
        self.assets.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
    pub browser_download_url: String,
    pub id: u64,
    pub name: String,
    pub label: Option<String>,
    pub state: String,
    pub content_type: Option<String>,
    pub size: u64,
}

impl Asset {
    /// A zip asset is recognised by content type or by file extension.
    pub fn is_zip(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .is_some_and(|t| t.to_ascii_lowercase().contains("zip"));
        by_type || self.name.to_ascii_lowercase().ends_with(".zip")
    }

    pub fn is_checksums_file(&self) -> bool {
        self.name == "checksums.txt"
    }
}
