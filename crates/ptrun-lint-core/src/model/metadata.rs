use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{LintError, Result};
use crate::model::github::User;

/// The plugin descriptor (`plugin.json`).
///
/// Fields that are absent or `null` in the document read as their default
/// so that rules, not the parser, report what is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(rename = "ID", deserialize_with = "nullable")]
    pub id: String,
    #[serde(rename = "ActionKeyword", deserialize_with = "nullable")]
    pub action_keyword: String,
    #[serde(rename = "IsGlobal", deserialize_with = "nullable")]
    pub is_global: bool,
    #[serde(rename = "Name", deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "Author", deserialize_with = "nullable")]
    pub author: String,
    #[serde(rename = "Version", deserialize_with = "nullable")]
    pub version: String,
    #[serde(rename = "Language", deserialize_with = "nullable")]
    pub language: String,
    #[serde(rename = "Website", deserialize_with = "nullable")]
    pub website: String,
    #[serde(rename = "ExecuteFileName", deserialize_with = "nullable")]
    pub execute_file_name: String,
    #[serde(rename = "IcoPathDark", deserialize_with = "nullable")]
    pub ico_path_dark: String,
    #[serde(rename = "IcoPathLight", deserialize_with = "nullable")]
    pub ico_path_light: String,
    #[serde(rename = "DynamicLoading", deserialize_with = "nullable")]
    pub dynamic_loading: bool,
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Metadata {
    /// Parses a `plugin.json` document. A leading UTF-8 BOM is ignored.
    pub fn parse(entry: &str, bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        serde_json::from_slice(bytes).map_err(|source| LintError::Metadata {
            entry: entry.to_string(),
            source,
        })
    }

    /// The author must be non-empty and equal the GitHub login or display name.
    pub fn has_valid_author(&self, user: &User) -> bool {
        !self.author.is_empty()
            && (self.author == user.login || user.name.as_deref() == Some(self.author.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(login: &str, name: Option<&str>) -> User {
        User {
            login: login.into(),
            name: name.map(str::to_string),
        }
    }

    fn author(value: &str) -> Metadata {
        Metadata {
            author: value.into(),
            ..Default::default()
        }
    }

    #[test]
    fn author_matches_login_or_display_name() {
        assert!(author("hlaueriksson").has_valid_author(&user("hlaueriksson", None)));
        assert!(
            author("Henrik Lau Eriksson")
                .has_valid_author(&user("", Some("Henrik Lau Eriksson")))
        );
        assert!(!author("Foo").has_valid_author(&user("Bar", None)));
        assert!(!author("Foo").has_valid_author(&User::default()));
    }

    #[test]
    fn author_comparison_is_case_sensitive() {
        assert!(!author("HLAUERIKSSON").has_valid_author(&user("hlaueriksson", None)));
    }

    #[test]
    fn empty_author_never_matches() {
        assert!(!author("").has_valid_author(&user("", Some(""))));
        assert!(!Metadata::default().has_valid_author(&User::default()));
    }

    #[test]
    fn parses_plugin_json_with_bom_and_nulls() {
        let json = "\u{feff}{\"ID\":\"5A0D4E8B5C4B4D7F9F5E3A8C3D2B1A09\",\"ActionKeyword\":\"vl\",\
            \"Name\":\"Valid\",\"Author\":null,\"Version\":\"0.87.0\",\"DynamicLoading\":true}";

        let metadata = Metadata::parse("Valid/plugin.json", json.as_bytes()).unwrap();
        assert_eq!(metadata.id, "5A0D4E8B5C4B4D7F9F5E3A8C3D2B1A09");
        assert_eq!(metadata.author, "");
        assert_eq!(metadata.website, "");
        assert!(metadata.dynamic_loading);
        assert!(!metadata.is_global);
    }

    #[test]
    fn invalid_json_is_a_metadata_error() {
        let err = Metadata::parse("Valid/plugin.json", b"{ not json").unwrap_err();
        assert!(matches!(err, LintError::Metadata { .. }));
    }
}
