use std::path::{Path, PathBuf};

use crate::github::{RepositoryRef, is_personal_access_token};

/// What the positional argument asks the linter to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    PersonalAccessToken(String),
    Repository(RepositoryRef),
    Package(PathBuf),
    Project(PathBuf),
}

impl Target {
    /// Classifies `arg`; `None` when it is none of the accepted shapes.
    pub fn classify(arg: &str) -> Option<Self> {
        if is_personal_access_token(arg) {
            return Some(Target::PersonalAccessToken(arg.to_string()));
        }
        if let Some(repo) = RepositoryRef::parse(arg) {
            return Some(Target::Repository(repo));
        }
        let path = Path::new(arg);
        if path.is_file() && arg.to_ascii_lowercase().ends_with(".zip") {
            return Some(Target::Package(path.to_path_buf()));
        }
        if path.is_dir() {
            return Some(Target::Project(path.to_path_buf()));
        }
        None
    }
}

pub fn validate(args: &[String]) -> Vec<String> {
    let Some(arg) = args.first() else {
        return vec!["Args missing".into()];
    };

    match Target::classify(arg) {
        Some(_) => vec![],
        None => vec!["Args missing: GitHubRepo | Path | PersonalAccessToken".into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_args_are_missing() {
        assert_eq!(validate(&[]), vec!["Args missing"]);
    }

    #[test]
    fn unrecognized_arg_is_rejected() {
        assert_eq!(
            validate(&args(&["invalid"])),
            vec!["Args missing: GitHubRepo | Path | PersonalAccessToken"]
        );
    }

    #[test]
    fn accepted_shapes_pass() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("Sample-1.0.0-x64.ZIP");
        std::fs::write(&zip, b"").unwrap();

        for arg in [
            "github_pat_123".to_string(),
            "ghp_123".to_string(),
            "https://github.com/owner/repo".to_string(),
            zip.display().to_string(),
            dir.path().display().to_string(),
        ] {
            assert!(validate(&[arg.clone()]).is_empty(), "{arg}");
        }
    }

    #[test]
    fn classifies_targets() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"").unwrap();

        assert_eq!(
            Target::classify("https://github.com/o/r/"),
            Some(Target::Repository(RepositoryRef {
                owner: "o".into(),
                repo: "r".into()
            }))
        );
        assert_eq!(
            Target::classify(&dir.path().display().to_string()),
            Some(Target::Project(dir.path().to_path_buf()))
        );
        assert_eq!(Target::classify(&text.display().to_string()), None);
        assert_eq!(Target::classify("missing.zip"), None);
    }
}
