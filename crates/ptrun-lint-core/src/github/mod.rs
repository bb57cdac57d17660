//! GitHub collaborator: the lookups the linter consumes, and their
//! reqwest-backed implementation.

use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::model::{Readme, Release, Repository, User};

mod client;

pub use client::GitHubClient;

static GITHUB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([A-Za-z0-9._-]+)/([A-Za-z0-9._-]+)/?(\?.*|#.*)?$")
        .expect("GitHub URL pattern is valid")
});

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

impl RepositoryRef {
    /// Parses `https://github.com/<owner>/<repo>`, ignoring a trailing slash,
    /// query or fragment. Anything else is `None`.
    pub fn parse(url: &str) -> Option<Self> {
        let captures = GITHUB_URL.captures(url)?;
        Some(Self {
            owner: captures[1].to_string(),
            repo: captures[2].to_string(),
        })
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Whether `arg` has the shape of a GitHub personal access token.
pub fn is_personal_access_token(arg: &str) -> bool {
    arg.starts_with("github_pat_") || arg.starts_with("ghp_")
}

/// Read-only GitHub lookups.
///
/// Every failure (transport, status, payload) is reported as `None`; a
/// missing artifact is a lint finding, never a fatal error.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn get_user(&self, owner: &str) -> Option<User>;

    async fn get_repository(&self, repo: &RepositoryRef) -> Option<Repository>;

    async fn get_readme(&self, repo: &RepositoryRef) -> Option<Readme>;

    async fn get_latest_release(&self, repo: &RepositoryRef) -> Option<Release>;

    /// Downloads a release asset.
    async fn download(&self, url: &str) -> Option<Vec<u8>>;
}

#[async_trait]
impl<T: GitHubApi + ?Sized> GitHubApi for &T {
    async fn get_user(&self, owner: &str) -> Option<User> {
        (**self).get_user(owner).await
    }

    async fn get_repository(&self, repo: &RepositoryRef) -> Option<Repository> {
        (**self).get_repository(repo).await
    }

    async fn get_readme(&self, repo: &RepositoryRef) -> Option<Readme> {
        (**self).get_readme(repo).await
    }

    async fn get_latest_release(&self, repo: &RepositoryRef) -> Option<Release> {
        (**self).get_latest_release(repo).await
    }

    async fn download(&self, url: &str) -> Option<Vec<u8>> {
        (**self).download(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repository_urls() {
        let expected = RepositoryRef {
            owner: "hlaueriksson".into(),
            repo: "GEmojiSharp".into(),
        };
        for url in [
            "https://github.com/hlaueriksson/GEmojiSharp",
            "https://github.com/hlaueriksson/GEmojiSharp/",
            "https://github.com/hlaueriksson/GEmojiSharp?tab=readme",
            "https://github.com/hlaueriksson/GEmojiSharp#usage",
        ] {
            assert_eq!(RepositoryRef::parse(url).as_ref(), Some(&expected), "{url}");
        }
        assert_eq!(expected.to_string(), "hlaueriksson/GEmojiSharp");
    }

    #[test]
    fn rejects_other_urls() {
        for url in [
            "",
            "invalid",
            "http://github.com/owner/repo",
            "https://gitlab.com/owner/repo",
            "https://github.com/owner",
            "https://github.com/owner/repo/tree/main",
        ] {
            assert!(RepositoryRef::parse(url).is_none(), "{url}");
        }
    }

    #[test]
    fn recognizes_token_shapes() {
        assert!(is_personal_access_token("github_pat_11ABC"));
        assert!(is_personal_access_token("ghp_abc"));
        assert!(!is_personal_access_token("gho_abc"));
        assert!(!is_personal_access_token("https://github.com/a/b"));
    }
}
