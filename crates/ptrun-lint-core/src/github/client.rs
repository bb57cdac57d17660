use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::LintConfig;
use crate::error::Result;
use crate::github::{GitHubApi, RepositoryRef};
use crate::model::{Readme, Release, Repository, User};

/// GitHub REST client.
///
/// Requests are anonymous unless the config carries a personal access token.
pub struct GitHubClient {
    api_url: String,
    client: Client,
    downloads: Client,
}

impl GitHubClient {
    pub fn new(config: &LintConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = config.personal_access_token.as_deref() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => warn!("personal access token is not a valid header value, ignoring it"),
            }
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;
        let downloads = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.download_timeout)
            .build()?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            client,
            downloads,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let url = format!("{}{path}", self.api_url);
        debug!(%url, "GitHub request");

        let result = async {
            self.client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json::<T>()
                .await
        }
        .await;

        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%url, error = %err, "GitHub request failed");
                None
            }
        }
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get_user(&self, owner: &str) -> Option<User> {
        self.get_json(&format!("/users/{owner}")).await
    }

    async fn get_repository(&self, repo: &RepositoryRef) -> Option<Repository> {
        self.get_json(&format!("/repos/{repo}")).await
    }

    async fn get_readme(&self, repo: &RepositoryRef) -> Option<Readme> {
        self.get_json(&format!("/repos/{repo}/readme")).await
    }

    async fn get_latest_release(&self, repo: &RepositoryRef) -> Option<Release> {
        self.get_json(&format!("/repos/{repo}/releases/latest"))
            .await
    }

    async fn download(&self, url: &str) -> Option<Vec<u8>> {
        let result = async {
            self.downloads
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await
        }
        .await;

        match result {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(err) => {
                warn!(%url, error = %err, "download failed");
                None
            }
        }
    }
}
