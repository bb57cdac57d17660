use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::{LintError, Result};
use crate::github::GitHubApi;
use crate::model::{Checksum, Release};
use crate::package::Package;

/// Downloads the assets of a release into a private temporary directory.
///
/// Everything downloaded is deleted when the handler is dropped, whether
/// validation succeeded or not.
pub struct ReleaseHandler {
    dir: TempDir,
}

impl ReleaseHandler {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("ptrun-lint-")
            .tempdir()
            .map_err(|e| LintError::io(std::env::temp_dir(), e))?;
        Ok(Self { dir })
    }

    /// Downloads every zip asset of `release`. Failed downloads are skipped.
    pub async fn packages(
        &self,
        release: Option<&Release>,
        github: &dyn GitHubApi,
    ) -> Result<Vec<Package>> {
        let Some(release) = release else {
            return Ok(Vec::new());
        };

        let mut packages = Vec::new();
        for asset in release.assets().iter().filter(|a| a.is_zip()) {
            let Some(file_name) = Path::new(&asset.name).file_name() else {
                warn!(name = %asset.name, "skipping asset with unusable name");
                continue;
            };
            let Some(bytes) = github.download(&asset.browser_download_url).await else {
                continue;
            };

            let path = self.dir.path().join(file_name);
            fs::write(&path, bytes).map_err(|e| LintError::io(&path, e))?;
            info!(path = %path.display(), "file downloaded");

            packages.push(Package::with_asset(asset.clone(), path));
        }
        Ok(packages)
    }

    /// Downloads and parses the `checksums.txt` asset of `release`, if any.
    pub async fn checksums(
        &self,
        release: Option<&Release>,
        github: &dyn GitHubApi,
    ) -> Vec<Checksum> {
        let Some(asset) = release.and_then(|r| r.assets().iter().find(|a| a.is_checksums_file()))
        else {
            return Vec::new();
        };
        let Some(bytes) = github.download(&asset.browser_download_url).await else {
            return Vec::new();
        };
        Checksum::parse_manifest(&String::from_utf8_lossy(&bytes))
    }
}

impl Drop for ReleaseHandler {
    fn drop(&mut self) {
        info!(path = %self.dir.path().display(), "deleting downloaded files");
    }
}
