use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::clr::{self, BinaryMetadata};
use crate::error::{LintError, Result};
use crate::model::{Asset, Metadata};

pub const METADATA_FILE_NAME: &str = "plugin.json";

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_ENTRY_PREALLOC: usize = 16 * 1024 * 1024;

/// A plugin package: a zip archive under validation.
///
/// Lifecycle: construct with a path (and optionally the release asset it was
/// downloaded from), [`load`](Self::load) it, run the package rules, then
/// [`dispose`](Self::dispose). A package that was never loaded, or whose
/// load failed, is safe to dispose and drop.
#[derive(Debug)]
pub struct Package {
    path: PathBuf,
    asset: Option<Asset>,

    /// Open handle to the archive file, present between load and dispose.
    file: Option<File>,

    /// Full names of all archive entries, in central directory order.
    entries: Vec<String>,

    metadata: Option<Metadata>,
    binary: Option<BinaryMetadata>,
}

impl Package {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            asset: None,
            file: None,
            entries: Vec::new(),
            metadata: None,
            binary: None,
        }
    }

    pub fn with_asset(asset: Asset, path: impl Into<PathBuf>) -> Self {
        Self {
            asset: Some(asset),
            ..Self::new(path)
        }
    }

    /// Opens the archive, lists its entries and eagerly parses `plugin.json`
    /// and the assembly it names.
    ///
    /// Absent entries are not errors. A corrupt archive, malformed
    /// `plugin.json` or a binary that is not a CLI assembly is fatal.
    pub fn load(&mut self) -> Result<()> {
        let file = File::open(&self.path).map_err(|e| LintError::io(&self.path, e))?;

        {
            let mut archive = ZipArchive::new(&file).map_err(|source| LintError::Zip {
                path: self.path.clone(),
                source,
            })?;

            let mut entries = Vec::with_capacity(archive.len());
            for i in 0..archive.len() {
                let entry = archive.by_index(i).map_err(|source| LintError::Zip {
                    path: self.path.clone(),
                    source,
                })?;
                entries.push(entry.name().to_string());
            }
            self.entries = entries;

            self.metadata = match self.find_entry(METADATA_FILE_NAME) {
                Some(entry) => {
                    let bytes = self.read_entry(&mut archive, &entry)?;
                    Some(Metadata::parse(&entry, &bytes)?)
                }
                None => None,
            };

            let executable = self
                .metadata
                .as_ref()
                .map(|m| m.execute_file_name.clone())
                .filter(|name| !name.is_empty())
                .and_then(|name| self.find_entry(&name));

            self.binary = match executable {
                Some(entry) => {
                    let bytes = self.read_entry(&mut archive, &entry)?;
                    let binary = clr::parse_assembly(&bytes).map_err(|e| {
                        LintError::BadImageFormat {
                            entry: entry.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    debug!(%entry, ?binary, "parsed plugin assembly");
                    Some(binary)
                }
                None => None,
            };
        }

        self.file = Some(file);
        info!(package = %self.path.display(), entries = self.entries.len(), "package loaded");
        Ok(())
    }

    /// Releases the file handle and archive listing.
    pub fn dispose(&mut self) {
        if self.file.take().is_some() {
            debug!(package = %self.path.display(), "package disposed");
        }
        self.entries.clear();
    }

    pub fn is_loaded(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    /// The package file name on disk.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// Display name: the release asset name when known, else the file name.
    pub fn name(&self) -> &str {
        match &self.asset {
            Some(asset) if !asset.name.is_empty() => &asset.name,
            _ => self.file_name(),
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn binary(&self) -> Option<&BinaryMetadata> {
        self.binary.as_ref()
    }

    /// Base names of all entries (the part after the last separator).
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| base_name(entry))
    }

    /// Distinct first path segments of all entries, in first-seen order.
    pub fn root_folders(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.entries
            .iter()
            .map(|entry| root_segment(entry))
            .filter(|root| seen.insert(*root))
            .collect()
    }

    /// The single top-level folder every entry lives under.
    ///
    /// `None` when entries have more than one root, or when the only root
    /// is a plain file rather than a folder.
    pub fn plugin_folder(&self) -> Option<&str> {
        match self.root_folders().as_slice() {
            [root] if self.entries.iter().any(|e| e.len() > root.len()) => Some(*root),
            _ => None,
        }
    }

    /// Whether any entry ends with `path`, with `\` and `/` treated alike.
    pub fn contains_path_suffix(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        let suffix = normalize_path(path);
        self.entries
            .iter()
            .any(|entry| normalize_path(entry).ends_with(&suffix))
    }

    /// Uppercase hex SHA-256 of the whole package file, or `None` when the
    /// package is not loaded.
    ///
    /// The shared file handle is rewound first, so repeated calls agree.
    pub fn sha256(&self) -> Result<Option<String>> {
        let Some(mut file) = self.file.as_ref() else {
            return Ok(None);
        };

        file.seek(SeekFrom::Start(0))
            .map_err(|e| LintError::io(&self.path, e))?;

        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).map_err(|e| LintError::io(&self.path, e))?;

        Ok(Some(hex::encode_upper(hasher.finalize())))
    }

    fn find_entry(&self, file_name: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|entry| base_name(entry) == file_name)
            .cloned()
    }

    fn read_entry(&self, archive: &mut ZipArchive<&File>, name: &str) -> Result<Vec<u8>> {
        let mut entry = archive.by_name(name).map_err(|source| LintError::Zip {
            path: self.path.clone(),
            source,
        })?;
        let mut bytes = Vec::with_capacity(preallocation(entry.size()));
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| LintError::io(self.path.join(name), e))?;
        Ok(bytes)
    }
}

/// Zip headers declare sizes the archive may not honour.
fn preallocation(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_ENTRY_PREALLOC, |size| size.min(MAX_ENTRY_PREALLOC))
}

fn base_name(entry: &str) -> &str {
    entry.rsplit(['/', '\\']).next().unwrap_or(entry)
}

fn root_segment(entry: &str) -> &str {
    entry.split(['/', '\\']).next().unwrap_or(entry)
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_entries(entries: &[&str]) -> Package {
        let mut package = Package::new("Sample-1.0.0-x64.zip");
        package.entries = entries.iter().map(|e| e.to_string()).collect();
        package
    }

    #[test]
    fn name_prefers_asset_name() {
        let asset = Asset {
            name: "Sample-1.0.0-arm64.zip".into(),
            ..Default::default()
        };
        let package = Package::with_asset(asset, "/tmp/download/other.zip");
        assert_eq!(package.name(), "Sample-1.0.0-arm64.zip");
        assert_eq!(package.file_name(), "other.zip");
        assert_eq!(Package::new("/tmp/a/Local.zip").name(), "Local.zip");
    }

    #[test]
    fn single_nested_root_is_the_plugin_folder() {
        let package = with_entries(&["Sample/", "Sample/plugin.json", "Sample/Images\\dark.png"]);
        assert_eq!(package.root_folders(), vec!["Sample"]);
        assert_eq!(package.plugin_folder(), Some("Sample"));
    }

    #[test]
    fn flat_or_split_archives_have_no_plugin_folder() {
        assert_eq!(with_entries(&["plugin.json"]).plugin_folder(), None);
        assert_eq!(with_entries(&["plugin.json", "a.dll"]).plugin_folder(), None);
        assert_eq!(with_entries(&["A/plugin.json", "B/a.dll"]).plugin_folder(), None);
        assert_eq!(with_entries(&[]).plugin_folder(), None);
    }

    #[test]
    fn path_suffix_ignores_separator_style() {
        let package = with_entries(&["Sample/Images/icon.dark.png"]);
        assert!(package.contains_path_suffix("Images\\icon.dark.png"));
        assert!(package.contains_path_suffix("icon.dark.png"));
        assert!(!package.contains_path_suffix("icon.light.png"));
        assert!(!package.contains_path_suffix(""));
    }

    #[test]
    fn file_names_are_base_names() {
        let package = with_entries(&["Sample/", "Sample/Wox.Plugin.dll"]);
        let names: Vec<_> = package.file_names().collect();
        assert_eq!(names, vec!["", "Wox.Plugin.dll"]);
    }

    #[test]
    fn declared_entry_size_is_capped() {
        assert_eq!(preallocation(512), 512);
        assert_eq!(preallocation(u64::from(u32::MAX)), MAX_ENTRY_PREALLOC);
        assert_eq!(preallocation(u64::MAX), MAX_ENTRY_PREALLOC);
    }

    #[test]
    fn unloaded_package_has_no_hash() {
        let package = Package::new("missing.zip");
        assert!(!package.is_loaded());
        assert_eq!(package.sha256().unwrap(), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut package = Package::new("definitely/not/here.zip");
        let err = package.load().unwrap_err();
        assert!(matches!(err, LintError::Io { .. }));
        package.dispose();
    }

    #[test]
    fn non_zip_file_is_a_zip_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Broken-1.0.0-x64.zip");
        std::fs::write(&path, b"not a zip").unwrap();

        let mut package = Package::new(&path);
        let err = package.load().unwrap_err();
        assert!(matches!(err, LintError::Zip { .. }));
        assert_eq!(err.exit_code(), 65);
    }
}
