use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{LintError, Result};
use crate::model::Metadata;
use crate::package::METADATA_FILE_NAME;

static ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(AssemblyName|TargetFrameworks?)>\s*([^<]*?)\s*</")
        .expect("element pattern is valid")
});

static PACKAGE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<PackageReference\b([^>]*)>").expect("package reference pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s*=\s*"([^"]*)""#).expect("attribute pattern is valid")
});

static PLUGIN_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"static\s+string\s+PluginID\s*(?:=>|\{[^}]*\}\s*=)\s*"([^"]*)""#)
        .expect("PluginID pattern is valid")
});

/// A `<PackageReference>` of the project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    pub name: String,
    pub version: String,
}

/// The facts read from the top-level `*.csproj`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFile {
    pub path: PathBuf,
    /// `<AssemblyName>`, or the project file stem.
    pub assembly_name: String,
    pub target_framework: Option<String>,
    pub package_references: Vec<PackageReference>,
}

impl ProjectFile {
    pub fn parse(path: &Path, content: &str) -> Self {
        let mut assembly_name = None;
        let mut target_framework = None;
        for captures in ELEMENT.captures_iter(content) {
            let value = captures[2].to_string();
            match &captures[1] {
                "AssemblyName" => assembly_name = assembly_name.or(Some(value)),
                _ => target_framework = target_framework.or(Some(value)),
            }
        }

        let package_references = PACKAGE_REFERENCE
            .captures_iter(content)
            .filter_map(|captures| {
                let mut name = None;
                let mut version = String::new();
                for attr in ATTRIBUTE.captures_iter(&captures[1]) {
                    match &attr[1] {
                        "Include" => name = Some(attr[2].to_string()),
                        "Version" => version = attr[2].to_string(),
                        _ => {}
                    }
                }
                name.map(|name| PackageReference { name, version })
            })
            .collect();

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            assembly_name: assembly_name.unwrap_or(stem),
            target_framework,
            package_references,
        }
    }
}

/// A plugin source directory.
#[derive(Debug)]
pub struct Project {
    dir: PathBuf,
    top_level_files: Vec<String>,
    /// Files below the directory (outside `bin` and `obj`), relative,
    /// `/`-separated.
    files: Vec<String>,
    metadata: Option<Metadata>,
    project_file: Option<ProjectFile>,
    plugin_id: Option<String>,
}

impl Project {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            top_level_files: Vec::new(),
            files: Vec::new(),
            metadata: None,
            project_file: None,
            plugin_id: None,
        }
    }

    /// Reads `plugin.json`, the project file and the C# sources.
    pub fn load(&mut self) -> Result<()> {
        let mut top_level = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| LintError::io(&self.dir, e))? {
            let entry = entry.map_err(|e| LintError::io(&self.dir, e))?;
            if entry.path().is_file() {
                top_level.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        top_level.sort();
        self.top_level_files = top_level;

        let mut files = Vec::new();
        collect_files(&self.dir, "", &mut files)?;
        files.sort();
        self.files = files;

        if self.top_level_files.iter().any(|f| f == METADATA_FILE_NAME) {
            let path = self.dir.join(METADATA_FILE_NAME);
            let bytes = fs::read(&path).map_err(|e| LintError::io(&path, e))?;
            self.metadata = Some(Metadata::parse(METADATA_FILE_NAME, &bytes)?);
        }

        if let Some(name) = self.top_level_files.iter().find(|f| f.ends_with(".csproj")) {
            let path = self.dir.join(name);
            let content = fs::read_to_string(&path).map_err(|e| LintError::io(&path, e))?;
            self.project_file = Some(ProjectFile::parse(&path, &content));
        }

        self.plugin_id = self.find_plugin_id()?;

        info!(project = %self.dir.display(), files = self.files.len(), "project loaded");
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn top_level_files(&self) -> &[String] {
        &self.top_level_files
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn project_file(&self) -> Option<&ProjectFile> {
        self.project_file.as_ref()
    }

    /// Literal of `static string PluginID` in the class implementing `IPlugin`.
    pub fn plugin_id(&self) -> Option<&str> {
        self.plugin_id.as_deref()
    }

    /// Whether a file outside `bin` and `obj` ends with `path`.
    pub fn contains_path_suffix(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        let suffix = path.replace('\\', "/");
        self.files.iter().any(|file| file.ends_with(&suffix))
    }

    fn find_plugin_id(&self) -> Result<Option<String>> {
        for file in self.files.iter().filter(|f| f.ends_with(".cs")) {
            let path = self.dir.join(file);
            let source = fs::read_to_string(&path).map_err(|e| LintError::io(&path, e))?;
            if !source.contains("IPlugin") {
                continue;
            }
            if let Some(captures) = PLUGIN_ID.captures(&source) {
                debug!(%file, "found PluginID");
                return Ok(Some(captures[1].to_string()));
            }
        }
        Ok(None)
    }
}

fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir).map_err(|e| LintError::io(dir, e))? {
        let entry = entry.map_err(|e| LintError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        let file_type = entry.file_type().map_err(|e| LintError::io(entry.path(), e))?;
        if file_type.is_dir() {
            if name.eq_ignore_ascii_case("bin") || name.eq_ignore_ascii_case("obj") {
                continue;
            }
            collect_files(&entry.path(), &relative, out)?;
        } else if file_type.is_file() {
            out.push(relative);
        }
    }
    Ok(())
}
