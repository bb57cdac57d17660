//! Project directory rules: content (2001) and build settings (2301).

use crate::package::METADATA_FILE_NAME;
use crate::project::Project;
use crate::rules::assembly::{PLUGIN_ID_MESSAGE, TARGET_FRAMEWORK_MESSAGE, TARGET_PLATFORM_MESSAGE};

const MISSING_PROJECT: &str = "Project missing";

pub fn validate_content(project: &Project) -> Vec<String> {
    if !project.dir().is_dir() {
        return vec![MISSING_PROJECT.into()];
    }
    if !project.top_level_files().iter().any(|f| f == METADATA_FILE_NAME) {
        return vec![format!("Metadata \"{METADATA_FILE_NAME}\" missing")];
    }
    vec![]
}

pub fn validate(project: &Project) -> Vec<String> {
    let Some(project_file) = project.project_file() else {
        return vec![MISSING_PROJECT.into()];
    };

    let framework = project_file
        .target_framework
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut messages = Vec::new();
    if !framework.starts_with("net9.0") {
        messages.push(TARGET_FRAMEWORK_MESSAGE.into());
    }
    if !framework.contains("windows") {
        messages.push(TARGET_PLATFORM_MESSAGE.into());
    }
    let metadata_id = project.metadata().map(|m| m.id.as_str());
    if project.plugin_id() != metadata_id {
        messages.push(PLUGIN_ID_MESSAGE.into());
    }
    messages
}
