use crate::package::Package;

/// `TargetFrameworkAttribute` value of a .NET 9 build.
pub const TARGET_FRAMEWORK: &str = ".NETCoreApp,Version=v9.0";

pub const TARGET_FRAMEWORK_MESSAGE: &str = "Target framework should be \"net9.0\"";
pub const TARGET_PLATFORM_MESSAGE: &str = "Target platform should be \"windows\"";
pub const PLUGIN_ID_MESSAGE: &str = "Main.PluginID does not match metadata (plugin.json) ID";

pub fn validate(package: &Package) -> Vec<String> {
    let Some(binary) = package.binary() else {
        return vec!["Assembly could not be validated".into()];
    };

    let mut messages = Vec::new();
    if binary.target_framework.as_deref() != Some(TARGET_FRAMEWORK) {
        messages.push(TARGET_FRAMEWORK_MESSAGE.into());
    }
    if !binary
        .target_platform
        .as_deref()
        .is_some_and(|p| p.starts_with("Windows"))
    {
        messages.push(TARGET_PLATFORM_MESSAGE.into());
    }
    let metadata_id = package.metadata().map(|m| m.id.as_str());
    if binary.plugin_id.as_deref() != metadata_id {
        messages.push(PLUGIN_ID_MESSAGE.into());
    }
    messages
}
