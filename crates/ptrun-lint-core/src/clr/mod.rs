//! Reader for compiled plugin binaries (ECMA-335 CLI assemblies).
//!
//! Only the facts the assembly rule needs are extracted; nothing is loaded
//! or executed:
//! - the `TargetFramework` and `TargetPlatform` assembly attributes
//! - the literal returned by `PluginID` on the class implementing `IPlugin`
//!
//! The rule layer consumes the plain [`BinaryMetadata`] value and never sees
//! raw format details.

use thiserror::Error;

mod bytes;
mod extract;
mod heaps;
mod pe;
mod scan;
mod tables;

/// Facts extracted from a plugin assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryMetadata {
    /// First argument of `TargetFrameworkAttribute`, e.g. `.NETCoreApp,Version=v9.0`.
    pub target_framework: Option<String>,

    /// First argument of `TargetPlatformAttribute`, e.g. `Windows7.0`.
    pub target_platform: Option<String>,

    /// First non-empty string literal loaded by the static `PluginID` getter.
    pub plugin_id: Option<String>,
}

/// Structural problem in an assembly image.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ImageError(String);

impl ImageError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub(crate) fn truncated(offset: usize, len: usize) -> Self {
        Self(format!(
            "image truncated: {len} byte(s) at offset {offset:#x} out of range"
        ))
    }
}

pub type ImageResult<T> = std::result::Result<T, ImageError>;

/// Parses a CLI assembly image and extracts [`BinaryMetadata`].
///
/// Missing attributes or a missing `PluginID` are not errors; they leave the
/// corresponding field `None`. Anything that is not a well-formed CLI image
/// (wrong signatures, truncated headers, dangling indices) is.
pub fn parse_assembly(bytes: &[u8]) -> ImageResult<BinaryMetadata> {
    let assembly = extract::Assembly::parse(bytes)?;
    Ok(BinaryMetadata {
        target_framework: assembly.attribute(VERSIONING, "TargetFrameworkAttribute")?,
        target_platform: assembly.attribute(VERSIONING, "TargetPlatformAttribute")?,
        plugin_id: assembly.plugin_id()?,
    })
}

const VERSIONING: &str = "System.Runtime.Versioning";
