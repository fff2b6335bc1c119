//! Descriptor configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::filter::MemberFilter;

/// How a save reaches the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Create or truncate the file and encode straight into it.
    #[default]
    Truncate,
    /// Encode into a temp file next to the target, then rename it over.
    Atomic,
}

/// Serializable part of a descriptor.
///
/// The handler, marker, and format adapter are code, so they are supplied
/// when the descriptor is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorConfig {
    /// Settings file path, before the format adapter realizes it.
    pub path: PathBuf,

    /// Which members discovery may see.
    #[serde(default)]
    pub filter: MemberFilter,

    /// Whether properties take part alongside fields.
    #[serde(default)]
    pub include_properties: bool,

    #[serde(default)]
    pub write_mode: WriteMode,
}

impl DescriptorConfig {
    /// Configuration with defaults for everything but the path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filter: MemberFilter::default(),
            include_properties: false,
            write_mode: WriteMode::default(),
        }
    }
}
