use std::io;
use thiserror::Error;

/// Errors that can occur while loading or parsing a packaging manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Invalid version specifier '{0}'")]
    InvalidSpecifier(String),

    #[error("Invalid environment marker '{0}': {1}")]
    InvalidMarker(String, String),

    #[error("Invalid requirement '{0}': {1}")]
    InvalidRequirement(String, String),
}

/// Errors raised when selecting a dependency set for a concrete environment
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no entry for '{name}' applies to python {python} (partition gap)")]
    PartitionGap { name: String, python: String },

    #[error("{count} entries for '{name}' apply to python {python} (partition overlap)")]
    PartitionOverlap {
        name: String,
        python: String,
        count: usize,
    },

    #[error("dependency entry {index} does not parse: {message}")]
    UnparsedEntry { index: usize, message: String },
}
