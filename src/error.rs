use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[cfg(feature = "toml_config")]
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Unsupported config file format. Use .json or .toml")]
    UnsupportedFormat,
    #[error("TOML support is not enabled. Enable the 'toml_config' feature to use TOML configs.")]
    TomlNotEnabled,
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),
    #[error("Policy content not found on page")]
    ContentNotFound,
}

/// Error type page sources report fetch failures with.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single policy document could not be saved.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("fetch failed: {0}")]
    Fetch(#[source] SourceError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}
