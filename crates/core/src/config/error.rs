//! Errors raised while reading `.qsrunner/config.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("Cannot read settings file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Settings file {path} is not valid TOML: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Parsed, but holds a value the tool would reject.
    #[error("Bad value in settings file {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
