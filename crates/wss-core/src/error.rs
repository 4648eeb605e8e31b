//! Error handling for the core crate.
//!
//! Error messages name the failing setting or file but never echo token
//! content.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A configuration value is outside its permitted range.
    #[error("invalid configuration value for `{key}`: {reason}")]
    InvalidValue {
        /// Dotted path of the offending setting.
        key: &'static str,
        /// Why the value was refused.
        reason: String,
    },

    /// Configuration file could not be read.
    #[error("configuration file error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
