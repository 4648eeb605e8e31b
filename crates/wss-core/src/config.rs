//! Configuration management for the token processor.
//!
//! Supports loading configuration from TOML strings and files. Every section
//! and field is optional; missing values fall back to [`Default`].
//!
//! ```toml
//! [xml]
//! max_bytes = 1048576
//! max_nodes = 50000
//!
//! [signature]
//! allow_sha1 = false
//!
//! [timestamp]
//! clock_skew_secs = 300
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure for SAML token processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Limits applied to untrusted XML input.
    pub xml: XmlLimits,
    /// XML signature acceptance policy.
    pub signature: SignaturePolicy,
    /// Settings consumed by the downstream timestamp check.
    pub timestamp: TimestampPolicy,
}

/// Resource limits for parsing untrusted XML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlLimits {
    /// Maximum size of a serialized token in bytes.
    pub max_bytes: usize,
    /// Maximum number of nodes in the parsed token document.
    pub max_nodes: u32,
}

impl Default for XmlLimits {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            max_nodes: 50_000,
        }
    }
}

/// Signature acceptance policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignaturePolicy {
    /// Whether SHA-1 based digests and signatures are accepted.
    ///
    /// Off by default; some legacy identity providers still need it.
    pub allow_sha1: bool,
}

/// Timestamp evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampPolicy {
    /// Tolerated clock difference between issuer and relying party, in seconds.
    pub clock_skew_secs: u64,
}

/// Largest accepted `timestamp.clock_skew_secs`: one day.
pub const MAX_CLOCK_SKEW_SECS: u64 = 24 * 60 * 60;

impl Default for TimestampPolicy {
    fn default() -> Self {
        Self {
            clock_skew_secs: 300,
        }
    }
}

impl TimestampPolicy {
    /// Returns the clock skew as a duration.
    #[must_use]
    pub fn clock_skew(&self) -> chrono::Duration {
        let secs = i64::try_from(self.clock_skew_secs).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }
}

impl ProcessorConfig {
    /// Parses configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or a value is out of
    /// range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded token processor configuration");
        Ok(config)
    }

    /// Checks that all limits are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.xml.max_bytes == 0 {
            return Err(Error::InvalidValue {
                key: "xml.max_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.xml.max_nodes == 0 {
            return Err(Error::InvalidValue {
                key: "xml.max_nodes",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.timestamp.clock_skew_secs > MAX_CLOCK_SKEW_SECS {
            return Err(Error::InvalidValue {
                key: "timestamp.clock_skew_secs",
                reason: format!("must not exceed {MAX_CLOCK_SKEW_SECS}"),
            });
        }
        Ok(())
    }
}
