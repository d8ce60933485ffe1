//! Database configuration via `crumb.toml`
//!
//! On first open, a default `crumb.toml` is created in the data directory.
//! To change settings, edit the file and reopen.

use crumb_core::{Error, Result};
use crumb_storage::{get_codec, RecordFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "crumb.toml";

/// Database configuration loaded from `crumb.toml`.
///
/// # Example
///
/// ```toml
/// max_documents_per_chunk = 1000
/// format = "msgpack"
/// codec = "identity"
/// default_max_results = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrumbConfig {
    /// Documents per chunk before a new chunk is allocated.
    #[serde(default = "default_max_documents_per_chunk")]
    pub max_documents_per_chunk: usize,
    /// Record serialization format: `"msgpack"` or `"json"`.
    #[serde(default = "default_format")]
    pub format: String,
    /// Byte codec applied to every record.
    #[serde(default = "default_codec")]
    pub codec: String,
    /// `max_results` for selects that do not specify one.
    #[serde(default = "default_max_results")]
    pub default_max_results: i64,
}

fn default_max_documents_per_chunk() -> usize {
    1000
}

fn default_format() -> String {
    "msgpack".to_string()
}

fn default_codec() -> String {
    "identity".to_string()
}

fn default_max_results() -> i64 {
    100
}

impl Default for CrumbConfig {
    fn default() -> Self {
        Self {
            max_documents_per_chunk: default_max_documents_per_chunk(),
            format: default_format(),
            codec: default_codec(),
            default_max_results: default_max_results(),
        }
    }
}

impl CrumbConfig {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a zero chunk size, an unknown format or
    /// an unknown codec.
    pub fn validate(&self) -> Result<()> {
        if self.max_documents_per_chunk == 0 {
            return Err(Error::Config {
                reason: "max_documents_per_chunk must be greater than 0".to_string(),
            });
        }
        self.record_format()?;
        get_codec(&self.codec)?;
        Ok(())
    }

    /// Parse the format string.
    pub fn record_format(&self) -> Result<RecordFormat> {
        Ok(RecordFormat::from_name(&self.format)?)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Crumb database configuration
#
# Documents stored per chunk file before a new chunk is allocated.
max_documents_per_chunk = 1000

# Record serialization format: "msgpack" (default) or "json"
format = "msgpack"

# Byte codec applied to every record on disk
codec = "identity"

# Result cap for selects that don't pass max_results (negative disables it)
default_max_results = 100
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            reason: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;
        let config: CrumbConfig = toml::from_str(&content).map_err(|e| Error::Config {
            reason: format!("Failed to parse config file '{}': {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
