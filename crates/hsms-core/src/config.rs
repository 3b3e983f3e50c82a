//! TOML-based defaults for message builders.
//!
//! A connection usually talks to one device and wants the same device
//! address, wait-bit policy and context numbering for every message it
//! builds.  [`MessageDefaults`] holds those settings:
//!
//! ```toml
//! [builder]
//! device = 1
//! reply_expected = true
//! description = "tool-07"
//!
//! [context]
//! start = 1000
//! ```
//!
//! Every field falls back to its default when absent, so an empty file (or
//! no file at all) is a valid configuration.  Numeric values are checked
//! with the same range rules the builder applies.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::message::validation::{uint_in_range, ushort_in_range, Field};
use crate::message::{ContextCounter, DataMessageBuilder, MessageError};

/// Error type for loading and storing message defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The defaults could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is out of range for its field.
    #[error("invalid config value: {0}")]
    Invalid(#[from] MessageError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level defaults document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageDefaults {
    #[serde(default)]
    pub builder: BuilderDefaults,
    #[serde(default)]
    pub context: ContextDefaults,
}

/// Field values every new builder starts from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuilderDefaults {
    /// Device address, 0..=65535.
    #[serde(default)]
    pub device: i64,
    /// Whether built messages set the wait bit.
    #[serde(default = "default_true")]
    pub reply_expected: bool,
    /// Diagnostic label.
    #[serde(default)]
    pub description: String,
}

/// Context numbering for a connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextDefaults {
    /// First generated context, 0..=u32::MAX; 0 is treated as 1.
    #[serde(default = "default_context_start")]
    pub start: i64,
}

fn default_true() -> bool {
    true
}
fn default_context_start() -> i64 {
    1
}

impl Default for BuilderDefaults {
    fn default() -> Self {
        Self {
            device: 0,
            reply_expected: default_true(),
            description: String::new(),
        }
    }
}

impl Default for ContextDefaults {
    fn default() -> Self {
        Self {
            start: default_context_start(),
        }
    }
}

impl MessageDefaults {
    /// Parses and validates defaults from TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML and [`ConfigError::Invalid`]
    /// for out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let defaults: MessageDefaults = toml::from_str(content)?;
        defaults.validate()?;
        Ok(defaults)
    }

    /// Loads defaults from `path`, returning `MessageDefaults::default()` if
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] for file-system errors other than "not found",
    /// plus every error of [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let defaults = Self::from_toml_str(&content)?;
                debug!(path = %path.display(), "loaded message defaults");
                Ok(defaults)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no defaults file; using built-in defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Serializes the defaults as pretty-printed TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every numeric field against its range.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ushort_in_range(self.builder.device, Field::Device)?;
        uint_in_range(self.context.start, Field::Context)?;
        Ok(())
    }

    /// Creates a counter that starts at `context.start`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if `context.start` is out of range.
    pub fn context_counter(&self) -> Result<ContextCounter, ConfigError> {
        let start = uint_in_range(self.context.start, Field::Context)?;
        Ok(ContextCounter::starting_at(start))
    }

    /// Creates a builder seeded with these defaults that draws generated
    /// contexts from `contexts`.
    ///
    /// A later `stream_function` call sets the wait bit from its own marker.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if `builder.device` is out of range.
    pub fn builder(&self, contexts: Arc<ContextCounter>) -> Result<DataMessageBuilder, ConfigError> {
        let mut builder = DataMessageBuilder::with_contexts(contexts);
        builder
            .device(self.builder.device)?
            .reply_expected(self.builder.reply_expected)
            .description(self.builder.description.as_str());
        Ok(builder)
    }
}
