//! # Node Configuration
//!
//! Loaded from an optional YAML file, then overridden from the environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `TYPEPROOF_ATTESTER_TREE_DEPTH` | `attester_tree_depth` | 10 |
//! | `TYPEPROOF_PUBLIC_TREE_DEPTH` | `public_tree_depth` | 20 |
//! | `TYPEPROOF_VERIFICATION_KEY_ID` | `verification_key_id` | `type-proof-v1` |
//! | `TYPEPROOF_TRUST_NONCE` | `trust_nonce` | 0 |
//! | `TYPEPROOF_LOG_FORMAT` | `log_format` | `text` |
//!
//! Depths outside `1..=32` are rejected at load time, not when the trees are
//! opened.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typeproof_core::ErrorKind;
use typeproof_crypto::MAX_DEPTH;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Return the string value for serialization and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: "log_format",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`ProtocolConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A field or override has an unusable value.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// The tracing subscriber could not be installed.
    #[error("telemetry init failed: {0}")]
    Telemetry(String),
}

impl ConfigError {
    /// File and subscriber failures are internal; bad values are validation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::Telemetry(_) => ErrorKind::Internal,
            Self::Parse(_) | Self::InvalidValue { .. } => ErrorKind::Validation,
        }
    }
}

/// Node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Depth of the attester tree.
    pub attester_tree_depth: u32,
    /// Depth of the public attestation tree.
    pub public_tree_depth: u32,
    /// Id of the verification key proofs are checked against.
    pub verification_key_id: String,
    /// Nonce mixed into every trust hash.
    pub trust_nonce: u64,
    /// Tracing output format.
    pub log_format: LogFormat,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            attester_tree_depth: 10,
            public_tree_depth: 20,
            verification_key_id: "type-proof-v1".to_string(),
            trust_nonce: 0,
            log_format: LogFormat::Text,
        }
    }
}

impl ProtocolConfig {
    /// Parse YAML. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// File (or defaults when `path` is `None`), then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        let config = base.with_overrides(|var| std::env::var(var).ok())?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Apply `TYPEPROOF_*` overrides from `lookup`, then validate.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("TYPEPROOF_ATTESTER_TREE_DEPTH") {
            self.attester_tree_depth = parse_number("attester_tree_depth", &v)?;
        }
        if let Some(v) = lookup("TYPEPROOF_PUBLIC_TREE_DEPTH") {
            self.public_tree_depth = parse_number("public_tree_depth", &v)?;
        }
        if let Some(v) = lookup("TYPEPROOF_VERIFICATION_KEY_ID") {
            self.verification_key_id = v;
        }
        if let Some(v) = lookup("TYPEPROOF_TRUST_NONCE") {
            self.trust_nonce = parse_number("trust_nonce", &v)?;
        }
        if let Some(v) = lookup("TYPEPROOF_LOG_FORMAT") {
            self.log_format = v.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_depth("attester_tree_depth", self.attester_tree_depth)?;
        check_depth("public_tree_depth", self.public_tree_depth)?;
        if self.verification_key_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "verification_key_id",
                value: self.verification_key_id.clone(),
            });
        }
        Ok(())
    }
}

fn check_depth(field: &'static str, depth: u32) -> Result<(), ConfigError> {
    if depth == 0 || depth > MAX_DEPTH {
        return Err(ConfigError::InvalidValue {
            field,
            value: depth.to_string(),
        });
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}
