//! Configuration for checking and data layout
//!
//! Loaded from a `quill.toml` next to the module being compiled:
//!
//! ```toml
//! [check]
//! default_int = "i32"
//! default_float = "f64"
//!
//! [layout]
//! base = 0
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::ast::PrimitiveType;

/// File looked up by [`Config::load_or_default`]
pub const CONFIG_FILE: &str = "quill.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("`{key}` must name {expected} type, found `{found}`")]
    InvalidDefault {
        key: &'static str,
        expected: &'static str,
        found: PrimitiveType,
    },
}

/// Widths used when a comptime value reaches a binding with no annotation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    #[serde(deserialize_with = "deserialize_primitive")]
    pub default_int: PrimitiveType,
    #[serde(deserialize_with = "deserialize_primitive")]
    pub default_float: PrimitiveType,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            default_int: PrimitiveType::I32,
            default_float: PrimitiveType::F64,
        }
    }
}

/// Placement settings for the data layout engine
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Lowest address the automatically placed region may start at
    pub base: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub check: CheckConfig,
    pub layout: LayoutConfig,
}

fn deserialize_primitive<'de, D>(deserializer: D) -> Result<PrimitiveType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    PrimitiveType::try_from(name).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Load `quill.toml` from the working directory, falling back to defaults
    pub fn load_or_default() -> Self {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "ignoring {}", CONFIG_FILE);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.check.default_int.is_integer() {
            return Err(ConfigError::InvalidDefault {
                key: "check.default_int",
                expected: "an integer",
                found: self.check.default_int,
            });
        }
        if !self.check.default_float.is_float() {
            return Err(ConfigError::InvalidDefault {
                key: "check.default_float",
                expected: "a float",
                found: self.check.default_float,
            });
        }
        Ok(())
    }
}
