//! Router configuration
//!
//! Only the settings that affect component resolution live here. The struct
//! has sensible defaults and can be loaded from TOML:
//!
//! ```toml
//! name-retention = "match-aliases"
//! warn-on-type-mismatch = true
//! ```

use serde::Deserialize;

use crate::error::{Result, RouterError};

/// What happens to an existing name when a component becomes typed
///
/// This rule is provisional; `KeepPrior` matches the historical behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameRetention {
    /// Keep any previously set name
    #[default]
    KeepPrior,
    /// Keep the previous name only if the type answers to it
    MatchAliases,
    /// Always use the type's own name
    Replace,
}

/// Router configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RouterConfig {
    /// Name handling when an instruction component is set to a type or instance
    pub name_retention: NameRetention,
    /// Log a warning when a container returns an instance of an unexpected type
    pub warn_on_type_mismatch: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            name_retention: NameRetention::KeepPrior,
            warn_on_type_mismatch: true,
        }
    }
}

impl RouterConfig {
    /// Parse a configuration from TOML; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| RouterError::Config(e.to_string()))
    }
}
