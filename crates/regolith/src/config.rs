//! View configuration.
//!
//! [`ViewConfig`] collects the knobs a host application may want to expose for
//! a sorted table view. All fields have defaults, so a config file only needs
//! to name what it changes:
//!
//! ```toml
//! case_sensitive = false
//! boolean_order = "false_first"
//! ```

use std::path::Path;

use regolith_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::BooleanOrder;

/// Configuration for a [`SortedView`](crate::model::SortedView).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Whether text columns compare case-sensitively.
    pub case_sensitive: bool,
    /// Relative order of `true` and `false` in an ascending boolean sort.
    pub boolean_order: BooleanOrder,
    /// Re-derive the display order when a cell in an active sort column changes.
    pub resort_on_update: bool,
    /// Emit scroll requests after the selection is extended from record changes.
    pub scroll_to_selection: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            boolean_order: BooleanOrder::TrueFirst,
            resort_on_update: false,
            scroll_to_selection: true,
        }
    }
}

impl ViewConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            target: targets::VIEW,
            path = %path.display(),
            ?config,
            "loaded view configuration"
        );
        Ok(config)
    }
}
