/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Engine configuration.
 */

use serde::{Deserialize, Serialize};

use crate::error::{CodeBlockError, Result};

/// Settings shared by every `process()` call of an engine.
///
/// Keys are kebab-case in YAML and JSON; missing keys take their defaults.
///
/// ```yaml
/// default-locale: de-DE
/// group-class: snippet-group
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Locale reported to hooks for blocks that carry none
    pub default_locale: String,
    /// Class on the element wrapping each block group
    pub group_class: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_locale: "en-US".to_string(),
            group_class: "code-group".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| CodeBlockError::Config(e.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CodeBlockError::Config(e.to_string()))
    }
}
