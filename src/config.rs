//! Covering configuration.
//!
//! Two coverings are computed from user geometry: a detailed one for the cells
//! that get registered, and a coarse one with a small cell budget used only to
//! find the common ancestor of a viewport.
use crate::error::{CellPackError, Result};
use crate::token::MAX_LEVEL;
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Area budgets above this make ancestor resolution noticeably slower.
const AREA_MAX_CELLS_WARN: usize = 50;

/// Level range and cell budget handed to the covering library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoveringOptions {
    /// Coarsest level allowed (0-30).
    #[serde(default)]
    pub min_level: u8,

    /// Finest level allowed (0-30).
    #[serde(default = "CoveringOptions::default_max_level")]
    pub max_level: u8,

    /// Upper bound on the number of cells returned.
    pub max_cells: usize,
}

impl CoveringOptions {
    const fn default_max_level() -> u8 {
        24
    }

    /// Options used for cells that get registered.
    pub const fn claim() -> Self {
        Self {
            min_level: 0,
            max_level: Self::default_max_level(),
            max_cells: 300,
        }
    }

    /// Options used for viewport ancestor lookups.
    pub const fn area() -> Self {
        Self {
            min_level: 0,
            max_level: Self::default_max_level(),
            max_cells: 10,
        }
    }

    pub fn with_levels(mut self, min_level: u8, max_level: u8) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_level as u64 > MAX_LEVEL {
            return Err(format!(
                "max_level {} exceeds the deepest level {}",
                self.max_level, MAX_LEVEL
            ));
        }

        if self.min_level > self.max_level {
            return Err(format!(
                "min_level {} is greater than max_level {}",
                self.min_level, self.max_level
            ));
        }

        if self.max_cells == 0 {
            return Err("max_cells must be greater than zero".to_string());
        }

        Ok(())
    }
}

/// Crate configuration
///
/// # Example
///
/// ```rust
/// use cellpack::Config;
///
/// let config = Config::default();
/// assert_eq!(config.claim.max_cells, 300);
///
/// let json = r#"{ "area": { "max_cells": 8 } }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.area.max_cells, 8);
/// assert_eq!(config.area.max_level, 24);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Covering used when registering a claim.
    #[serde(default = "CoveringOptions::claim")]
    pub claim: CoveringOptions,

    /// Covering used to resolve a viewport's common ancestor.
    #[serde(default = "CoveringOptions::area")]
    pub area: CoveringOptions,
}

impl Config {
    pub fn with_claim(mut self, options: CoveringOptions) -> Self {
        self.claim = options;
        self
    }

    pub fn with_area(mut self, options: CoveringOptions) -> Self {
        self.area = options;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.claim
            .validate()
            .map_err(|e| format!("claim covering: {}", e))?;
        self.area
            .validate()
            .map_err(|e| format!("area covering: {}", e))?;

        if self.area.max_cells > AREA_MAX_CELLS_WARN {
            log::warn!(
                "Area covering budget of {} cells is large; ancestor lookups scan every cell \
                once per level",
                self.area.max_cells
            );
        }

        Ok(())
    }

    /// Validate, mapping failures to [`CellPackError::Config`].
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(CellPackError::Config)
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            claim: CoveringOptions::claim(),
            area: CoveringOptions::area(),
        }
    }
}
