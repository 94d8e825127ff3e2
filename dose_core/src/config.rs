//! Configuration file support for Dosette.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/dosette/config.toml`.

use crate::markings::{build_builtin_table, MarkingTable};
use crate::types::SyringeType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub markings: MarkingsConfig,
}

/// Safety limit tunables.
///
/// The defaults are the shipped policy; overriding them in config narrows
/// or widens what the engine accepts, it never changes the check ordering.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    /// Smallest draw volume (ml) considered reliably measurable
    #[serde(default = "default_volume_min_ml")]
    pub volume_min_ml: f64,

    /// Largest draw volume (ml) accepted for a single injection
    #[serde(default = "default_volume_max_ml")]
    pub volume_max_ml: f64,

    /// Practical single-draw ceiling (ml) for insulin syringes,
    /// independent of printed barrel capacity
    #[serde(default = "default_insulin_max_draw_ml")]
    pub insulin_max_draw_ml: f64,

    /// Minimum resolvable concentration (mg/ml); anything lower is treated
    /// as a data-entry problem rather than a real preparation
    #[serde(default = "default_min_concentration")]
    pub min_concentration_mg_per_ml: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            volume_min_ml: default_volume_min_ml(),
            volume_max_ml: default_volume_max_ml(),
            insulin_max_draw_ml: default_insulin_max_draw_ml(),
            min_concentration_mg_per_ml: default_min_concentration(),
        }
    }
}

/// Custom marking set for a syringe not in the builtin table
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomMarkingSet {
    pub syringe_type: SyringeType,
    pub volume: String,
    pub marks: Vec<f64>,
}

/// Marking table configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct MarkingsConfig {
    #[serde(default)]
    pub custom: Vec<CustomMarkingSet>,
}

// Default value functions
fn default_volume_min_ml() -> f64 {
    0.005
}

fn default_volume_max_ml() -> f64 {
    2.0
}

fn default_insulin_max_draw_ml() -> f64 {
    1.0
}

fn default_min_concentration() -> f64 {
    0.01
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("dosette").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Build the marking table: builtin sets with any custom sets from
    /// configuration layered on top
    pub fn marking_table(&self) -> MarkingTable {
        let mut table = build_builtin_table();
        for set in &self.markings.custom {
            table.insert(set.syringe_type, &set.volume, set.marks.clone());
        }
        table
    }
}
