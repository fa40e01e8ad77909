//! Report Configuration - channel names, segmentation and gas limits as TOML values
//!
//! Each struct implements `Default` with the values used on site so that an
//! absent config file (or an absent section) yields a working setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analysis::{LithologyChannels, DEFAULT_SHORT_SEGMENT_SECS};
use crate::types::{Comparator, GasThresholds};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "TBM_REPORT_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "tbm_report.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a shift report.
///
/// Load with `ReportConfig::load()` which searches:
/// 1. `$TBM_REPORT_CONFIG` env var
/// 2. `./tbm_report.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// CSV input layout
    #[serde(default)]
    pub input: InputConfig,

    /// Settings shared by all analyses
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Work/stop detection
    #[serde(default)]
    pub operation: OperationConfig,

    /// Lithology channels
    #[serde(default)]
    pub lithology: LithologyConfig,

    /// Gas limits
    #[serde(default)]
    pub gas: GasConfig,
}

impl ReportConfig {
    /// Load configuration using the standard search order:
    /// 1. `$TBM_REPORT_CONFIG` environment variable
    /// 2. `./tbm_report.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded report config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded report config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged, not rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate settings for internal consistency.
    ///
    /// Rules:
    /// - Short-segment threshold must be finite and > 0
    /// - Channel names must be non-empty
    /// - Gas limits must be finite, ranges must have low <= high
    /// - Category count must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let short = self.analysis.short_segment_secs;
        if !short.is_finite() || short <= 0.0 {
            errors.push(format!(
                "analysis.short_segment_secs must be a finite value > 0 (got {short})"
            ));
        }

        if !self.operation.working_above.is_finite() {
            errors.push(format!(
                "operation.working_above must be finite (got {})",
                self.operation.working_above
            ));
        }

        for (key, name) in [
            ("input.timestamp_column", &self.input.timestamp_column),
            ("operation.channel", &self.operation.channel),
            ("lithology.label_channel", &self.lithology.label_channel),
            ("lithology.penetration_channel", &self.lithology.penetration_channel),
            ("lithology.thrust_channel", &self.lithology.thrust_channel),
            ("lithology.advance_speed_channel", &self.lithology.advance_speed_channel),
        ] {
            if name.trim().is_empty() {
                errors.push(format!("{key} must not be empty"));
            }
        }

        if self.lithology.category_count == 0 {
            errors.push("lithology.category_count must be > 0".to_string());
        }

        if let Err(e) = self.gas.thresholds.validate() {
            errors.push(e.to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) if path.as_os_str().is_empty() => {
                write!(f, "Config parse error: {e}")
            }
            Self::Parse(path, e) => write!(f, "Config parse error ({}): {}", path.display(), e),
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Sections
// ============================================================================

/// CSV input layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Header of the timestamp column
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            timestamp_column: default_timestamp_column(),
        }
    }
}

fn default_timestamp_column() -> String {
    "time".to_string()
}

/// Settings shared by all analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Segments shorter than this (seconds) are reported as short
    #[serde(default = "default_short_segment_secs")]
    pub short_segment_secs: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            short_segment_secs: default_short_segment_secs(),
        }
    }
}

const fn default_short_segment_secs() -> f64 {
    DEFAULT_SHORT_SEGMENT_SECS
}

/// Work/stop detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationConfig {
    /// Penetration channel driving the work/stop state
    #[serde(default = "default_penetration_channel")]
    pub channel: String,

    /// Machine counts as working while penetration is strictly above this
    #[serde(default)]
    pub working_above: f64,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            channel: default_penetration_channel(),
            working_above: 0.0,
        }
    }
}

impl OperationConfig {
    pub const fn comparator(&self) -> Comparator {
        Comparator::Above(self.working_above)
    }
}

fn default_penetration_channel() -> String {
    "penetration_rate".to_string()
}

/// Lithology channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LithologyConfig {
    /// Per-sample rock class written by the classifier (blank = unclassified)
    #[serde(default = "default_label_channel")]
    pub label_channel: String,

    #[serde(default = "default_penetration_channel")]
    pub penetration_channel: String,

    #[serde(default = "default_thrust_channel")]
    pub thrust_channel: String,

    #[serde(default = "default_advance_speed_channel")]
    pub advance_speed_channel: String,

    /// Number of rock classes the classifier was run with
    #[serde(default = "default_category_count")]
    pub category_count: u32,
}

impl Default for LithologyConfig {
    fn default() -> Self {
        Self {
            label_channel: default_label_channel(),
            penetration_channel: default_penetration_channel(),
            thrust_channel: default_thrust_channel(),
            advance_speed_channel: default_advance_speed_channel(),
            category_count: default_category_count(),
        }
    }
}

impl LithologyConfig {
    pub fn channels(&self) -> LithologyChannels {
        LithologyChannels {
            label: self.label_channel.clone(),
            penetration: self.penetration_channel.clone(),
            thrust: self.thrust_channel.clone(),
            advance_speed: self.advance_speed_channel.clone(),
        }
    }
}

fn default_label_channel() -> String {
    "lithology_label".to_string()
}
fn default_thrust_channel() -> String {
    "thrust_force".to_string()
}
fn default_advance_speed_channel() -> String {
    "advance_speed".to_string()
}
const fn default_category_count() -> u32 {
    3
}

/// Gas limits. A `[gas.thresholds]` table replaces the built-in table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasConfig {
    #[serde(default)]
    pub thresholds: GasThresholds,
}
