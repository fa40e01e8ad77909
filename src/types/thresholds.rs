//! Gas safety limits and state-derivation rules

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::analysis::AnalysisError;

/// Default gas limits for tunnel atmosphere monitoring
pub mod gas_limits {
    /// Oxygen normal range, lower bound (%)
    pub const OXYGEN_LOW: f64 = 19.5;
    /// Oxygen normal range, upper bound (%)
    pub const OXYGEN_HIGH: f64 = 23.5;
    /// Carbon monoxide (mg/m3)
    pub const CARBON_MONOXIDE: f64 = 24.0;
    /// Hydrogen sulfide (ppm)
    pub const HYDROGEN_SULFIDE: f64 = 10.0;
    /// Airborne dust (mg/m3)
    pub const DUST: f64 = 10.0;
    /// Methane at any measuring point (%)
    pub const METHANE: f64 = 0.5;
    /// Carbon dioxide (%)
    pub const CARBON_DIOXIDE: f64 = 0.5;
    /// Nitric oxide (ppm)
    pub const NITRIC_OXIDE: f64 = 20.0;
    /// Sulfur dioxide (ppm)
    pub const SULFUR_DIOXIDE: f64 = 2.0;
}

/// Safety limit for one continuous channel.
///
/// In TOML: `{ max = 24.0 }` or `{ low = 19.5, high = 23.5 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdSpec {
    /// Normal inside the inclusive range; exceeding below `low` or above `high`
    Range { low: f64, high: f64 },
    /// Exceeding strictly above `max`
    Upper { max: f64 },
}

impl ThresholdSpec {
    pub const fn upper(max: f64) -> Self {
        Self::Upper { max }
    }

    pub const fn range(low: f64, high: f64) -> Self {
        Self::Range { low, high }
    }

    /// Reject non-finite bounds and inverted ranges.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match *self {
            Self::Upper { max } if !max.is_finite() => Err(AnalysisError::InvalidInput(format!(
                "upper bound must be finite (got {max})"
            ))),
            Self::Range { low, high } if !low.is_finite() || !high.is_finite() => {
                Err(AnalysisError::InvalidInput(format!(
                    "range bounds must be finite (got [{low}, {high}])"
                )))
            }
            Self::Range { low, high } if low > high => Err(AnalysisError::InvalidInput(format!(
                "range low ({low}) must not exceed high ({high})"
            ))),
            _ => Ok(()),
        }
    }

    pub fn is_exceeded(&self, value: f64) -> bool {
        match *self {
            Self::Upper { max } => value > max,
            Self::Range { low, high } => value < low || value > high,
        }
    }
}

impl fmt::Display for ThresholdSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upper { max } => write!(f, "> {max}"),
            Self::Range { low, high } => write!(f, "outside [{low}, {high}]"),
        }
    }
}

/// Per-channel gas limits, keyed by channel name.
///
/// Passed explicitly into exceedance detection; never global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GasThresholds(BTreeMap<String, ThresholdSpec>);

impl Default for GasThresholds {
    fn default() -> Self {
        use gas_limits::*;
        let table = [
            ("oxygen", ThresholdSpec::range(OXYGEN_LOW, OXYGEN_HIGH)),
            ("carbon_monoxide", ThresholdSpec::upper(CARBON_MONOXIDE)),
            ("hydrogen_sulfide", ThresholdSpec::upper(HYDROGEN_SULFIDE)),
            ("dust", ThresholdSpec::upper(DUST)),
            ("methane_main_drive", ThresholdSpec::upper(METHANE)),
            ("methane_bridge", ThresholdSpec::upper(METHANE)),
            ("methane_dust_fan_outlet", ThresholdSpec::upper(METHANE)),
            ("carbon_dioxide", ThresholdSpec::upper(CARBON_DIOXIDE)),
            ("nitric_oxide", ThresholdSpec::upper(NITRIC_OXIDE)),
            ("sulfur_dioxide", ThresholdSpec::upper(SULFUR_DIOXIDE)),
        ];
        Self(
            table
                .into_iter()
                .map(|(name, spec)| (name.to_string(), spec))
                .collect(),
        )
    }
}

impl GasThresholds {
    pub const fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Set or override the limit for one channel.
    pub fn with(mut self, channel: impl Into<String>, spec: ThresholdSpec) -> Self {
        self.0.insert(channel.into(), spec);
        self
    }

    pub fn get(&self, channel: &str) -> Option<&ThresholdSpec> {
        self.0.get(channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ThresholdSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate every entry, naming the offending channel.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, spec) in &self.0 {
            spec.validate().map_err(|e| match e {
                AnalysisError::InvalidInput(msg) => {
                    AnalysisError::InvalidInput(format!("gas threshold '{name}': {msg}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

/// Comparison applied by the boolean-threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// `value > cutoff`
    Above(f64),
    /// `value >= cutoff`
    AtLeast(f64),
    /// `value < cutoff`
    Below(f64),
}

impl Comparator {
    pub fn holds(self, value: f64) -> bool {
        match self {
            Self::Above(cutoff) => value > cutoff,
            Self::AtLeast(cutoff) => value >= cutoff,
            Self::Below(cutoff) => value < cutoff,
        }
    }

    pub const fn cutoff(self) -> f64 {
        match self {
            Self::Above(c) | Self::AtLeast(c) | Self::Below(c) => c,
        }
    }
}

impl Default for Comparator {
    fn default() -> Self {
        Self::Above(0.0)
    }
}

/// How a raw numeric series is turned into discrete states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateRule {
    /// `Flag(comparator holds)`; a missing reading yields `Flag(false)`
    Boolean(Comparator),
    /// Value is an integer class label; a missing label is unclassified
    Categorical,
    /// `Flag(value violates spec)`; a missing reading yields no state
    Threshold(ThresholdSpec),
}
