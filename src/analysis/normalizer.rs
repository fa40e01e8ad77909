//! Series normalization: raw channel values to per-sample discrete states

use chrono::{DateTime, Utc};

use super::AnalysisError;
use crate::types::{check_ordering, Observation, SensorLog, State, StateRule};

/// Derive one observation per sample using `rule`.
///
/// The output is aligned with the input: same length, same order. Samples the
/// rule cannot classify carry `state: None`.
///
/// # Errors
/// `InvalidInput` if lengths differ, timestamps go backwards, the rule's
/// threshold is malformed, or a categorical value is not a class label.
pub fn normalize(
    timestamps: &[DateTime<Utc>],
    values: &[Option<f64>],
    rule: &StateRule,
) -> Result<Vec<Observation>, AnalysisError> {
    if timestamps.len() != values.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "{} values for {} timestamps",
            values.len(),
            timestamps.len()
        )));
    }
    rule.validate()?;
    check_ordering(timestamps)?;

    timestamps
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (&timestamp, &value))| {
            let state = rule.state_of(value).map_err(|e| match e {
                AnalysisError::InvalidInput(msg) => {
                    AnalysisError::InvalidInput(format!("sample {index}: {msg}"))
                }
                other => other,
            })?;
            Ok(Observation::new(timestamp, state))
        })
        .collect()
}

/// Normalize a named channel of `log`.
///
/// # Errors
/// `UnknownField` if the channel is absent, otherwise as [`normalize`].
pub fn normalize_channel(
    log: &SensorLog,
    channel: &str,
    rule: &StateRule,
) -> Result<Vec<Observation>, AnalysisError> {
    normalize(log.timestamps(), log.channel(channel)?, rule)
}

impl StateRule {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match self {
            Self::Boolean(cmp) if !cmp.cutoff().is_finite() => Err(AnalysisError::InvalidInput(
                format!("boolean cutoff must be finite (got {})", cmp.cutoff()),
            )),
            Self::Threshold(spec) => spec.validate(),
            _ => Ok(()),
        }
    }

    /// State of a single reading under this rule.
    pub fn state_of(&self, value: Option<f64>) -> Result<Option<State>, AnalysisError> {
        let value = value.filter(|v| !v.is_nan());
        match self {
            Self::Boolean(cmp) => Ok(Some(State::Flag(value.is_some_and(|v| cmp.holds(v))))),
            Self::Threshold(spec) => Ok(value.map(|v| State::Flag(spec.is_exceeded(v)))),
            Self::Categorical => value.map(category_label).transpose(),
        }
    }
}

fn category_label(value: f64) -> Result<State, AnalysisError> {
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(AnalysisError::InvalidInput(format!(
            "category label must be a non-negative integer (got {value})"
        )));
    }
    Ok(State::Category(value as u32))
}
