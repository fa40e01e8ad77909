//! Columnar TBM sensor log

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::segment::seconds_between;
use crate::analysis::AnalysisError;

/// Ordered sample log: one timestamp per sample plus named numeric channels.
///
/// Every channel has exactly one entry per timestamp. A missing reading is
/// `None`; `NaN` readings are stored as `None` on insertion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SensorLog {
    timestamps: Vec<DateTime<Utc>>,
    channels: BTreeMap<String, Vec<Option<f64>>>,
}

impl SensorLog {
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            timestamps,
            channels: BTreeMap::new(),
        }
    }

    /// Builder form of [`SensorLog::insert_channel`].
    pub fn with_channel(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, AnalysisError> {
        self.insert_channel(name, values)?;
        Ok(self)
    }

    /// Add or replace a channel. Fails when its length differs from the timestamp count.
    pub fn insert_channel(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), AnalysisError> {
        let name = name.into();
        if values.len() != self.timestamps.len() {
            return Err(AnalysisError::InvalidInput(format!(
                "channel '{}' has {} values for {} timestamps",
                name,
                values.len(),
                self.timestamps.len()
            )));
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        self.channels.insert(name, values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Values of a named channel, or `UnknownField` if the log has no such channel.
    pub fn channel(&self, name: &str) -> Result<&[Option<f64>], AnalysisError> {
        self.channels
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalysisError::UnknownField(name.to_string()))
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// First and last timestamp, if any.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.timestamps.first()?, *self.timestamps.last()?))
    }

    /// Seconds from first to last sample; 0 for empty or single-sample logs.
    pub fn elapsed_secs(&self) -> f64 {
        self.time_range()
            .map_or(0.0, |(first, last)| seconds_between(first, last))
    }

    /// Fails with `InvalidInput` at the first timestamp that goes backwards.
    pub fn check_ordering(&self) -> Result<(), AnalysisError> {
        check_ordering(&self.timestamps)
    }
}

/// Verify timestamps are non-decreasing. Equal neighbours are allowed.
pub fn check_ordering(timestamps: &[DateTime<Utc>]) -> Result<(), AnalysisError> {
    match timestamps.windows(2).position(|w| w[1] < w[0]) {
        Some(i) => Err(AnalysisError::InvalidInput(format!(
            "timestamps not ordered: sample {} ({}) precedes sample {} ({})",
            i + 1,
            timestamps[i + 1],
            i,
            timestamps[i]
        ))),
        None => Ok(()),
    }
}
