//! Gas limit exceedance detection
//!
//! Each channel runs its own pipeline: threshold rule → observations →
//! runs → keep only exceeding runs. Channels are independent, so a full
//! table is evaluated in parallel with rayon.

use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use tracing::debug;

use super::normalizer::normalize_channel;
use super::segmenter::{segment_runs, segments_in_state};
use super::statistics::SegmentStats;
use super::AnalysisError;
use crate::types::{GasThresholds, Segment, SensorLog, State, StateRule, ThresholdSpec};

/// Basic distribution of the valid readings of a channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid_samples: usize,
}

/// Exceedance result for one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceedanceReport {
    pub channel: String,
    pub threshold: ThresholdSpec,
    /// `None` when the channel has no valid readings
    pub summary: Option<ChannelSummary>,
    /// Number of samples violating the limit
    pub exceed_count: usize,
    /// Exceeding runs only, in time order
    pub segments: Vec<Segment>,
    pub stats: SegmentStats,
}

impl ExceedanceReport {
    pub fn has_exceedance(&self) -> bool {
        self.exceed_count > 0
    }
}

/// Detect limit violations on one channel.
///
/// Missing readings are excluded: they never exceed and they split runs.
///
/// # Errors
/// `UnknownField` if the channel is absent; `InvalidInput` for a malformed
/// threshold or unordered timestamps. A channel with no valid readings
/// yields an empty report, not an error.
pub fn detect(
    log: &SensorLog,
    channel: &str,
    threshold: &ThresholdSpec,
    short_threshold_secs: f64,
) -> Result<ExceedanceReport, AnalysisError> {
    let observations = normalize_channel(log, channel, &StateRule::Threshold(*threshold))?;
    let exceed_count = observations
        .iter()
        .filter(|o| o.state == Some(State::EXCEEDING))
        .count();

    let segments: Vec<Segment> = segments_in_state(&segment_runs(&observations), State::EXCEEDING)
        .cloned()
        .collect();
    let stats = SegmentStats::from_segments(&segments, short_threshold_secs);
    let summary = summarize_channel(log.channel(channel)?);

    debug!(
        channel,
        threshold = %threshold,
        exceed_count,
        windows = segments.len(),
        "Exceedance scan complete"
    );

    Ok(ExceedanceReport {
        channel: channel.to_string(),
        threshold: *threshold,
        summary,
        exceed_count,
        segments,
        stats,
    })
}

/// Run [`detect`] for every channel in `thresholds`, in parallel.
///
/// Results are ordered by channel name. Fails on the first missing channel.
pub fn detect_all(
    log: &SensorLog,
    thresholds: &GasThresholds,
    short_threshold_secs: f64,
) -> Result<Vec<ExceedanceReport>, AnalysisError> {
    thresholds.validate()?;
    let entries: Vec<(&str, &ThresholdSpec)> = thresholds.iter().collect();
    entries
        .into_par_iter()
        .map(|(channel, spec)| detect(log, channel, spec, short_threshold_secs))
        .collect()
}

/// Min, max and mean of the present readings, or `None` if there are none.
pub fn summarize_channel(values: &[Option<f64>]) -> Option<ChannelSummary> {
    let valid: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    if valid.is_empty() {
        return None;
    }
    Some(ChannelSummary {
        min: Statistics::min(valid.iter()),
        max: Statistics::max(valid.iter()),
        mean: Statistics::mean(valid.iter()),
        valid_samples: valid.len(),
    })
}
