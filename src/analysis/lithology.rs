//! Lithology segmentation and advance efficiency
//!
//! Consumes the per-sample rock class produced by the upstream classifier
//! (a label channel; missing = unclassified) and reports:
//! - contiguous runs per rock class
//! - per-class duration statistics, occupancy and switch count
//! - per-class mean penetration, advance speed and thrust
//!
//! Specific thrust (mean thrust / mean penetration) is a rough proxy for the
//! energy spent per unit advance: harder rock pushes it up.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::debug;

use super::normalizer::normalize_channel;
use super::segmenter::segment_runs;
use super::statistics::{summarize_categories, CategoryStats};
use super::AnalysisError;
use crate::types::{Observation, Segment, SensorLog, StateRule};

/// Channel names used by the lithology analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LithologyChannels {
    /// Rock class per sample, written by the classifier
    pub label: String,
    pub penetration: String,
    pub thrust: String,
    pub advance_speed: String,
}

impl Default for LithologyChannels {
    fn default() -> Self {
        Self {
            label: "lithology_label".to_string(),
            penetration: "penetration_rate".to_string(),
            thrust: "thrust_force".to_string(),
            advance_speed: "advance_speed".to_string(),
        }
    }
}

/// Advance efficiency for one rock class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEfficiency {
    pub category: u32,
    pub sample_count: usize,
    pub mean_penetration: Option<f64>,
    pub mean_advance_speed: Option<f64>,
    pub mean_thrust: Option<f64>,
    /// `mean_thrust / mean_penetration`; absent when penetration is zero or unknown
    pub specific_thrust: Option<f64>,
}

/// Full lithology result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LithologyReport {
    pub label_channel: String,
    pub segments: Vec<Segment>,
    pub stats: CategoryStats,
    /// One entry per observed class, ascending
    pub efficiency: Vec<CategoryEfficiency>,
}

impl LithologyReport {
    /// Runs of one rock class, in time order.
    pub fn segments_for(&self, category: u32) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(move |s| s.state.as_category() == Some(category))
    }

    pub fn categories(&self) -> impl Iterator<Item = u32> + '_ {
        self.stats.per_category.keys().copied()
    }
}

/// Segment the label channel and compute class statistics and efficiency.
///
/// Feature channels (penetration, thrust, advance speed) are optional; an
/// absent one leaves the matching mean empty.
///
/// # Errors
/// `UnknownField` if the label channel is absent; `InvalidInput` for
/// unordered timestamps or a label that is not a non-negative integer.
pub fn analyze_lithology(
    log: &SensorLog,
    channels: &LithologyChannels,
    short_threshold_secs: f64,
) -> Result<LithologyReport, AnalysisError> {
    let observations = normalize_channel(log, &channels.label, &StateRule::Categorical)?;
    let segments = segment_runs(&observations);
    let stats = summarize_categories(&observations, &segments, short_threshold_secs);
    let efficiency = efficiency_table(log, &observations, channels);

    debug!(
        label_channel = %channels.label,
        segments = segments.len(),
        categories = stats.per_category.len(),
        switches = stats.switch_count,
        unclassified = stats.unclassified_samples,
        "Lithology segmentation complete"
    );

    Ok(LithologyReport {
        label_channel: channels.label.clone(),
        segments,
        stats,
        efficiency,
    })
}

/// Per-class means of the feature channels over classified samples.
pub fn efficiency_table(
    log: &SensorLog,
    observations: &[Observation],
    channels: &LithologyChannels,
) -> Vec<CategoryEfficiency> {
    let mut members: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, obs) in observations.iter().enumerate() {
        if let Some(category) = obs.state.and_then(|s| s.as_category()) {
            members.entry(category).or_default().push(index);
        }
    }

    let penetration = log.channel(&channels.penetration).ok();
    let thrust = log.channel(&channels.thrust).ok();
    let advance_speed = log.channel(&channels.advance_speed).ok();

    members
        .into_iter()
        .map(|(category, indices)| {
            let mean_penetration = penetration.and_then(|v| mean_at(v, &indices));
            let mean_thrust = thrust.and_then(|v| mean_at(v, &indices));
            let specific_thrust = match (mean_thrust, mean_penetration) {
                (Some(t), Some(p)) if p != 0.0 => Some(t / p),
                _ => None,
            };
            CategoryEfficiency {
                category,
                sample_count: indices.len(),
                mean_penetration,
                mean_advance_speed: advance_speed.and_then(|v| mean_at(v, &indices)),
                mean_thrust,
                specific_thrust,
            }
        })
        .collect()
}

/// Mean of the present values at `indices`, or `None` if none are present.
fn mean_at(values: &[Option<f64>], indices: &[usize]) -> Option<f64> {
    let present: Vec<f64> = indices
        .iter()
        .filter_map(|&i| values.get(i).copied().flatten())
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(Statistics::mean(present.iter()))
    }
}
