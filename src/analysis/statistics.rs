//! Segment statistics aggregation
//!
//! Reduces segment sets to counts, durations, the longest run, short-run
//! counts and, for categorical series, switch counts and occupancy ratios.
//! Everything here is a pure function of its inputs.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{seconds_between, Observation, Segment, State};

/// Segments shorter than this many seconds count as short
pub const DEFAULT_SHORT_SEGMENT_SECS: f64 = 60.0;

/// Aggregate over one set of segments.
///
/// The empty set yields zero counts, zero durations and no longest segment.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SegmentStats {
    pub count: usize,
    pub total_duration_secs: f64,
    /// 0 when `count` is 0
    pub mean_duration_secs: f64,
    /// First-occurring segment of maximal duration
    pub longest: Option<Segment>,
    /// Segments with `duration < short_threshold_secs`
    pub short_segment_count: usize,
}

impl SegmentStats {
    pub fn from_segments<'a>(
        segments: impl IntoIterator<Item = &'a Segment>,
        short_threshold_secs: f64,
    ) -> Self {
        let mut stats = Self::default();
        for seg in segments {
            stats.count += 1;
            stats.total_duration_secs += seg.duration_secs;
            if seg.is_short(short_threshold_secs) {
                stats.short_segment_count += 1;
            }
            // strict comparison keeps the first of equal-length segments
            let longer = stats
                .longest
                .as_ref()
                .map_or(true, |best| seg.duration_secs > best.duration_secs);
            if longer {
                stats.longest = Some(seg.clone());
            }
        }
        if stats.count > 0 {
            stats.mean_duration_secs = stats.total_duration_secs / stats.count as f64;
        }
        stats
    }

    pub fn total_minutes(&self) -> f64 {
        self.total_duration_secs / 60.0
    }
}

/// Aggregate over a categorical (lithology) series.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CategoryStats {
    pub per_category: BTreeMap<u32, SegmentStats>,
    /// Label changes between consecutive classified samples
    pub switch_count: usize,
    /// Category duration over the elapsed span of the full input
    pub occupancy_ratio: BTreeMap<u32, f64>,
    /// First to last timestamp of the full input, unclassified samples included
    pub elapsed_secs: f64,
    pub classified_samples: usize,
    pub unclassified_samples: usize,
}

/// Partition segments by state and aggregate each partition.
pub fn summarize_by_state(
    segments: &[Segment],
    short_threshold_secs: f64,
) -> BTreeMap<State, SegmentStats> {
    let mut groups: BTreeMap<State, Vec<&Segment>> = BTreeMap::new();
    for seg in segments {
        groups.entry(seg.state).or_default().push(seg);
    }
    groups
        .into_iter()
        .map(|(state, segs)| (state, SegmentStats::from_segments(segs, short_threshold_secs)))
        .collect()
}

/// Count state changes between consecutive samples that have a state.
///
/// Samples without state are skipped, so `A, -, A` has no switch and
/// `A, -, B` has one. Counted over samples, not segments.
pub fn count_switches(observations: &[Observation]) -> usize {
    let mut classified = observations.iter().filter_map(|o| o.state);
    let Some(mut previous) = classified.next() else {
        return 0;
    };
    let mut switches = 0;
    for state in classified {
        if state != previous {
            switches += 1;
            previous = state;
        }
    }
    switches
}

/// Seconds from the first to the last observation; 0 for fewer than two.
pub fn elapsed_secs(observations: &[Observation]) -> f64 {
    match (observations.first(), observations.last()) {
        (Some(first), Some(last)) => seconds_between(first.timestamp, last.timestamp),
        _ => 0.0,
    }
}

/// Per-category statistics, switch count and occupancy.
///
/// `observations` is the full aligned series (unclassified samples included)
/// that `segments` were built from. Non-categorical segments are ignored.
pub fn summarize_categories(
    observations: &[Observation],
    segments: &[Segment],
    short_threshold_secs: f64,
) -> CategoryStats {
    let elapsed = elapsed_secs(observations);

    let per_category: BTreeMap<u32, SegmentStats> =
        summarize_by_state(segments, short_threshold_secs)
            .into_iter()
            .filter_map(|(state, stats)| state.as_category().map(|c| (c, stats)))
            .collect();

    let occupancy_ratio = per_category
        .iter()
        .map(|(&category, stats)| {
            let ratio = if elapsed > 0.0 {
                stats.total_duration_secs / elapsed
            } else {
                0.0
            };
            (category, ratio)
        })
        .collect();

    let classified_samples = observations.iter().filter(|o| o.state.is_some()).count();

    CategoryStats {
        per_category,
        switch_count: count_switches(observations),
        occupancy_ratio,
        elapsed_secs: elapsed,
        classified_samples,
        unclassified_samples: observations.len() - classified_samples,
    }
}
