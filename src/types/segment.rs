//! Discrete states, per-sample observations, and the segments built from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete state derived from a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Two-valued state: work/stop, exceeding/normal
    Flag(bool),
    /// Lithology class assigned by the upstream classifier
    Category(u32),
}

impl State {
    /// Machine advancing (penetration above cutoff)
    pub const WORKING: Self = Self::Flag(true);
    /// Machine idle
    pub const STOPPED: Self = Self::Flag(false);
    /// Signal outside its safety limit
    pub const EXCEEDING: Self = Self::Flag(true);

    pub const fn as_flag(self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(flag),
            Self::Category(_) => None,
        }
    }

    pub const fn as_category(self) -> Option<u32> {
        match self {
            Self::Category(category) => Some(category),
            Self::Flag(_) => None,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::Category(category) => write!(f, "category {category}"),
        }
    }
}

/// One sample reduced to its timestamp and derived state.
///
/// `state` is `None` when the sample carries no usable value (missing reading,
/// unclassified label). Such samples break runs and belong to no segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub state: Option<State>,
}

impl Observation {
    pub const fn new(timestamp: DateTime<Utc>, state: Option<State>) -> Self {
        Self { timestamp, state }
    }
}

/// A maximal contiguous run of samples sharing one state.
///
/// Bounds are sample timestamps: `start_time` is the first sample of the run,
/// `end_time` the last. A single-sample run has zero duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub state: State,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Seconds from `start_time` to `end_time`
    #[serde(rename = "duration")]
    pub duration_secs: f64,
    /// Index of the first covered sample in the source series
    pub first_index: usize,
    /// Number of samples covered
    pub sample_count: usize,
}

impl Segment {
    pub fn new(
        state: State,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        first_index: usize,
        sample_count: usize,
    ) -> Self {
        Self {
            state,
            start_time,
            end_time,
            duration_secs: seconds_between(start_time, end_time),
            first_index,
            sample_count,
        }
    }

    /// Index one past the last covered sample.
    pub const fn end_index(&self) -> usize {
        self.first_index + self.sample_count
    }

    /// Strictly shorter than `threshold_secs`.
    pub fn is_short(&self, threshold_secs: f64) -> bool {
        self.duration_secs < threshold_secs
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_secs / 60.0
    }
}

/// Signed seconds between two instants, with microsecond resolution.
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end - start;
    delta
        .num_microseconds()
        .map_or(delta.num_seconds() as f64, |us| us as f64 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts_millis(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).expect("valid timestamp")
    }

    #[test]
    fn test_duration_from_bounds() {
        let seg = Segment::new(State::WORKING, ts_millis(0), ts_millis(90_500), 0, 10);
        assert!((seg.duration_secs - 90.5).abs() < 1e-9);
        assert!((seg.duration_minutes() - 90.5 / 60.0).abs() < 1e-9);
        assert_eq!(seg.end_index(), 10);
    }

    #[test]
    fn test_single_sample_segment_zero_duration() {
        let seg = Segment::new(State::Category(2), ts_millis(5_000), ts_millis(5_000), 4, 1);
        assert_eq!(seg.duration_secs, 0.0);
    }

    #[test]
    fn test_short_boundary_is_strict() {
        let almost = Segment::new(State::STOPPED, ts_millis(0), ts_millis(59_999), 0, 2);
        let exact = Segment::new(State::STOPPED, ts_millis(0), ts_millis(60_000), 0, 2);
        assert!(almost.is_short(60.0));
        assert!(!exact.is_short(60.0));
    }

    #[test]
    fn test_state_accessors() {
        assert_eq!(State::WORKING.as_flag(), Some(true));
        assert_eq!(State::WORKING.as_category(), None);
        assert_eq!(State::Category(1).as_category(), Some(1));
        assert_eq!(State::Category(1).to_string(), "category 1");
    }

    #[test]
    fn test_segment_serializes_stable_field_names() {
        let seg = Segment::new(State::Category(0), ts_millis(0), ts_millis(2_000), 0, 3);
        let json = serde_json::to_value(&seg).expect("serialize");
        assert!(json.get("state").is_some());
        assert!(json.get("start_time").is_some());
        assert!(json.get("end_time").is_some());
        assert_eq!(json["duration"], 2.0);
    }
}
