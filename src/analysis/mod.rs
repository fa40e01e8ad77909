//! Segmentation and interval statistics for TBM shift logs
//!
//! Every analysis follows the same pipeline:
//!
//! ```text
//! SensorLog channel ─► normalizer (StateRule) ─► Observations
//!                  ─► segmenter (runs of equal state) ─► Segments
//!                  ─► statistics (counts, durations, occupancy, switches)
//! ```
//!
//! ## Architecture
//! - `normalizer`: raw values to discrete states via a `StateRule`
//! - `segmenter`: single linear scan producing maximal equal-state runs
//! - `statistics`: per-state and per-category aggregation
//! - `exceedance`: gas limit violations per channel
//! - `operation`: work/stop segmentation of the penetration channel
//! - `lithology`: rock-class segmentation and advance efficiency
//! - `report`: runs the three analyses concurrently into a `ShiftReport`
//!
//! All stages are pure functions over an immutable log; nothing is shared
//! or mutated between analyses.

pub mod normalizer;
pub mod segmenter;
pub mod statistics;
pub mod exceedance;
pub mod operation;
pub mod lithology;
pub mod report;

use thiserror::Error;

pub use normalizer::{normalize, normalize_channel};
pub use segmenter::{segment_runs, segments_in_state};
pub use statistics::{
    count_switches, summarize_by_state, summarize_categories, CategoryStats, SegmentStats,
    DEFAULT_SHORT_SEGMENT_SECS,
};
pub use exceedance::{detect, detect_all, summarize_channel, ChannelSummary, ExceedanceReport};
pub use operation::{analyze_operation, OperationReport};
pub use lithology::{analyze_lithology, CategoryEfficiency, LithologyChannels, LithologyReport};
pub use report::ShiftReport;

/// Errors surfaced at pipeline entry. Empty or all-unclassified inputs are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Unordered timestamps, misaligned channels, malformed thresholds or labels
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested channel is not present in the log
    #[error("Unknown field: {0}")]
    UnknownField(String),
}
