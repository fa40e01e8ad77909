//! TBM Report: shift analysis for tunnel boring machine sensor logs
//!
//! Turns a timestamped multi-channel log into contiguous runs of a derived
//! state and summarizes them.
//!
//! ## Architecture
//!
//! - **Normalizer**: one channel + a state rule → per-sample states
//! - **Segmenter**: maximal runs of equal state, missing samples break runs
//! - **Statistics**: counts, totals, longest run, occupancy, switch count
//! - **Analyses**: work/stop, lithology classes, gas limit exceedance
//! - **Narrative**: plain-text report for the shift supervisor

pub mod analysis;
pub mod config;
pub mod narrative;
pub mod replay;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, ReportConfig};

// Re-export commonly used types
pub use types::{
    Comparator, GasThresholds, Observation, Segment, SensorLog, State, StateRule, ThresholdSpec,
};

// Re-export the analysis entry points
pub use analysis::{
    analyze_lithology, analyze_operation, count_switches, detect, detect_all, normalize,
    segment_runs, summarize_by_state, summarize_categories, AnalysisError, ShiftReport,
};
