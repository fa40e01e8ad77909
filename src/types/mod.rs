//! Shared data structures for TBM shift analysis
//!
//! This module defines the types that flow through the analysis pipeline:
//! - `SensorLog`: the ordered, columnar sample log handed over by the input provider
//! - `Observation`: one sample reduced to a discrete `State` (or no state)
//! - `Segment`: a maximal run of equal-state samples
//! - `ThresholdSpec` / `StateRule`: how raw values become states

mod sensor_log;
mod segment;
pub mod thresholds;

pub use sensor_log::*;
pub use segment::*;
pub use thresholds::*;
