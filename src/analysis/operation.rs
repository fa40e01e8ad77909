//! Work/stop segmentation
//!
//! The machine is working while penetration is above the cutoff. A missing
//! penetration reading counts as not working.

use serde::Serialize;
use tracing::debug;

use super::normalizer::normalize_channel;
use super::segmenter::{segment_runs, segments_in_state};
use super::statistics::SegmentStats;
use super::AnalysisError;
use crate::types::{Comparator, Segment, SensorLog, State, StateRule};

/// Operating/idle breakdown of a shift
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationReport {
    pub channel: String,
    pub rule: Comparator,
    /// All runs, alternating between working and stopped
    pub segments: Vec<Segment>,
    pub work: SegmentStats,
    pub stop: SegmentStats,
}

impl OperationReport {
    pub fn work_segments(&self) -> impl Iterator<Item = &Segment> {
        segments_in_state(&self.segments, State::WORKING)
    }

    pub fn stop_segments(&self) -> impl Iterator<Item = &Segment> {
        segments_in_state(&self.segments, State::STOPPED)
    }

    /// Working share of the summed segment time; 0 when nothing was recorded.
    pub fn utilization(&self) -> f64 {
        let total = self.work.total_duration_secs + self.stop.total_duration_secs;
        if total > 0.0 {
            self.work.total_duration_secs / total
        } else {
            0.0
        }
    }
}

/// Segment `channel` into working and stopped runs.
///
/// # Errors
/// `UnknownField` if the channel is absent; `InvalidInput` for unordered
/// timestamps or a non-finite cutoff.
pub fn analyze_operation(
    log: &SensorLog,
    channel: &str,
    rule: Comparator,
    short_threshold_secs: f64,
) -> Result<OperationReport, AnalysisError> {
    let observations = normalize_channel(log, channel, &StateRule::Boolean(rule))?;
    let segments = segment_runs(&observations);

    let work = SegmentStats::from_segments(
        segments_in_state(&segments, State::WORKING),
        short_threshold_secs,
    );
    let stop = SegmentStats::from_segments(
        segments_in_state(&segments, State::STOPPED),
        short_threshold_secs,
    );

    debug!(
        channel,
        work_segments = work.count,
        stop_segments = stop.count,
        "Work/stop segmentation complete"
    );

    Ok(OperationReport {
        channel: channel.to_string(),
        rule,
        segments,
        work,
        stop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    fn penetration_log(values: &[Option<f64>], step_secs: i64) -> SensorLog {
        let times = (0..values.len() as i64).map(|i| ts(i * step_secs)).collect();
        SensorLog::new(times)
            .with_channel("penetration_rate", values.to_vec())
            .expect("aligned channel")
    }

    #[test]
    fn test_work_stop_breakdown() {
        let log = penetration_log(
            &[Some(5.0), Some(6.0), Some(0.0), Some(0.0), Some(0.0), Some(4.0)],
            30,
        );
        let report = analyze_operation(&log, "penetration_rate", Comparator::default(), 60.0)
            .expect("valid log");

        assert_eq!(report.segments.len(), 3);
        assert_eq!(report.work.count, 2);
        assert_eq!(report.stop.count, 1);
        assert_eq!(report.work.total_duration_secs, 30.0);
        assert_eq!(report.stop.total_duration_secs, 60.0);
        // 30 s and 0 s work runs are short; the 60 s stop is not
        assert_eq!(report.work.short_segment_count, 2);
        assert_eq!(report.stop.short_segment_count, 0);
        assert_eq!(report.work_segments().count(), 2);
        assert_eq!(report.stop_segments().count(), 1);
        assert!((report.utilization() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_penetration_is_stopped() {
        let log = penetration_log(&[Some(2.0), None, None, Some(2.0)], 1);
        let report = analyze_operation(&log, "penetration_rate", Comparator::default(), 60.0)
            .expect("valid log");
        let states: Vec<State> = report.segments.iter().map(|s| s.state).collect();
        assert_eq!(states, vec![State::WORKING, State::STOPPED, State::WORKING]);
    }

    #[test]
    fn test_empty_log() {
        let log = penetration_log(&[], 1);
        let report = analyze_operation(&log, "penetration_rate", Comparator::default(), 60.0)
            .expect("empty is valid");
        assert!(report.segments.is_empty());
        assert_eq!(report.work.count, 0);
        assert!(report.work.longest.is_none());
        assert!(report.stop.longest.is_none());
        assert_eq!(report.utilization(), 0.0);
    }

    #[test]
    fn test_missing_channel() {
        let log = SensorLog::new(vec![ts(0)]);
        let err = analyze_operation(&log, "penetration_rate", Comparator::default(), 60.0)
            .expect_err("no channel");
        assert!(matches!(err, AnalysisError::UnknownField(_)));
    }
}
