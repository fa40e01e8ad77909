//! Shift report: all three analyses over one log
//!
//! Ordering is validated once up front; afterwards work/stop, lithology and
//! gas analyses run concurrently on the rayon pool. They only read the log.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::exceedance::{detect, ExceedanceReport};
use super::lithology::{analyze_lithology, LithologyReport};
use super::operation::{analyze_operation, OperationReport};
use super::AnalysisError;
use crate::config::ReportConfig;
use crate::types::{GasThresholds, SensorLog, ThresholdSpec};

/// Everything the text renderer needs for one shift
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftReport {
    pub sample_count: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub elapsed_secs: f64,
    pub short_segment_secs: f64,
    /// Rock classes the classifier was configured with
    pub category_count: u32,
    pub operation: OperationReport,
    /// `None` when the log carries no lithology label channel
    pub lithology: Option<LithologyReport>,
    /// One entry per configured gas channel present in the log, by name
    pub gas: Vec<ExceedanceReport>,
    /// Configured gas channels the log does not carry
    pub skipped_gas_channels: Vec<String>,
}

impl ShiftReport {
    /// Run all analyses configured in `config` over `log`.
    ///
    /// # Errors
    /// `InvalidInput` for unordered timestamps or a malformed threshold;
    /// `UnknownField` if the operation channel is absent. Missing lithology
    /// and gas channels are skipped with a warning.
    pub fn build(log: &SensorLog, config: &ReportConfig) -> Result<Self, AnalysisError> {
        log.check_ordering()?;
        config.gas.thresholds.validate()?;

        let short = config.analysis.short_segment_secs;
        let lithology_channels = config.lithology.channels();
        let (present, skipped) = split_gas_channels(log, &config.gas.thresholds);
        for channel in &skipped {
            warn!(channel = %channel, "Configured gas channel not in log, skipping");
        }

        let (operation, (lithology, gas)) = rayon::join(
            || analyze_operation(log, &config.operation.channel, config.operation.comparator(), short),
            || {
                rayon::join(
                    || {
                        if log.has_channel(&lithology_channels.label) {
                            analyze_lithology(log, &lithology_channels, short).map(Some)
                        } else {
                            warn!(
                                channel = %lithology_channels.label,
                                "No lithology label channel in log, skipping lithology analysis"
                            );
                            Ok(None)
                        }
                    },
                    || {
                        present
                            .par_iter()
                            .map(|(channel, spec)| detect(log, channel, spec, short))
                            .collect::<Result<Vec<_>, _>>()
                    },
                )
            },
        );

        let report = Self {
            sample_count: log.len(),
            start_time: log.time_range().map(|(first, _)| first),
            end_time: log.time_range().map(|(_, last)| last),
            elapsed_secs: log.elapsed_secs(),
            short_segment_secs: short,
            category_count: config.lithology.category_count,
            operation: operation?,
            lithology: lithology?,
            gas: gas?,
            skipped_gas_channels: skipped,
        };

        if let Some(lithology) = &report.lithology {
            for category in lithology.categories().filter(|&c| c >= report.category_count) {
                warn!(
                    category,
                    category_count = report.category_count,
                    "Lithology label outside the configured class range"
                );
            }
        }

        info!(
            samples = report.sample_count,
            work_segments = report.operation.work.count,
            stop_segments = report.operation.stop.count,
            lithology_segments = report.lithology.as_ref().map_or(0, |l| l.segments.len()),
            gas_channels = report.gas.len(),
            gas_exceedances = report.gas.iter().filter(|g| g.has_exceedance()).count(),
            "Shift report built"
        );

        Ok(report)
    }

    /// Gas reports with at least one exceeding sample.
    pub fn exceeding_gases(&self) -> impl Iterator<Item = &ExceedanceReport> {
        self.gas.iter().filter(|g| g.has_exceedance())
    }
}

/// Split the configured table into channels present in the log and names that are not.
fn split_gas_channels(
    log: &SensorLog,
    thresholds: &GasThresholds,
) -> (Vec<(String, ThresholdSpec)>, Vec<String>) {
    let mut present = Vec::new();
    let mut skipped = Vec::new();
    for (channel, spec) in thresholds.iter() {
        if log.has_channel(channel) {
            present.push((channel.to_string(), *spec));
        } else {
            skipped.push(channel.to_string());
        }
    }
    (present, skipped)
}
