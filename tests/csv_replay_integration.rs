//! CSV Replay Integration Test
//!
//! Exercises the full path the binary takes:
//! write a shift CSV -> replay::load -> ShiftReport::build -> text and JSON.

use std::io::Write;
use std::path::Path;

use tbm_report::config::ReportConfig;
use tbm_report::narrative::render_report;
use tbm_report::replay::{self, ReplayError};
use tbm_report::{AnalysisError, ShiftReport, State};

/// Ten-minute shift sampled every 30 s: drilling, a 2.5 min stop, drilling.
/// Lithology switches from class 0 to class 2 with one unclassified sample;
/// carbon monoxide spikes for one minute, oxygen stays in range.
const SHIFT_CSV: &str = "\
time,penetration_rate,thrust_force,advance_speed,lithology_label,carbon_monoxide,oxygen
2024-03-01 08:00:00,4.0,12000,40,0,3.0,20.9
2024-03-01 08:00:30,4.2,12100,41,0,3.1,20.9
2024-03-01 08:01:00,3.8,11900,39,0,2.9,20.8
2024-03-01 08:01:30,0,0,0,0,3.0,20.9
2024-03-01 08:02:00,0,0,0,,30.5,20.9
2024-03-01 08:02:30,0,0,0,2,31.0,20.8
2024-03-01 08:03:00,0,0,0,2,28.0,20.9
2024-03-01 08:03:30,0,0,0,2,4.0,20.9
2024-03-01 08:04:00,2.0,18000,20,2,3.5,20.9
2024-03-01 08:04:30,2.2,18200,22,2,3.2,nan
";

fn write_csv(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).expect("create csv");
    file.write_all(contents.as_bytes()).expect("write csv");
    path
}

fn load_shift() -> (tbm_report::SensorLog, replay::ReplayInfo) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_csv(dir.path(), "shift.csv", SHIFT_CSV);
    replay::load(&path, &ReportConfig::default().input).expect("valid csv")
}

#[test]
fn csv_loads_all_rows_and_channels() {
    let (log, info) = load_shift();
    assert_eq!(info.rows_loaded, 10);
    assert_eq!(info.skipped_rows, 0);
    assert_eq!(info.channels.len(), 6);
    assert_eq!(log.elapsed_secs(), 270.0);
    assert_eq!(log.channel("lithology_label").expect("present")[4], None);
    assert_eq!(log.channel("oxygen").expect("present")[9], None);
}

#[test]
fn shift_report_from_csv() {
    let (log, _) = load_shift();
    let report = ShiftReport::build(&log, &ReportConfig::default()).expect("valid log");

    // work 08:00:00-08:01:00, stop 08:01:30-08:03:30, work 08:04:00-08:04:30
    let op = &report.operation;
    assert_eq!(op.segments.len(), 3);
    assert_eq!(op.work.count, 2);
    assert_eq!(op.work.total_duration_secs, 90.0);
    assert_eq!(op.stop.count, 1);
    assert_eq!(op.stop.total_duration_secs, 120.0);
    assert_eq!(op.work.short_segment_count, 1);
    assert_eq!(
        op.stop.longest.as_ref().map(|s| s.state),
        Some(State::STOPPED)
    );

    let lith = report.lithology.as_ref().expect("label channel present");
    assert_eq!(lith.stats.switch_count, 1);
    assert_eq!(lith.stats.unclassified_samples, 1);
    assert_eq!(lith.stats.per_category[&0].total_duration_secs, 90.0);
    assert_eq!(lith.stats.per_category[&2].total_duration_secs, 120.0);
    let hard = lith
        .efficiency
        .iter()
        .find(|e| e.category == 2)
        .expect("class 2 observed");
    assert_eq!(hard.sample_count, 5);
    assert!((hard.mean_penetration.expect("present") - 0.84).abs() < 1e-9);

    let co = report
        .gas
        .iter()
        .find(|g| g.channel == "carbon_monoxide")
        .expect("carbon monoxide monitored");
    assert_eq!(co.exceed_count, 3);
    assert_eq!(co.segments.len(), 1);
    assert_eq!(co.segments[0].duration_secs, 60.0);
    let oxygen = report
        .gas
        .iter()
        .find(|g| g.channel == "oxygen")
        .expect("oxygen monitored");
    assert!(!oxygen.has_exceedance());
    assert_eq!(oxygen.summary.expect("readings").valid_samples, 9);
    assert_eq!(report.skipped_gas_channels.len(), 8);
}

#[test]
fn shift_report_renders_text_and_json() {
    let (log, _) = load_shift();
    let report = ShiftReport::build(&log, &ReportConfig::default()).expect("valid log");

    let text = render_report(&report, true);
    assert!(text.contains("- STOP 2024-03-01 08:01:30 to 2024-03-01 08:03:30 (2.0 min, 5 samples)"));
    assert!(text.contains("- Class switches: 1"));
    assert!(text.contains("carbon_monoxide: mean"));

    let json = serde_json::to_value(&report).expect("serializable");
    let first = &json["operation"]["segments"][0];
    assert_eq!(first["duration"], 60.0);
    assert_eq!(first["state"], serde_json::json!({ "flag": true }));
    assert!(json["operation"]["stop"]["longest"].is_object());
    assert_eq!(json["lithology"]["stats"]["switch_count"], 1);
}

#[test]
fn unordered_csv_fails_at_build() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_csv(
        dir.path(),
        "unordered.csv",
        "time,penetration_rate\n1700000060,1\n1700000000,1\n",
    );
    let (log, _) = replay::load(&path, &ReportConfig::default().input).expect("loader keeps order");
    let err = ShiftReport::build(&log, &ReportConfig::default()).expect_err("unordered");
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = replay::load(dir.path().join("absent.csv"), &ReportConfig::default().input)
        .expect_err("missing");
    assert!(matches!(err, ReplayError::Io { .. }));
}
