//! Segmentation Property Tests
//!
//! Exercises the normalize -> segment -> aggregate pipeline through the public
//! API: the worked scenarios, the empty and single-sample boundaries, and
//! randomized sequences checked for coverage and contiguity.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tbm_report::analysis::statistics::SegmentStats;
use tbm_report::analysis::{summarize_categories, DEFAULT_SHORT_SEGMENT_SECS};
use tbm_report::{
    count_switches, detect, normalize, segment_runs, summarize_by_state, Observation, Segment,
    SensorLog, State, StateRule, ThresholdSpec,
};

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

fn observations(states: &[Option<State>]) -> Vec<Observation> {
    states
        .iter()
        .enumerate()
        .map(|(i, &s)| Observation::new(ts(i as i64), s))
        .collect()
}

/// (state, start, end, duration) without source indices
fn shape(segments: &[Segment]) -> Vec<(State, DateTime<Utc>, DateTime<Utc>, f64)> {
    segments
        .iter()
        .map(|s| (s.state, s.start_time, s.end_time, s.duration_secs))
        .collect()
}

// ============================================================================
// Worked Scenarios
// ============================================================================

#[test]
fn work_stop_scenario_produces_three_runs() {
    let penetration = [2.0, 1.5, 0.0, 0.0, 0.0, 3.0].map(Some);
    let times: Vec<_> = (0..6).map(ts).collect();
    let obs = normalize(&times, &penetration, &StateRule::Boolean(Default::default()))
        .expect("ordered input");

    let segments = segment_runs(&obs);
    assert_eq!(
        shape(&segments),
        vec![
            (State::WORKING, ts(0), ts(1), 1.0),
            (State::STOPPED, ts(2), ts(4), 2.0),
            (State::WORKING, ts(5), ts(5), 0.0),
        ]
    );
}

#[test]
fn gas_scenario_keeps_only_exceeding_run() {
    let log = SensorLog::new(vec![ts(0), ts(7), ts(19), ts(30)])
        .with_channel("carbon_monoxide", [10.0, 30.0, 30.0, 5.0].map(Some).to_vec())
        .expect("aligned");

    let report = detect(&log, "carbon_monoxide", &ThresholdSpec::upper(24.0), 60.0)
        .expect("channel present");
    assert_eq!(report.segments.len(), 1);
    let seg = &report.segments[0];
    assert_eq!((seg.first_index, seg.end_index()), (1, 3));
    assert_eq!(seg.duration_secs, 12.0);
    assert_eq!(report.exceed_count, 2);
}

#[test]
fn lithology_scenario_counts_two_switches() {
    let labels = [0, 0, 1, 1, 0].map(|c| Some(State::Category(c)));
    let obs = observations(&labels);
    let segments = segment_runs(&obs);
    let stats = summarize_categories(&obs, &segments, DEFAULT_SHORT_SEGMENT_SECS);

    assert_eq!(count_switches(&obs), 2);
    assert_eq!(stats.switch_count, 2);
    // label 0 covers [0,1] and the zero-length run at 4, over 4 s elapsed
    assert!((stats.occupancy_ratio[&0] - 0.25).abs() < 1e-12);
    assert!((stats.occupancy_ratio[&1] - 0.25).abs() < 1e-12);
}

#[test]
fn single_sample_flicker_counts_twice() {
    let obs = observations(&[0, 0, 2, 0, 0].map(|c| Some(State::Category(c))));
    assert_eq!(count_switches(&obs), 2);
}

#[test]
fn short_segment_threshold_is_strict() {
    let start = ts(0);
    let just_under = Segment::new(State::STOPPED, start, start + Duration::microseconds(59_999_000), 0, 2);
    let exact = Segment::new(State::STOPPED, start, start + Duration::seconds(60), 2, 2);

    let stats = SegmentStats::from_segments([&just_under, &exact], 60.0);
    assert_eq!(stats.short_segment_count, 1);
    assert!(just_under.is_short(60.0));
    assert!(!exact.is_short(60.0));
}

// ============================================================================
// Boundaries
// ============================================================================

#[test]
fn empty_input_has_no_segments_and_no_longest() {
    let segments = segment_runs(&[]);
    assert!(segments.is_empty());

    let stats = SegmentStats::from_segments(&segments, 60.0);
    assert_eq!(stats.count, 0);
    assert_eq!(stats.total_duration_secs, 0.0);
    assert_eq!(stats.mean_duration_secs, 0.0);
    assert!(stats.longest.is_none());

    let cats = summarize_categories(&[], &segments, 60.0);
    assert_eq!(cats.switch_count, 0);
    assert!(cats.per_category.is_empty());
    assert_eq!(cats.elapsed_secs, 0.0);
}

#[test]
fn single_sample_has_zero_elapsed_and_zero_occupancy() {
    let obs = observations(&[Some(State::Category(1))]);
    let segments = segment_runs(&obs);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].duration_secs, 0.0);

    let cats = summarize_categories(&obs, &segments, 60.0);
    assert_eq!(cats.elapsed_secs, 0.0);
    assert_eq!(cats.occupancy_ratio[&1], 0.0);
}

#[test]
fn constant_sequence_is_one_segment() {
    for state in [State::WORKING, State::STOPPED] {
        let obs = observations(&[Some(state); 8]);
        let segments = segment_runs(&obs);
        assert_eq!(shape(&segments), vec![(state, ts(0), ts(7), 7.0)]);
    }
}

#[test]
fn all_unclassified_is_empty_not_error() {
    let obs = observations(&[None, None, None]);
    let segments = segment_runs(&obs);
    let cats = summarize_categories(&obs, &segments, 60.0);
    assert!(segments.is_empty());
    assert_eq!(cats.unclassified_samples, 3);
    assert_eq!(cats.elapsed_secs, 2.0);
}

#[test]
fn identical_timestamps_with_different_state_split() {
    let obs = vec![
        Observation::new(ts(5), Some(State::WORKING)),
        Observation::new(ts(5), Some(State::STOPPED)),
        Observation::new(ts(5), Some(State::STOPPED)),
    ];
    let segments = segment_runs(&obs);
    assert_eq!(segments.len(), 2);
    assert!(segments.iter().all(|s| s.duration_secs == 0.0));
    assert_eq!(segments[1].sample_count, 2);
}

// ============================================================================
// Randomized Properties
// ============================================================================

/// Random non-decreasing series with occasional gaps (None) and repeats.
fn random_series(rng: &mut StdRng, len: usize) -> Vec<Observation> {
    let mut t = 0i64;
    (0..len)
        .map(|_| {
            t += rng.gen_range(0..=3);
            let state = if rng.gen_bool(0.1) {
                None
            } else {
                Some(State::Category(rng.gen_range(0..3)))
            };
            Observation::new(ts(t), state)
        })
        .collect()
}

#[test]
fn segments_cover_classified_samples_exactly_once() {
    let mut rng = StdRng::seed_from_u64(0x7b3d);
    for round in 0..200 {
        let len = rng.gen_range(0..60);
        let obs = random_series(&mut rng, len);
        let segments = segment_runs(&obs);

        let mut covered = vec![0u32; obs.len()];
        for seg in &segments {
            assert!(seg.sample_count > 0, "round {round}: empty segment");
            assert_eq!(seg.start_time, obs[seg.first_index].timestamp);
            assert_eq!(seg.end_time, obs[seg.end_index() - 1].timestamp);
            assert!(seg.duration_secs >= 0.0);
            for (i, o) in obs.iter().enumerate().take(seg.end_index()).skip(seg.first_index) {
                assert_eq!(o.state, Some(seg.state), "round {round}: mixed run at {i}");
                covered[i] += 1;
            }
        }
        for (i, o) in obs.iter().enumerate() {
            let expected = u32::from(o.state.is_some());
            assert_eq!(covered[i], expected, "round {round}: sample {i}");
        }

        // ordered, non-overlapping, maximal
        for pair in segments.windows(2) {
            assert!(pair[0].end_index() <= pair[1].first_index);
            assert!(pair[0].end_time <= pair[1].start_time);
            if pair[0].end_index() == pair[1].first_index {
                assert_ne!(pair[0].state, pair[1].state, "round {round}: unmerged run");
            }
        }
    }
}

#[test]
fn resegmenting_boundaries_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        let len = rng.gen_range(1..40);
        let obs: Vec<_> = random_series(&mut rng, len)
            .into_iter()
            .filter(|o| o.state.is_some())
            .collect();
        let segments = segment_runs(&obs);
        assert_eq!(segment_runs(&obs), segments);

        let boundaries: Vec<Observation> = segments
            .iter()
            .flat_map(|s| {
                let first = Observation::new(s.start_time, Some(s.state));
                let last = Observation::new(s.end_time, Some(s.state));
                if s.sample_count > 1 {
                    vec![first, last]
                } else {
                    vec![first]
                }
            })
            .collect();
        assert_eq!(shape(&segment_runs(&boundaries)), shape(&segments));
    }
}

#[test]
fn exhaustive_grouping_sums_to_elapsed_only_without_gaps() {
    let mut rng = StdRng::seed_from_u64(7);
    let obs: Vec<_> = (0..50)
        .map(|i| Observation::new(ts(i * 10), Some(State::Flag(rng.gen_bool(0.5)))))
        .collect();
    let segments = segment_runs(&obs);
    let by_state = summarize_by_state(&segments, 60.0);

    let total: f64 = by_state.values().map(|s| s.total_duration_secs).sum();
    let boundary_gaps = 10.0 * (segments.len() - 1) as f64;
    // each boundary drops the inter-sample interval between two runs
    assert!((total + boundary_gaps - 490.0).abs() < 1e-9);
}
