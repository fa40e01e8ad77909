//! Run segmentation
//!
//! Splits an observation sequence into maximal runs of equal state in one
//! linear pass. A run closes when the state changes, when a sample without
//! state is reached, or at the end of input. Non-adjacent runs of the same
//! state are never merged.

use chrono::{DateTime, Utc};

use crate::types::{Observation, Segment, State};

/// Run being accumulated during the scan
struct OpenRun {
    state: State,
    first_index: usize,
    start: DateTime<Utc>,
    last: DateTime<Utc>,
    samples: usize,
}

impl OpenRun {
    const fn start(index: usize, timestamp: DateTime<Utc>, state: State) -> Self {
        Self {
            state,
            first_index: index,
            start: timestamp,
            last: timestamp,
            samples: 1,
        }
    }

    fn extend(&mut self, timestamp: DateTime<Utc>) {
        self.last = timestamp;
        self.samples += 1;
    }

    fn finish(self) -> Segment {
        Segment::new(self.state, self.start, self.last, self.first_index, self.samples)
    }
}

/// Partition `observations` into equal-state runs, in input order.
///
/// Every observation with a state lands in exactly one segment; observations
/// without state land in none. Equal timestamps with different states still
/// produce a boundary (zero-duration segments are allowed).
pub fn segment_runs(observations: &[Observation]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut active: Option<OpenRun> = None;

    for (index, obs) in observations.iter().enumerate() {
        let Some(state) = obs.state else {
            if let Some(run) = active.take() {
                segments.push(run.finish());
            }
            continue;
        };

        match &mut active {
            Some(run) if run.state == state => run.extend(obs.timestamp),
            slot => {
                if let Some(done) = slot.replace(OpenRun::start(index, obs.timestamp, state)) {
                    segments.push(done.finish());
                }
            }
        }
    }

    if let Some(run) = active {
        segments.push(run.finish());
    }

    segments
}

/// Segments whose state equals `state`, preserving order.
pub fn segments_in_state(segments: &[Segment], state: State) -> impl Iterator<Item = &Segment> {
    segments.iter().filter(move |s| s.state == state)
}
