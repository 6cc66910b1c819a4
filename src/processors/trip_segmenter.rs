use crate::models::VesselFix;
use crate::utils::constants::DEFAULT_GAP_THRESHOLD_MINUTES;
use chrono::{DateTime, Duration, Utc};

/// Splits a (vessel id, timestamp)-sorted stream into trips.
///
/// A new trip starts at every vessel change and whenever the time since that vessel's previous
/// fix exceeds the gap threshold. Trip ids come from one counter over the whole stream, starting
/// at 1, so they never repeat across vessels.
///
/// The input must already be sorted; unsorted input gives meaningless boundaries.
#[derive(Debug, Clone, Copy)]
pub struct TripSegmenter {
    gap_threshold: Duration,
}

impl TripSegmenter {
    pub fn new(gap_threshold_minutes: i64) -> Self {
        Self {
            gap_threshold: Duration::minutes(gap_threshold_minutes),
        }
    }

    pub fn gap_threshold(&self) -> Duration {
        self.gap_threshold
    }

    /// Fresh accumulator for a sequential pass.
    pub fn start(&self) -> SegmentState {
        SegmentState {
            gap_threshold: self.gap_threshold,
            last_vessel: None,
            last_timestamp: None,
            trip_id: 0,
        }
    }

    /// Tag every item of `fixes` with its trip id.
    pub fn segment<I>(&self, fixes: I) -> Segments<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: VesselFix,
    {
        Segments {
            inner: fixes.into_iter(),
            state: self.start(),
        }
    }
}

impl Default for TripSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_GAP_THRESHOLD_MINUTES)
    }
}

/// Fold state carried through the scan: (last vessel, last timestamp, current trip id).
#[derive(Debug, Clone)]
pub struct SegmentState {
    gap_threshold: Duration,
    last_vessel: Option<String>,
    last_timestamp: Option<DateTime<Utc>>,
    trip_id: u64,
}

impl SegmentState {
    /// Advance over one fix and return the trip id it belongs to.
    pub fn assign<F: VesselFix>(&mut self, fix: &F) -> u64 {
        let timestamp = fix.timestamp();
        let same_vessel = self.last_vessel.as_deref() == Some(fix.vessel_id());

        let continues = same_vessel
            && self
                .last_timestamp
                .is_some_and(|last| timestamp - last <= self.gap_threshold);

        if !continues {
            self.trip_id += 1;
            if !same_vessel {
                self.last_vessel = Some(fix.vessel_id().to_string());
            }
        }

        self.last_timestamp = Some(timestamp);
        self.trip_id
    }

    /// Number of trips started so far.
    pub fn trips_started(&self) -> u64 {
        self.trip_id
    }
}

/// A value tagged with its trip id.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmented<T> {
    pub trip_id: u64,
    pub item: T,
}

/// Iterator adapter returned by [`TripSegmenter::segment`].
pub struct Segments<I> {
    inner: I,
    state: SegmentState,
}

impl<I> Segments<I> {
    pub fn trips_started(&self) -> u64 {
        self.state.trips_started()
    }
}

impl<I> Iterator for Segments<I>
where
    I: Iterator,
    I::Item: VesselFix,
{
    type Item = Segmented<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        let trip_id = self.state.assign(&item);
        Some(Segmented { trip_id, item })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
