use crate::models::VesselPosition;
use crate::utils::constants::HEADING_NOT_AVAILABLE;
use chrono::{DateTime, Utc};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub outside_window: usize,
    pub duplicates_removed: usize,
    pub headings_unavailable: usize,
}

/// Prepares raw positions for segmentation: optional time window, AIS "heading not available"
/// marker, ordering by (vessel id, timestamp), and removal of repeated fixes.
#[derive(Debug, Clone, Default)]
pub struct PositionCleaner {
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
}

impl PositionCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep positions with `since <= t < until`; either bound may be open.
    pub fn with_window(mut self, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    fn in_window(&self, timestamp: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| timestamp >= since)
            && self.until.map_or(true, |until| timestamp < until)
    }

    /// Window filter and heading marker for a single position, without reordering. Returns
    /// `None` for positions outside the window.
    pub fn normalize(&self, mut position: VesselPosition, stats: &mut CleaningStats) -> Option<VesselPosition> {
        if !self.in_window(position.timestamp) {
            stats.outside_window += 1;
            return None;
        }
        if position.heading == Some(HEADING_NOT_AVAILABLE) {
            position.heading = None;
            stats.headings_unavailable += 1;
        }
        Some(position)
    }

    /// Clean and sort for segmentation. For fixes sharing a vessel id and timestamp the first in
    /// input order is kept.
    pub fn clean(&self, positions: Vec<VesselPosition>) -> (Vec<VesselPosition>, CleaningStats) {
        let mut stats = CleaningStats::default();

        let mut kept: Vec<VesselPosition> = positions
            .into_iter()
            .filter_map(|p| self.normalize(p, &mut stats))
            .collect();

        // stable: equal keys keep input order, so dedup_by keeps the first
        kept.sort_by(|a, b| {
            a.vessel_id
                .cmp(&b.vessel_id)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });

        let before = kept.len();
        kept.dedup_by(|later, earlier| {
            later.vessel_id == earlier.vessel_id && later.timestamp == earlier.timestamp
        });
        stats.duplicates_removed = before - kept.len();

        debug!(
            "Cleaned positions: {} kept, {} outside window, {} duplicates",
            kept.len(),
            stats.outside_window,
            stats.duplicates_removed
        );

        (kept, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(vessel: &str, minutes: i64) -> VesselPosition {
        let t0 = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        VesselPosition::new(vessel, t0 + Duration::minutes(minutes), 23.6, 37.9)
    }

    #[test]
    fn test_sorts_by_vessel_then_time() {
        let (cleaned, _) = PositionCleaner::new().clean(vec![
            at("b", 5),
            at("a", 10),
            at("b", 1),
            at("a", 2),
        ]);

        let order: Vec<(String, i64)> = cleaned
            .iter()
            .map(|p| (p.vessel_id.clone(), p.timestamp.timestamp() / 60 % 1000))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a".to_string(), 2),
                ("a".to_string(), 10),
                ("b".to_string(), 1),
                ("b".to_string(), 5)
            ]
        );
    }

    #[test]
    fn test_duplicate_fixes_keep_first() {
        let first = at("a", 0).with_motion(Some(1.0), None, None);
        let second = at("a", 0).with_motion(Some(2.0), None, None);

        let (cleaned, stats) = PositionCleaner::new().clean(vec![first, at("a", 5), second]);

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].speed, Some(1.0));
        assert_eq!(stats.duplicates_removed, 1);
    }

    #[test]
    fn test_unavailable_heading_marker() {
        let (cleaned, stats) = PositionCleaner::new().clean(vec![
            at("a", 0).with_motion(None, None, Some(511.0)),
            at("a", 1).with_motion(None, None, Some(90.0)),
        ]);

        assert_eq!(cleaned[0].heading, None);
        assert_eq!(cleaned[1].heading, Some(90.0));
        assert_eq!(stats.headings_unavailable, 1);
    }

    #[test]
    fn test_time_window() {
        let t0 = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let cleaner = PositionCleaner::new().with_window(
            Some(t0 + Duration::minutes(5)),
            Some(t0 + Duration::minutes(10)),
        );

        let (cleaned, stats) = cleaner.clean(vec![at("a", 4), at("a", 5), at("a", 9), at("a", 10)]);

        assert_eq!(cleaned.len(), 2);
        assert_eq!(stats.outside_window, 2);
    }

    #[test]
    fn test_normalize_keeps_duplicates_for_streaming() {
        let cleaner = PositionCleaner::new();
        let mut stats = CleaningStats::default();

        let kept: Vec<VesselPosition> = vec![at("z", 0), at("a", 0), at("z", 0).with_motion(None, None, Some(511.0))]
            .into_iter()
            .filter_map(|p| cleaner.normalize(p, &mut stats))
            .collect();

        let ids: Vec<&str> = kept.iter().map(|p| p.vessel_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "z"]);
        assert_eq!(kept[2].heading, None);
        assert_eq!(stats.headings_unavailable, 1);
        assert_eq!(stats.duplicates_removed, 0);
    }
}
