use crate::processors::position_cleaner::CleaningStats;
use crate::processors::trip_assembler::AssemblyStats;
use crate::processors::weather_matcher::MatchStats;
use crate::readers::ReadStats;
use std::ops::AddAssign;

/// Cumulative counters for one run. Anomalies that are corrected rather than fatal end up here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub positions_read: usize,
    pub rows_rejected: usize,
    pub fields_nulled: usize,
    pub annotation_fallbacks: usize,
    pub outside_window: usize,
    pub duplicates_removed: usize,
    pub headings_unavailable: usize,
    pub weather_matches: usize,
    pub weather_misses: usize,
    pub trips_segmented: u64,
    pub trips_emitted: usize,
    pub single_point_trips: usize,
    pub points_emitted: usize,
    pub speeds_clamped: usize,
    pub headings_nulled: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&mut self, stats: &ReadStats) {
        self.positions_read += stats.rows_read;
        self.rows_rejected += stats.rows_rejected;
        self.fields_nulled += stats.fields_nulled;
        self.annotation_fallbacks += stats.annotation_fallbacks;
    }

    pub fn record_cleaning(&mut self, stats: &CleaningStats) {
        self.outside_window += stats.outside_window;
        self.duplicates_removed += stats.duplicates_removed;
        self.headings_unavailable += stats.headings_unavailable;
    }

    pub fn record_matching(&mut self, stats: &MatchStats) {
        self.weather_matches += stats.matched;
        self.weather_misses += stats.misses;
    }

    pub fn record_assembly(&mut self, stats: &AssemblyStats) {
        self.trips_emitted += stats.trips_emitted;
        self.single_point_trips += stats.single_point_trips;
        self.points_emitted += stats.points_emitted;
        self.speeds_clamped += stats.speeds_clamped;
        self.headings_nulled += stats.headings_nulled;
    }

    /// Share of enriched positions that found an observation, in percent.
    pub fn match_rate(&self) -> f64 {
        let total = self.weather_matches + self.weather_misses;
        if total == 0 {
            0.0
        } else {
            100.0 * self.weather_matches as f64 / total as f64
        }
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Trip Processing Summary ===\n");
        summary.push_str(&format!("Positions Read: {}\n", self.positions_read));
        summary.push_str(&format!("Rows Rejected: {}\n", self.rows_rejected));
        summary.push_str(&format!("Fields Nulled: {}\n", self.fields_nulled));
        summary.push_str(&format!(
            "Annotation Fallbacks: {}\n",
            self.annotation_fallbacks
        ));
        summary.push_str(&format!("Outside Time Window: {}\n", self.outside_window));
        summary.push_str(&format!("Duplicates Removed: {}\n", self.duplicates_removed));

        summary.push_str("\nWeather:\n");
        summary.push_str(&format!(
            "  Matched: {} ({:.1}%)\n",
            self.weather_matches,
            self.match_rate()
        ));
        summary.push_str(&format!("  Lookup Misses: {}\n", self.weather_misses));

        summary.push_str("\nTrips:\n");
        summary.push_str(&format!("  Segmented: {}\n", self.trips_segmented));
        summary.push_str(&format!("  Emitted: {}\n", self.trips_emitted));
        summary.push_str(&format!(
            "  Single-Point Dropped: {}\n",
            self.single_point_trips
        ));
        summary.push_str(&format!("  Points Emitted: {}\n", self.points_emitted));

        summary.push_str("\nCorrections:\n");
        summary.push_str(&format!("  Speeds Clamped: {}\n", self.speeds_clamped));
        summary.push_str(&format!(
            "  Headings Nulled: {}\n",
            self.headings_nulled + self.headings_unavailable
        ));

        summary
    }
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, other: Self) {
        self.positions_read += other.positions_read;
        self.rows_rejected += other.rows_rejected;
        self.fields_nulled += other.fields_nulled;
        self.annotation_fallbacks += other.annotation_fallbacks;
        self.outside_window += other.outside_window;
        self.duplicates_removed += other.duplicates_removed;
        self.headings_unavailable += other.headings_unavailable;
        self.weather_matches += other.weather_matches;
        self.weather_misses += other.weather_misses;
        self.trips_segmented += other.trips_segmented;
        self.trips_emitted += other.trips_emitted;
        self.single_point_trips += other.single_point_trips;
        self.points_emitted += other.points_emitted;
        self.speeds_clamped += other.speeds_clamped;
        self.headings_nulled += other.headings_nulled;
    }
}
