use crate::models::{WeatherAttributes, WeatherObservation};
use crate::utils::time_bucket::align_to_bucket;
use std::collections::HashMap;

/// Weather attributes keyed by (station id, aligned 3-hour bucket).
#[derive(Debug, Clone, Default)]
pub struct WeatherTimeTable {
    entries: HashMap<(u32, i64), WeatherAttributes>,
    overwritten: usize,
}

impl WeatherTimeTable {
    /// Build the table. Observations sharing a key overwrite earlier ones, so the last one in
    /// source order wins.
    pub fn build<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = WeatherObservation>,
    {
        let mut table = Self::default();
        for observation in observations {
            table.insert(observation);
        }
        table
    }

    pub fn insert(&mut self, observation: WeatherObservation) {
        let key = (observation.station_id, observation.bucket);
        if self.entries.insert(key, observation.attributes).is_some() {
            self.overwritten += 1;
        }
    }

    /// Weather for a station at a raw Unix timestamp, aligned with the same rule used at build
    /// time. `None` means no observation exists for that key.
    pub fn lookup(&self, station_id: u32, unix_seconds: i64) -> Option<&WeatherAttributes> {
        self.lookup_bucket(station_id, align_to_bucket(unix_seconds))
    }

    pub fn lookup_bucket(&self, station_id: u32, bucket: i64) -> Option<&WeatherAttributes> {
        self.entries.get(&(station_id, bucket))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of observations replaced by a later duplicate.
    pub fn overwritten(&self) -> usize {
        self.overwritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(station_id: u32, bucket: i64, temp_c: Option<f64>) -> WeatherObservation {
        WeatherObservation {
            station_id,
            bucket,
            attributes: WeatherAttributes {
                temp_c,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_lookup_aligns_query_time() {
        let table = WeatherTimeTable::build(vec![observation(1, 10_800, Some(12.5))]);

        assert_eq!(table.lookup(1, 10_800).and_then(|a| a.temp_c), Some(12.5));
        assert_eq!(table.lookup(1, 5_400).and_then(|a| a.temp_c), Some(12.5));
        assert_eq!(table.lookup(1, 16_199).and_then(|a| a.temp_c), Some(12.5));
        assert!(table.lookup(1, 5_399).is_none());
        assert!(table.lookup(2, 10_800).is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let table = WeatherTimeTable::build(vec![
            observation(1, 0, Some(10.0)),
            observation(1, 0, Some(11.0)),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.overwritten(), 1);
        assert_eq!(table.lookup_bucket(1, 0).and_then(|a| a.temp_c), Some(11.0));
    }

    #[test]
    fn test_miss_is_distinct_from_zero_weather() {
        let table = WeatherTimeTable::build(vec![observation(1, 0, Some(0.0))]);

        let hit = table.lookup(1, 0).expect("observation should exist");
        assert_eq!(hit.temp_c, Some(0.0));
        assert!(table.lookup(1, 10_800).is_none());
    }
}
