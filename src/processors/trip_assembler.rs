use crate::models::{
    EnrichedPosition, PointLocation, PointMetrics, TrajectoryPoint, Trip, TripDocument,
    VesselRegistry, WeatherAttributes, WeatherData,
};
use crate::processors::trip_segmenter::Segmented;
use crate::utils::compass::Cardinal;
use crate::utils::constants::{MAX_HEADING_DEGREES, MAX_SPEED_KNOTS};
use crate::utils::numeric::{Coordinate, Metric};
use std::iter::Fuse;
use std::ops::AddAssign;

/// Counters for corrections and drops made while assembling trips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub trips_emitted: usize,
    pub single_point_trips: usize,
    pub points_emitted: usize,
    pub speeds_clamped: usize,
    pub headings_nulled: usize,
}

impl AddAssign for AssemblyStats {
    fn add_assign(&mut self, other: Self) {
        self.trips_emitted += other.trips_emitted;
        self.single_point_trips += other.single_point_trips;
        self.points_emitted += other.points_emitted;
        self.speeds_clamped += other.speeds_clamped;
        self.headings_nulled += other.headings_nulled;
    }
}

/// Groups consecutive positions sharing a trip id into trips and formats each multi-point trip
/// as a [`TripDocument`].
///
/// Only the trip currently being built is held in memory. Speeds above the limit are replaced
/// by `0.00` and headings above the limit (AIS uses 511 for "unavailable") are dropped to null.
pub struct TripAssembler<'a> {
    registry: &'a VesselRegistry,
    max_speed: f64,
    max_heading: f64,
    current: Option<Trip>,
    stats: AssemblyStats,
}

impl<'a> TripAssembler<'a> {
    pub fn new(registry: &'a VesselRegistry) -> Self {
        Self {
            registry,
            max_speed: MAX_SPEED_KNOTS,
            max_heading: MAX_HEADING_DEGREES,
            current: None,
            stats: AssemblyStats::default(),
        }
    }

    pub fn with_limits(mut self, max_speed: f64, max_heading: f64) -> Self {
        self.max_speed = max_speed;
        self.max_heading = max_heading;
        self
    }

    pub fn stats(&self) -> AssemblyStats {
        self.stats
    }

    /// Feed the next position. Returns the previous trip's document when this position starts
    /// a new trip and the previous one had at least two points.
    pub fn push(&mut self, trip_id: u64, position: EnrichedPosition) -> Option<TripDocument> {
        if let Some(trip) = self.current.as_mut() {
            if trip.trip_id == trip_id {
                trip.push(position);
                return None;
            }
        }

        let finished = self.current.replace(Trip::new(trip_id, position));
        finished.and_then(|trip| self.format_trip(trip))
    }

    /// Flush the trip in progress at end of stream.
    pub fn finish(&mut self) -> Option<TripDocument> {
        self.current.take().and_then(|trip| self.format_trip(trip))
    }

    /// Lazily assemble a segmented stream into trip documents, in trip-id order.
    pub fn assemble<I>(self, segmented: I) -> Trips<'a, I::IntoIter>
    where
        I: IntoIterator<Item = Segmented<EnrichedPosition>>,
    {
        Trips {
            assembler: self,
            inner: segmented.into_iter().fuse(),
        }
    }

    /// Format a complete trip, or drop it if it has fewer than two points.
    pub fn format_trip(&mut self, trip: Trip) -> Option<TripDocument> {
        if !trip.is_multi_point() {
            self.stats.single_point_trips += 1;
            return None;
        }

        let start_time = trip.start_time()?;
        let end_time = trip.end_time()?;
        let registry = self.registry;
        let info = registry.info(&trip.vessel_id);

        let trajectory: Vec<TrajectoryPoint> = trip
            .trajectory
            .into_iter()
            .map(|point| self.format_point(point))
            .collect();

        self.stats.trips_emitted += 1;
        self.stats.points_emitted += trajectory.len();

        Some(TripDocument {
            trip_id: trip.trip_id,
            vessel_id: trip.vessel_id,
            country: info.country.to_string(),
            shiptype: info.shiptype,
            vessel_type_description: info.description.to_string(),
            start_time,
            end_time,
            point_count: trajectory.len(),
            trajectory,
        })
    }

    fn format_point(&mut self, point: EnrichedPosition) -> TrajectoryPoint {
        let EnrichedPosition {
            position,
            cell_id,
            weather,
            course_cardinal,
            wind_cardinal,
        } = point;

        let speed = position.speed.and_then(Metric::new).map(|speed| {
            if speed.value() > self.max_speed {
                self.stats.speeds_clamped += 1;
                Metric::ZERO
            } else {
                speed
            }
        });

        let heading = match position.heading {
            Some(h) if h > self.max_heading => {
                self.stats.headings_nulled += 1;
                None
            }
            other => other.and_then(Metric::new),
        };

        let location = PointLocation::point(
            Coordinate::new(position.longitude).unwrap_or(Coordinate::ZERO),
            Coordinate::new(position.latitude).unwrap_or(Coordinate::ZERO),
            cell_id,
        );

        TrajectoryPoint {
            timestamp: position.timestamp,
            location,
            metrics: PointMetrics {
                speed,
                course: position.course.and_then(Metric::new),
                heading,
                course_cardinal,
            },
            weather_data: weather_data(weather.as_ref(), wind_cardinal),
            annotations: position.annotations,
        }
    }
}

fn weather_data(
    weather: Option<&WeatherAttributes>,
    wind_cardinal: Option<Cardinal>,
) -> WeatherData {
    let Some(w) = weather else {
        return WeatherData::default();
    };

    WeatherData {
        temp_c: w.temp_c.and_then(Metric::new),
        wind_speed: w.wind_speed.and_then(Metric::new),
        wind_dir: w.wind_dir.and_then(Metric::new),
        humidity: w.humidity.and_then(Metric::new),
        pressure: w.pressure.and_then(Metric::new),
        visibility: w.visibility.and_then(Metric::new),
        gust: w.gust.and_then(Metric::new),
        wind_cardinal,
    }
}

/// Iterator returned by [`TripAssembler::assemble`].
pub struct Trips<'a, I> {
    assembler: TripAssembler<'a>,
    inner: Fuse<I>,
}

impl<I> Trips<'_, I> {
    pub fn stats(&self) -> AssemblyStats {
        self.assembler.stats()
    }
}

impl<I> Iterator for Trips<'_, I>
where
    I: Iterator<Item = Segmented<EnrichedPosition>>,
{
    type Item = TripDocument;

    fn next(&mut self) -> Option<Self::Item> {
        for segmented in self.inner.by_ref() {
            if let Some(doc) = self.assembler.push(segmented.trip_id, segmented.item) {
                return Some(doc);
            }
        }
        self.assembler.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VesselPosition, VesselStatic};
    use crate::processors::TripSegmenter;
    use chrono::{Duration, TimeZone, Utc};

    fn enriched(vessel: &str, minutes: i64, speed: Option<f64>, heading: Option<f64>) -> EnrichedPosition {
        let t0 = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        EnrichedPosition {
            position: VesselPosition::new(vessel, t0 + Duration::minutes(minutes), 23.645_678_9, 37.941_234_1)
                .with_motion(speed, Some(12.345), heading),
            cell_id: 3,
            weather: None,
            course_cardinal: Cardinal::from_degrees(12.345),
            wind_cardinal: None,
        }
    }

    fn assemble(registry: &VesselRegistry, positions: Vec<EnrichedPosition>) -> (Vec<TripDocument>, AssemblyStats) {
        let segmented = TripSegmenter::new(120).segment(positions);
        let mut trips = TripAssembler::new(registry).assemble(segmented);
        let docs: Vec<TripDocument> = trips.by_ref().collect();
        (docs, trips.stats())
    }

    #[test]
    fn test_excessive_speed_is_clamped_not_dropped() {
        let registry = VesselRegistry::new();
        let (docs, stats) = assemble(
            &registry,
            vec![enriched("V1", 0, Some(999.0), None), enriched("V1", 60, Some(10.0), None)],
        );

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].point_count, 2);
        assert_eq!(docs[0].trajectory[0].metrics.speed.map(|s| s.value()), Some(0.0));
        assert_eq!(docs[0].trajectory[1].metrics.speed.map(|s| s.value()), Some(10.0));
        assert_eq!(stats.speeds_clamped, 1);
    }

    #[test]
    fn test_single_point_trips_are_dropped() {
        let registry = VesselRegistry::new();
        let (docs, stats) = assemble(
            &registry,
            vec![enriched("V1", 0, Some(5.0), None), enriched("V1", 200, Some(5.0), None)],
        );

        assert!(docs.is_empty());
        assert_eq!(stats.single_point_trips, 2);
        assert_eq!(stats.trips_emitted, 0);
    }

    #[test]
    fn test_heading_above_limit_is_nulled() {
        let registry = VesselRegistry::new();
        let (docs, stats) = assemble(
            &registry,
            vec![
                enriched("V1", 0, None, Some(511.0)),
                enriched("V1", 1, None, Some(360.0)),
            ],
        );

        assert_eq!(docs[0].trajectory[0].metrics.heading, None);
        assert_eq!(docs[0].trajectory[1].metrics.heading.map(|h| h.value()), Some(360.0));
        assert_eq!(stats.headings_nulled, 1);
    }

    #[test]
    fn test_document_fields_and_rounding() {
        let registry: VesselRegistry = vec![VesselStatic {
            vessel_id: "V1".to_string(),
            country: "Malta".to_string(),
            shiptype: 70,
            description: "Cargo".to_string(),
        }]
        .into_iter()
        .collect();

        let (docs, _) = assemble(
            &registry,
            vec![enriched("V1", 0, Some(7.256), None), enriched("V1", 30, Some(7.0), None)],
        );
        let doc = &docs[0];

        assert_eq!(doc.trip_id, 1);
        assert_eq!(doc.country, "Malta");
        assert_eq!(doc.shiptype, 70);
        assert_eq!(doc.vessel_type_description, "Cargo");
        assert_eq!(doc.start_time, doc.trajectory[0].timestamp);
        assert_eq!(doc.end_time, doc.trajectory[1].timestamp);

        let json = serde_json::to_string(&doc.trajectory[0]).unwrap();
        assert!(json.contains(r#""coordinates":[23.64568,37.94123]"#), "{}", json);
        assert!(json.contains(r#""speed":7.26"#), "{}", json);
        // 12.345 is stored as 12.34500000000000063...
        assert!(json.contains(r#""course":12.35"#), "{}", json);
        assert!(json.contains(r#""course_cardinal":"N""#), "{}", json);
        assert!(json.contains(r#""weather_data":{}"#), "{}", json);
    }

    #[test]
    fn test_unknown_vessel_gets_placeholders() {
        let registry = VesselRegistry::new();
        let (docs, _) = assemble(
            &registry,
            vec![enriched("ghost", 0, None, None), enriched("ghost", 5, None, None)],
        );

        assert_eq!(docs[0].country, "Unknown");
        assert_eq!(docs[0].shiptype, 0);
        assert_eq!(docs[0].vessel_type_description, "N/A");
    }

    #[test]
    fn test_trips_emitted_in_trip_id_order() {
        let registry = VesselRegistry::new();
        let (docs, stats) = assemble(
            &registry,
            vec![
                enriched("A", 0, None, None),
                enriched("A", 10, None, None),
                enriched("A", 500, None, None),
                enriched("B", 0, None, None),
                enriched("B", 10, None, None),
                enriched("B", 20, None, None),
            ],
        );

        let ids: Vec<u64> = docs.iter().map(|d| d.trip_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(docs[1].point_count, 3);
        assert_eq!(stats.points_emitted, 5);
        assert_eq!(stats.single_point_trips, 1);
    }

    #[test]
    fn test_weather_data_only_present_attributes() {
        let weather = WeatherAttributes {
            temp_c: Some(26.85),
            wind_dir: Some(46.0),
            ..Default::default()
        };
        let data = weather_data(Some(&weather), Cardinal::from_degrees(46.0));
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"temp_c":26.85,"wind_dir":46.00,"wind_cardinal":"NE"}"#);
    }

    #[test]
    fn test_sub_second_fixes_keep_distinct_timestamps() {
        let registry = VesselRegistry::new();
        let at_millis = |millis: i64| {
            let mut fix = enriched("V1", 0, Some(5.0), None);
            fix.position.timestamp += Duration::milliseconds(millis);
            fix
        };

        let (docs, _) = assemble(&registry, vec![at_millis(100), at_millis(900)]);
        let json = serde_json::to_value(&docs[0]).unwrap();

        assert_eq!(json["trajectory"][0]["timestamp"], "2019-01-01T00:00:00.100Z");
        assert_eq!(json["trajectory"][1]["timestamp"], "2019-01-01T00:00:00.900Z");
        assert_eq!(json["start_time"], "2019-01-01T00:00:00.100Z");
    }
}
