use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::models::position::EnrichedPosition;
use crate::utils::compass::Cardinal;
use crate::utils::numeric::{Coordinate, Metric};

/// A maximal run of one vessel's positions without an excessive time gap.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub trip_id: u64,
    pub vessel_id: String,
    pub trajectory: Vec<EnrichedPosition>,
}

impl Trip {
    pub fn new(trip_id: u64, first: EnrichedPosition) -> Self {
        Self {
            trip_id,
            vessel_id: first.position.vessel_id.clone(),
            trajectory: vec![first],
        }
    }

    pub fn push(&mut self, position: EnrichedPosition) {
        self.trajectory.push(position);
    }

    pub fn point_count(&self) -> usize {
        self.trajectory.len()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.trajectory.first().map(|p| p.position.timestamp)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.trajectory.last().map(|p| p.position.timestamp)
    }

    /// A trip needs movement: a single fix is not a trip.
    pub fn is_multi_point(&self) -> bool {
        self.point_count() >= 2
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Fully formatted trip, ready for the document store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripDocument {
    pub trip_id: u64,
    pub vessel_id: String,
    pub country: String,
    pub shiptype: i64,
    pub vessel_type_description: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub end_time: DateTime<Utc>,
    pub point_count: usize,
    pub trajectory: Vec<TrajectoryPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub location: PointLocation,
    pub metrics: PointMetrics,
    pub weather_data: WeatherData,
    pub annotations: Vec<String>,
}

/// GeoJSON point plus the id of the weather station it was matched to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointLocation {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [Coordinate; 2],
    pub cell_id: u32,
}

impl PointLocation {
    pub fn point(longitude: Coordinate, latitude: Coordinate, cell_id: u32) -> Self {
        Self {
            kind: "Point",
            coordinates: [longitude, latitude],
            cell_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointMetrics {
    pub speed: Option<Metric>,
    pub course: Option<Metric>,
    pub heading: Option<Metric>,
    pub course_cardinal: Option<Cardinal>,
}

/// Only the attributes the matched observation actually had.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_c: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_dir: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gust: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_cardinal: Option<Cardinal>,
}
