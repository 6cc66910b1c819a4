use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::weather::WeatherAttributes;
use crate::utils::compass::Cardinal;

/// One AIS position fix as delivered by the position reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselPosition {
    pub vessel_id: String,
    pub timestamp: DateTime<Utc>,
    pub longitude: f64,
    pub latitude: f64,
    pub speed: Option<f64>,
    pub course: Option<f64>,
    pub heading: Option<f64>,
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl VesselPosition {
    pub fn new(
        vessel_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        longitude: f64,
        latitude: f64,
    ) -> Self {
        Self {
            vessel_id: vessel_id.into(),
            timestamp,
            longitude,
            latitude,
            speed: None,
            course: None,
            heading: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_motion(mut self, speed: Option<f64>, course: Option<f64>, heading: Option<f64>) -> Self {
        self.speed = speed;
        self.course = course;
        self.heading = heading;
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<String>) -> Self {
        self.annotations = annotations;
        self
    }
}

/// A position with its nearest weather station and, when the station reported in the
/// matching 3-hour bucket, that weather.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPosition {
    pub position: VesselPosition,
    pub cell_id: u32,
    pub weather: Option<WeatherAttributes>,
    pub course_cardinal: Option<Cardinal>,
    pub wind_cardinal: Option<Cardinal>,
}

impl EnrichedPosition {
    pub fn has_weather(&self) -> bool {
        self.weather.is_some()
    }
}

/// Anything that can be placed on a per-vessel timeline.
pub trait VesselFix {
    fn vessel_id(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
}

impl VesselFix for VesselPosition {
    fn vessel_id(&self) -> &str {
        &self.vessel_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl VesselFix for EnrichedPosition {
    fn vessel_id(&self) -> &str {
        &self.position.vessel_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.position.timestamp
    }
}
