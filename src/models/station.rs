use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A deduplicated weather observation site. `cell_id` is assigned when the station index is
/// built and is only stable for that build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WeatherStation {
    pub cell_id: u32,

    #[serde(rename = "lon")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[serde(rename = "lat")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
}

impl WeatherStation {
    pub fn new(cell_id: u32, longitude: f64, latitude: f64) -> Self {
        Self {
            cell_id,
            longitude,
            latitude,
        }
    }

    pub fn point(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl RTreeObject for WeatherStation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point())
    }
}

// Planar distance in (lon, lat) degrees; no geodesic correction.
impl PointDistance for WeatherStation {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.longitude - point[0];
        let dy = self.latitude - point[1];
        dx * dx + dy * dy
    }
}
