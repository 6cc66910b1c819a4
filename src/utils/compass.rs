use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight compass points, each covering a 45° sector centred on its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinal {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

const SECTORS: [Cardinal; 8] = [
    Cardinal::N,
    Cardinal::NE,
    Cardinal::E,
    Cardinal::SE,
    Cardinal::S,
    Cardinal::SW,
    Cardinal::W,
    Cardinal::NW,
];

impl Cardinal {
    /// Map a bearing in degrees to its compass point. Bearings are wrapped into [0, 360),
    /// so both 0° and 360° give `N`. Non-finite input has no direction.
    ///
    /// # Examples
    /// ```
    /// use ais_trip_processor::utils::Cardinal;
    ///
    /// assert_eq!(Cardinal::from_degrees(10.0), Some(Cardinal::N));
    /// assert_eq!(Cardinal::from_degrees(46.0), Some(Cardinal::NE));
    /// ```
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }

        let wrapped = degrees.rem_euclid(360.0);
        let sector = ((wrapped + 22.5) / 45.0).floor() as usize % SECTORS.len();
        Some(SECTORS[sector])
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinal::N => "N",
            Cardinal::NE => "NE",
            Cardinal::E => "E",
            Cardinal::SE => "SE",
            Cardinal::S => "S",
            Cardinal::SW => "SW",
            Cardinal::W => "W",
            Cardinal::NW => "NW",
        }
    }
}

impl fmt::Display for Cardinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
