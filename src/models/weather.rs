use serde::{Deserialize, Serialize};

use crate::utils::constants::{KELVIN_OFFSET, METRIC_DECIMALS, PASCALS_PER_HECTOPASCAL};
use crate::utils::numeric::round_decimals;
use crate::utils::time_bucket::align_fractional;

/// One row of a weather source file, with raw units (Kelvin, Pa).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSourceRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: Option<f64>,
    pub temperature_k: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub visibility: Option<f64>,
    pub pressure_pa: Option<f64>,
    pub humidity: Option<f64>,
    pub gust: Option<f64>,
}

/// Weather attributes at store precision. Each one is independently optional: `None` means
/// the source had no value, which is not the same as a zero reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_dir: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

fn store(value: Option<f64>) -> Option<f64> {
    value.and_then(|v| round_decimals(v, METRIC_DECIMALS))
}

impl WeatherAttributes {
    /// Convert raw source units: Kelvin to Celsius, Pa to hPa, everything rounded to two
    /// decimals.
    pub fn from_source(record: &WeatherSourceRecord) -> Self {
        Self {
            temp_c: store(record.temperature_k.map(|k| k - KELVIN_OFFSET)),
            wind_speed: store(record.wind_speed),
            wind_dir: store(record.wind_direction),
            humidity: store(record.humidity),
            pressure: store(record.pressure_pa.map(|pa| pa / PASCALS_PER_HECTOPASCAL)),
            visibility: store(record.visibility),
            gust: store(record.gust),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }

    pub fn present_count(&self) -> usize {
        [
            self.temp_c,
            self.wind_speed,
            self.wind_dir,
            self.humidity,
            self.pressure,
            self.visibility,
            self.gust,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }
}

/// A weather observation keyed by station and aligned 3-hour bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub station_id: u32,
    pub bucket: i64,
    pub attributes: WeatherAttributes,
}

impl WeatherObservation {
    /// Build an observation for `station_id`; records without a usable timestamp have no
    /// bucket and yield `None`.
    pub fn from_source(station_id: u32, record: &WeatherSourceRecord) -> Option<Self> {
        let bucket = align_fractional(record.timestamp?)?;
        Some(Self {
            station_id,
            bucket,
            attributes: WeatherAttributes::from_source(record),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> WeatherSourceRecord {
        WeatherSourceRecord {
            longitude: 23.6,
            latitude: 37.9,
            timestamp: Some(1_546_300_800.0),
            temperature_k: Some(300.0),
            wind_speed: Some(5.123),
            wind_direction: Some(46.0),
            visibility: None,
            pressure_pa: Some(101_325.0),
            humidity: Some(0.0),
            gust: None,
        }
    }

    #[test]
    fn test_unit_conversion() {
        let attrs = WeatherAttributes::from_source(&record());
        assert_eq!(attrs.temp_c, Some(26.85));
        assert_eq!(attrs.pressure, Some(1013.25));
        assert_eq!(attrs.wind_speed, Some(5.12));
        assert_eq!(attrs.wind_dir, Some(46.0));
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let attrs = WeatherAttributes::from_source(&record());
        assert_eq!(attrs.visibility, None);
        assert_eq!(attrs.gust, None);
        // zero is a reading, not a gap
        assert_eq!(attrs.humidity, Some(0.0));
        assert_eq!(attrs.present_count(), 5);

        let json = serde_json::to_value(attrs).unwrap();
        assert!(json.get("visibility").is_none());
        assert_eq!(json["humidity"], 0.0);
    }

    #[test]
    fn test_observation_requires_timestamp() {
        let mut source = record();
        assert_eq!(
            WeatherObservation::from_source(3, &source).map(|o| o.bucket),
            Some(1_546_300_800)
        );

        source.timestamp = None;
        assert!(WeatherObservation::from_source(3, &source).is_none());
    }

    #[test]
    fn test_empty_attributes() {
        assert!(WeatherAttributes::default().is_empty());
        assert!(!WeatherAttributes::from_source(&record()).is_empty());
    }
}
