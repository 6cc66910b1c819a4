use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use std::fmt;

/// Round to `decimals` places using the decimal string representation, so the result is the
/// closest `f64` to the value a reader sees printed.
pub fn round_decimals(value: f64, decimals: usize) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    format!("{:.*}", decimals, value).parse::<f64>().ok()
}

/// Format with exactly `decimals` fractional digits, never in scientific notation.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// A finite number that serializes as a fixed-point JSON literal with `DECIMALS` digits,
/// e.g. `Fixed::<2>(10.0)` becomes `10.00` rather than `10.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Fixed<const DECIMALS: usize>(f64);

pub type Coordinate = Fixed<5>;
pub type Metric = Fixed<2>;

impl<const DECIMALS: usize> Fixed<DECIMALS> {
    pub const ZERO: Self = Self(0.0);

    pub fn new(value: f64) -> Option<Self> {
        round_decimals(value, DECIMALS).map(Self)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl<const DECIMALS: usize> fmt::Display for Fixed<DECIMALS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", DECIMALS, self.0)
    }
}

impl<const DECIMALS: usize> Serialize for Fixed<DECIMALS> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(self.to_string()).map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_decimals() {
        assert_eq!(round_decimals(300.0 - 273.15, 2), Some(26.85));
        assert_eq!(round_decimals(101_325.0 / 100.0, 2), Some(1013.25));
        assert_eq!(round_decimals(23.123456789, 5), Some(23.12346));
        assert_eq!(round_decimals(f64::INFINITY, 2), None);
    }

    #[test]
    fn test_formatting_round_trip_stays_within_half_unit() {
        let values = [
            0.0, 1.0 / 3.0, 2.0 / 3.0, 23.123_456_789, -0.000_004_9, 37.942_685_5, 359.999_9,
            1e-7, 12_345.678_91,
        ];
        for value in values {
            let five: f64 = format_fixed(value, 5).parse().unwrap();
            assert!((five - value).abs() <= 0.5e-5 + f64::EPSILON * value.abs());

            let two: f64 = format_fixed(value, 2).parse().unwrap();
            assert!((two - value).abs() <= 1e-2);
        }
    }

    #[test]
    fn test_fixed_serializes_with_exact_decimals() {
        let metric = Metric::new(10.0).unwrap();
        assert_eq!(serde_json::to_string(&metric).unwrap(), "10.00");

        let coord = Coordinate::new(23.6).unwrap();
        assert_eq!(serde_json::to_string(&coord).unwrap(), "23.60000");

        let tiny = Metric::new(1e-9).unwrap();
        assert_eq!(serde_json::to_string(&tiny).unwrap(), "0.00");
    }

    #[test]
    fn test_fixed_rejects_non_finite() {
        assert!(Metric::new(f64::NAN).is_none());
        assert!(Coordinate::new(f64::NEG_INFINITY).is_none());
    }
}
