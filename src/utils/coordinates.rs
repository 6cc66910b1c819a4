use crate::utils::constants::COORDINATE_DECIMALS;

/// Truncate a coordinate to `decimals` places without rounding.
///
/// Works on the decimal representation, so values such as `1.12345` (stored as
/// `1.1234499999…`) keep their last printed digit.
///
/// # Examples
/// ```
/// use ais_trip_processor::utils::truncate_decimal_string;
///
/// assert_eq!(truncate_decimal_string(23.6459999, 5), "23.64599");
/// assert_eq!(truncate_decimal_string(1.12345, 5), "1.12345");
/// ```
pub fn truncate_decimal_string(value: f64, decimals: usize) -> String {
    let expanded = format!("{:.*}", decimals + 4, value);
    let cut = match expanded.find('.') {
        Some(dot) => &expanded[..dot + 1 + decimals],
        None => expanded.as_str(),
    };

    // "-0.00000" and "0.00000" are the same location
    if cut.starts_with('-') && cut[1..].chars().all(|c| c == '0' || c == '.') {
        cut[1..].to_string()
    } else {
        cut.to_string()
    }
}

/// Key identifying a station location: both axes truncated to five decimals.
pub fn coordinate_key(longitude: f64, latitude: f64) -> String {
    format!(
        "{}_{}",
        truncate_decimal_string(longitude, COORDINATE_DECIMALS),
        truncate_decimal_string(latitude, COORDINATE_DECIMALS)
    )
}

/// Truncated coordinate as a number.
pub fn truncate_coordinate(value: f64) -> f64 {
    truncate_decimal_string(value, COORDINATE_DECIMALS)
        .parse()
        .unwrap_or(value)
}

/// WGS84 bounds check; the pipeline works in plain (lon, lat) degrees.
pub fn is_valid_position(longitude: f64, latitude: f64) -> bool {
    longitude.is_finite()
        && latitude.is_finite()
        && (-180.0..=180.0).contains(&longitude)
        && (-90.0..=90.0).contains(&latitude)
}
