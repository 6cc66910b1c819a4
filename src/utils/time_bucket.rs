use crate::utils::constants::TIME_BUCKET_SECONDS;

/// Align a Unix timestamp (seconds) to the nearest 3-hour bucket.
///
/// Half-way points round up, so `5400` aligns to `10800`. The same rule is used when
/// building the weather table and when querying it.
///
/// # Examples
/// ```
/// use ais_trip_processor::utils::align_to_bucket;
///
/// assert_eq!(align_to_bucket(5_399), 0);
/// assert_eq!(align_to_bucket(5_400), 10_800);
/// ```
pub fn align_to_bucket(unix_seconds: i64) -> i64 {
    let half = TIME_BUCKET_SECONDS / 2;
    unix_seconds.saturating_add(half).div_euclid(TIME_BUCKET_SECONDS) * TIME_BUCKET_SECONDS
}

/// Align a fractional source timestamp. Flooring to whole seconds first never moves a value
/// across a bucket boundary because boundaries sit on whole seconds.
pub fn align_fractional(unix_seconds: f64) -> Option<i64> {
    if !unix_seconds.is_finite() {
        return None;
    }
    Some(align_to_bucket(unix_seconds.floor() as i64))
}
