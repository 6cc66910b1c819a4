/// Time alignment
pub const TIME_BUCKET_SECONDS: i64 = 10_800; // 3 hours

/// Segmentation defaults
pub const DEFAULT_GAP_THRESHOLD_MINUTES: i64 = 120;
pub const DEFAULT_BATCH_SIZE: usize = 500_000;

/// AIS domain bounds
pub const MAX_SPEED_KNOTS: f64 = 60.0;
pub const MAX_HEADING_DEGREES: f64 = 360.0;
pub const HEADING_NOT_AVAILABLE: f64 = 511.0;

/// Output precision
pub const COORDINATE_DECIMALS: usize = 5;
pub const METRIC_DECIMALS: usize = 2;

/// Unit conversion
pub const KELVIN_OFFSET: f64 = 273.15;
pub const PASCALS_PER_HECTOPASCAL: f64 = 100.0;

/// Vessel metadata fallbacks
pub const UNKNOWN_COUNTRY: &str = "Unknown";
pub const UNKNOWN_SHIPTYPE: i64 = 0;
pub const UNKNOWN_DESCRIPTION: &str = "N/A";
pub const UNKNOWN_TYPE_DESCRIPTION: &str = "Unknown Type";
pub const DEFAULT_TYPE_DESCRIPTION: &str = "Not available (default)";

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const WRITER_CHANNEL_CAPACITY: usize = 1024;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "AIS_TRIPS";
