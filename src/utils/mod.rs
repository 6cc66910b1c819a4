pub mod compass;
pub mod constants;
pub mod coordinates;
pub mod fields;
pub mod filename;
pub mod numeric;
pub mod progress;
pub mod time_bucket;

pub use compass::Cardinal;
pub use constants::*;
pub use coordinates::{coordinate_key, is_valid_position, truncate_coordinate, truncate_decimal_string};
pub use fields::{parse_annotations, parse_number, parse_timestamp, FieldValue};
pub use filename::{
    default_enriched_filename, default_stations_filename, default_trips_filename,
    default_vessels_filename,
};
pub use numeric::{format_fixed, round_decimals, Coordinate, Fixed, Metric};
pub use progress::ProgressReporter;
pub use time_bucket::{align_fractional, align_to_bucket};
