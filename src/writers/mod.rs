pub mod enriched_writer;
pub mod json_writer;
pub mod station_writer;

pub use enriched_writer::EnrichedCsvWriter;
pub use json_writer::{write_json_lines, JsonLinesWriter};
pub use station_writer::write_stations;
