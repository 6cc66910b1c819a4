pub mod pipeline;
pub mod position_cleaner;
pub mod run_summary;
pub mod station_index;
pub mod trip_assembler;
pub mod trip_segmenter;
pub mod weather_matcher;
pub mod weather_table;

pub use pipeline::{InputPaths, LoadedInputs, TripPipeline};
pub use position_cleaner::{CleaningStats, PositionCleaner};
pub use run_summary::RunSummary;
pub use station_index::StationIndex;
pub use trip_assembler::{AssemblyStats, TripAssembler, Trips};
pub use trip_segmenter::{SegmentState, Segmented, Segments, TripSegmenter};
pub use weather_matcher::{Batches, MatchStats, MatchedBatch, WeatherMatcher};
pub use weather_table::WeatherTimeTable;
