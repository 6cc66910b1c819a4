pub mod position_reader;
pub mod vessel_reader;
pub mod weather_reader;

pub use position_reader::{PositionReader, PositionRows, ReadStats};
pub use vessel_reader::VesselReader;
pub use weather_reader::WeatherReader;
