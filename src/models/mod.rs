pub mod position;
pub mod station;
pub mod trip;
pub mod vessel;
pub mod weather;

pub use position::{EnrichedPosition, VesselFix, VesselPosition};
pub use station::WeatherStation;
pub use trip::{PointLocation, PointMetrics, TrajectoryPoint, Trip, TripDocument, WeatherData};
pub use vessel::{TypeInfo, VesselDocument, VesselInfo, VesselRegistry, VesselStatic, UNKNOWN_VESSEL};
pub use weather::{WeatherAttributes, WeatherObservation, WeatherSourceRecord};
