use chrono::{Datelike, Local};
use std::path::PathBuf;

fn date_stamp() -> String {
    let now = Local::now();
    format!("{:02}{:02}{:02}", now.year() % 100, now.month(), now.day())
}

/// Default trip output: output/trips-{YYMMDD}.jsonl
pub fn default_trips_filename() -> PathBuf {
    PathBuf::from("output").join(format!("trips-{}.jsonl", date_stamp()))
}

/// Default enriched position output: output/positions-weather-{YYMMDD}.csv
pub fn default_enriched_filename() -> PathBuf {
    PathBuf::from("output").join(format!("positions-weather-{}.csv", date_stamp()))
}

pub fn default_stations_filename() -> PathBuf {
    PathBuf::from("output").join(format!("stations-{}.json", date_stamp()))
}

pub fn default_vessels_filename() -> PathBuf {
    PathBuf::from("output").join(format!("vessels-{}.jsonl", date_stamp()))
}
