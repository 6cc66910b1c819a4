use crate::error::{ProcessingError, Result};
use crate::models::WeatherSourceRecord;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use crate::utils::coordinates::is_valid_position;
use crate::utils::fields::parse_number;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct RawWeather {
    #[serde(default)]
    lon: Option<String>,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default, rename = "timestamp_")]
    timestamp: Option<String>,
    #[serde(default, rename = "TMP")]
    tmp: Option<String>,
    #[serde(default, rename = "WSPD")]
    wspd: Option<String>,
    #[serde(default, rename = "WDIRMET")]
    wdirmet: Option<String>,
    #[serde(default, rename = "VIS")]
    vis: Option<String>,
    #[serde(default, rename = "PRMSL")]
    prmsl: Option<String>,
    #[serde(default, rename = "RH")]
    rh: Option<String>,
    #[serde(default, rename = "GUST")]
    gust: Option<String>,
}

impl RawWeather {
    fn into_record(self) -> Option<WeatherSourceRecord> {
        let number = |raw: Option<String>| parse_number(raw.as_deref()).value();

        let longitude = number(self.lon)?;
        let latitude = number(self.lat)?;
        if !is_valid_position(longitude, latitude) {
            return None;
        }

        Some(WeatherSourceRecord {
            longitude,
            latitude,
            timestamp: number(self.timestamp),
            temperature_k: number(self.tmp),
            wind_speed: number(self.wspd),
            wind_direction: number(self.wdirmet),
            visibility: number(self.vis),
            pressure_pa: number(self.prmsl),
            humidity: number(self.rh),
            gust: number(self.gust),
        })
    }
}

/// Reader for gridded weather CSVs
/// (`lon,lat,timestamp_,TMP,WSPD,WDIRMET,VIS,PRMSL,RH,GUST`).
#[derive(Debug, Default)]
pub struct WeatherReader;

impl WeatherReader {
    pub fn new() -> Self {
        Self
    }

    /// Read every source that exists, in the order given. Missing files are skipped with a
    /// warning; having none at all is an error.
    pub fn read_sources(&self, paths: &[PathBuf]) -> Result<Vec<WeatherSourceRecord>> {
        let mut records = Vec::new();
        let mut found = 0;

        for path in paths {
            if !path.exists() {
                warn!("Weather source not found, skipping: {}", path.display());
                continue;
            }
            found += 1;
            records.extend(self.read_file(path)?);
        }

        if found == 0 {
            let first = paths.first().cloned().unwrap_or_default();
            return Err(ProcessingError::MissingInput(first));
        }

        info!(
            "Loaded {} weather rows from {} source(s)",
            records.len(),
            found
        );
        Ok(records)
    }

    pub fn read_file(&self, path: &Path) -> Result<Vec<WeatherSourceRecord>> {
        let file = File::open(path)?;
        self.read_from(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
    }

    /// Rows without usable coordinates, or with coordinates off the globe, are skipped. Rows
    /// without a timestamp are kept: they still define a station.
    pub fn read_from<R: Read>(&self, source: R) -> Result<Vec<WeatherSourceRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for row in reader.deserialize::<RawWeather>() {
            match row.ok().and_then(RawWeather::into_record) {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Skipped {} weather rows without usable coordinates", skipped);
        }
        Ok(records)
    }
}
