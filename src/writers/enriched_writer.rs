use crate::error::Result;
use crate::models::EnrichedPosition;
use crate::utils::compass::Cardinal;
use crate::utils::constants::{COORDINATE_DECIMALS, DEFAULT_BUFFER_SIZE, METRIC_DECIMALS};
use crate::utils::numeric::format_fixed;
use chrono::SecondsFormat;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const ENRICHED_HEADER: [&str; 17] = [
    "vessel_id",
    "t",
    "lon",
    "lat",
    "speed",
    "course",
    "heading",
    "cell_id",
    "course_cardinal",
    "temp_c",
    "wind_speed",
    "wind_dir",
    "humidity",
    "pressure",
    "visibility",
    "gust",
    "wind_cardinal",
];

fn metric(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format_fixed(v, METRIC_DECIMALS))
        .unwrap_or_default()
}

fn cardinal(value: Option<Cardinal>) -> String {
    value.map(|c| c.as_str().to_string()).unwrap_or_default()
}

/// CSV of enriched positions in input order. Absent values are empty cells.
pub struct EnrichedCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl EnrichedCsvWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, File::create(path)?);
        Self::from_writer(file)
    }
}

impl<W: Write> EnrichedCsvWriter<W> {
    pub fn from_writer(inner: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(ENRICHED_HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_batch(&mut self, positions: &[EnrichedPosition]) -> Result<()> {
        for position in positions {
            self.write_position(position)?;
        }
        Ok(())
    }

    pub fn write_position(&mut self, enriched: &EnrichedPosition) -> Result<()> {
        let p = &enriched.position;
        let weather = enriched.weather.unwrap_or_default();

        self.writer.write_record([
            p.vessel_id.clone(),
            p.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            format_fixed(p.longitude, COORDINATE_DECIMALS),
            format_fixed(p.latitude, COORDINATE_DECIMALS),
            metric(p.speed),
            metric(p.course),
            metric(p.heading),
            enriched.cell_id.to_string(),
            cardinal(enriched.course_cardinal),
            metric(weather.temp_c),
            metric(weather.wind_speed),
            metric(weather.wind_dir),
            metric(weather.humidity),
            metric(weather.pressure),
            metric(weather.visibility),
            metric(weather.gust),
            cardinal(enriched.wind_cardinal),
        ])?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the number of data rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}
