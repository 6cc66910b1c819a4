use crate::error::Result;
use crate::models::VesselPosition;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use crate::utils::coordinates::is_valid_position;
use crate::utils::fields::{parse_annotations, parse_number, parse_timestamp};
use memmap2::Mmap;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::ops::AddAssign;
use std::path::Path;
use tracing::{debug, info};

/// Row-level outcome counts for a positions file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub fields_nulled: usize,
    pub annotation_fallbacks: usize,
}

impl AddAssign for ReadStats {
    fn add_assign(&mut self, other: Self) {
        self.rows_read += other.rows_read;
        self.rows_rejected += other.rows_rejected;
        self.fields_nulled += other.fields_nulled;
        self.annotation_fallbacks += other.annotation_fallbacks;
    }
}

// Every column is read as text so one bad cell never fails the whole row.
#[derive(Debug, Deserialize)]
struct RawPosition {
    #[serde(default)]
    vessel_id: Option<String>,
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    lon: Option<String>,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    speed: Option<String>,
    #[serde(default)]
    course: Option<String>,
    #[serde(default)]
    heading: Option<String>,
    #[serde(default)]
    annotations: Option<String>,
}

/// Reader for AIS dynamic CSV files (`vessel_id,t,lon,lat,speed,course,heading[,annotations]`).
pub struct PositionReader {
    use_mmap: bool,
}

impl PositionReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Open `path` for streaming. Rows are parsed one at a time as the iterator advances.
    pub fn open(&self, path: &Path) -> Result<PositionRows<Box<dyn Read + Send>>> {
        let file = File::open(path)?;

        let source: Box<dyn Read + Send> = if self.use_mmap {
            let mmap = unsafe { Mmap::map(&file)? };
            Box::new(Cursor::new(mmap))
        } else {
            Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
        };

        debug!("Streaming positions from {}", path.display());
        Ok(self.rows(source))
    }

    /// Stream positions from any CSV source with a header row.
    pub fn rows<R: Read>(&self, source: R) -> PositionRows<R> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        PositionRows {
            records: reader.into_deserialize(),
            stats: ReadStats::default(),
        }
    }

    /// Read the whole file into memory.
    pub fn read_positions(&self, path: &Path) -> Result<(Vec<VesselPosition>, ReadStats)> {
        let mut rows = self.open(path)?;
        let positions: Vec<VesselPosition> = rows.by_ref().collect();
        let stats = rows.stats();

        info!(
            "Read {} positions from {} ({} rejected)",
            positions.len(),
            path.display(),
            stats.rows_rejected
        );
        Ok((positions, stats))
    }

    pub fn read_from<R: Read>(&self, source: R) -> Result<(Vec<VesselPosition>, ReadStats)> {
        let mut rows = self.rows(source);
        let positions = rows.by_ref().collect();
        Ok((positions, rows.stats()))
    }
}

/// Parsed positions in file order. Rejected rows are skipped and counted in [`ReadStats`].
pub struct PositionRows<R: Read> {
    records: csv::DeserializeRecordsIntoIter<R, RawPosition>,
    stats: ReadStats,
}

impl<R: Read> PositionRows<R> {
    /// Counts for the rows consumed so far.
    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    fn parse_row(row: RawPosition, stats: &mut ReadStats) -> Option<VesselPosition> {
        let vessel_id = row.vessel_id.filter(|id| !id.is_empty())?;
        let timestamp = parse_timestamp(row.t.as_deref()?)?;
        let longitude = parse_number(row.lon.as_deref()).value()?;
        let latitude = parse_number(row.lat.as_deref()).value()?;
        if !is_valid_position(longitude, latitude) {
            return None;
        }

        let mut optional = |raw: Option<&str>| {
            let field = parse_number(raw);
            if field.is_malformed() {
                stats.fields_nulled += 1;
            }
            field.value()
        };
        let speed = optional(row.speed.as_deref());
        let course = optional(row.course.as_deref());
        let heading = optional(row.heading.as_deref());

        let annotations = parse_annotations(row.annotations.as_deref()).unwrap_or_else(|| {
            stats.annotation_fallbacks += 1;
            Vec::new()
        });

        Some(
            VesselPosition::new(vessel_id, timestamp, longitude, latitude)
                .with_motion(speed, course, heading)
                .with_annotations(annotations),
        )
    }
}

impl<R: Read> Iterator for PositionRows<R> {
    type Item = VesselPosition;

    fn next(&mut self) -> Option<VesselPosition> {
        for row in self.records.by_ref() {
            self.stats.rows_read += 1;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    debug!("Skipping unreadable row {}: {}", self.stats.rows_read + 1, e);
                    self.stats.rows_rejected += 1;
                    continue;
                }
            };

            match Self::parse_row(row, &mut self.stats) {
                Some(position) => return Some(position),
                None => self.stats.rows_rejected += 1,
            }
        }
        None
    }
}

impl Default for PositionReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "vessel_id,t,lon,lat,speed,course,heading,annotations
v1,1546300800000,23.6,37.9,10.5,90,511,\"['anchored']\"
v1,2019-01-01T01:00:00,23.7,37.95,abc,,45,
v2,2019-01-01 02:00:00+00:00,24.0,38.0,5,180,180,[broken
,1546300800000,23.6,37.9,1,1,1,
v3,not-a-time,23.6,37.9,1,1,1,
v4,1546300800000,200.0,37.9,1,1,1,
";

    #[test]
    fn test_read_positions() {
        let (positions, stats) = PositionReader::new().read_from(SAMPLE.as_bytes()).unwrap();

        assert_eq!(positions.len(), 3);
        assert_eq!(stats.rows_read, 6);
        assert_eq!(stats.rows_rejected, 3);

        let first = &positions[0];
        assert_eq!(first.timestamp, Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(first.speed, Some(10.5));
        assert_eq!(first.heading, Some(511.0));
        assert_eq!(first.annotations, vec!["anchored".to_string()]);

        let second = &positions[1];
        assert_eq!(second.timestamp, Utc.with_ymd_and_hms(2019, 1, 1, 1, 0, 0).unwrap());
        assert_eq!(second.speed, None);
        assert_eq!(second.course, None);
        assert_eq!(stats.fields_nulled, 1);
    }

    #[test]
    fn test_malformed_annotations_become_empty() {
        let (positions, stats) = PositionReader::new().read_from(SAMPLE.as_bytes()).unwrap();

        assert!(positions[2].annotations.is_empty());
        assert_eq!(stats.annotation_fallbacks, 1);
    }

    #[test]
    fn test_missing_optional_columns() {
        let csv = "vessel_id,t,lon,lat\nv1,1546300800000,23.6,37.9\n";
        let (positions, stats) = PositionReader::new().read_from(csv.as_bytes()).unwrap();

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].speed, None);
        assert!(positions[0].annotations.is_empty());
        assert_eq!(stats.rows_rejected, 0);
    }

    #[test]
    fn test_mmap_matches_buffered() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let (buffered, _) = PositionReader::new().read_positions(file.path()).unwrap();
        let (mapped, _) = PositionReader::with_mmap(true).read_positions(file.path()).unwrap();

        assert_eq!(buffered, mapped);
    }

    #[test]
    fn test_rows_stream_in_file_order() {
        let mut rows = PositionReader::new().rows(SAMPLE.as_bytes());

        assert_eq!(rows.next().map(|p| p.vessel_id), Some("v1".to_string()));
        assert_eq!(rows.stats().rows_read, 1);

        let rest: Vec<String> = rows.by_ref().map(|p| p.vessel_id).collect();
        assert_eq!(rest, vec!["v1".to_string(), "v2".to_string()]);
        assert_eq!(rows.stats().rows_read, 6);
        assert_eq!(rows.stats().rows_rejected, 3);
    }
}
