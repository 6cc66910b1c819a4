use crate::error::Result;
use crate::models::WeatherStation;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the station lookup as a JSON array of `{cell_id, lon, lat}`.
pub fn write_stations(path: &Path, stations: &[WeatherStation]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, stations)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
