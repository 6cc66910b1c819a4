use crate::error::Result;
use crate::models::{VesselRegistry, VesselStatic};
use crate::utils::constants::{UNKNOWN_COUNTRY, UNKNOWN_SHIPTYPE, UNKNOWN_TYPE_DESCRIPTION};
use crate::utils::fields::parse_number;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RawStatic {
    #[serde(default)]
    vessel_id: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    shiptype: Option<String>,
    #[serde(default, rename = "Description")]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTypeCode {
    #[serde(default, rename = "Type Code")]
    code: Option<String>,
    #[serde(default, rename = "Description")]
    description: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Ship-type codes sometimes arrive as floats ("30.0").
fn parse_code(raw: Option<&str>) -> Option<i64> {
    parse_number(raw)
        .value()
        .filter(|v| v.fract() == 0.0)
        .map(|v| v as i64)
}

/// Reader for the vessel static table, optionally joined with a ship-type code table.
#[derive(Debug, Default)]
pub struct VesselReader {
    type_codes: HashMap<i64, String>,
}

impl VesselReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the `Type Code,Description` table used to describe ship-type codes.
    pub fn with_type_codes(mut self, path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        self.type_codes = Self::read_type_codes(BufReader::new(file))?;
        debug!("Loaded {} ship-type codes", self.type_codes.len());
        Ok(self)
    }

    pub fn type_code_count(&self) -> usize {
        self.type_codes.len()
    }

    fn read_type_codes<R: Read>(source: R) -> Result<HashMap<i64, String>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let mut codes = HashMap::new();
        for row in reader.deserialize::<RawTypeCode>() {
            let Ok(row) = row else { continue };
            if let (Some(code), Some(description)) =
                (parse_code(row.code.as_deref()), non_empty(row.description))
            {
                codes.entry(code).or_insert(description);
            }
        }
        Ok(codes)
    }

    pub fn read_registry(&self, path: &Path) -> Result<VesselRegistry> {
        let file = File::open(path)?;
        let registry = self.read_from(BufReader::new(file))?;
        info!("Loaded {} vessels from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Build a registry from static rows. Missing country becomes "Unknown", missing ship type
    /// becomes 0, and a code without a description becomes "Unknown Type".
    pub fn read_from<R: Read>(&self, source: R) -> Result<VesselRegistry> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let mut registry = VesselRegistry::new();
        for row in reader.deserialize::<RawStatic>() {
            let Ok(row) = row else { continue };
            if let Some(vessel) = self.resolve(row) {
                registry.insert(vessel);
            }
        }
        Ok(registry)
    }

    fn resolve(&self, row: RawStatic) -> Option<VesselStatic> {
        let vessel_id = non_empty(row.vessel_id)?;
        let shiptype = parse_code(row.shiptype.as_deref()).unwrap_or(UNKNOWN_SHIPTYPE);

        let description = self
            .type_codes
            .get(&shiptype)
            .cloned()
            .or_else(|| non_empty(row.description))
            .unwrap_or_else(|| UNKNOWN_TYPE_DESCRIPTION.to_string());

        Some(VesselStatic {
            vessel_id,
            country: non_empty(row.country).unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
            shiptype,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODES: &str = "Type Code,Description\n30,Fishing\n70,Cargo\n0,Not available (default)\n";

    fn reader() -> VesselReader {
        VesselReader {
            type_codes: VesselReader::read_type_codes(CODES.as_bytes()).unwrap(),
        }
    }

    #[test]
    fn test_joins_type_codes() {
        let registry = reader()
            .read_from("vessel_id,country,shiptype\nv1,Greece,30.0\nv2,,\n".as_bytes())
            .unwrap();

        let v1 = registry.get("v1").unwrap();
        assert_eq!(v1.shiptype, 30);
        assert_eq!(v1.description, "Fishing");

        let v2 = registry.get("v2").unwrap();
        assert_eq!(v2.country, "Unknown");
        assert_eq!(v2.shiptype, 0);
        assert_eq!(v2.description, "Not available (default)");
    }

    #[test]
    fn test_unmatched_code_is_unknown_type() {
        let registry = reader()
            .read_from("vessel_id,country,shiptype\nv1,Malta,99\n".as_bytes())
            .unwrap();
        assert_eq!(registry.get("v1").unwrap().description, "Unknown Type");
    }

    #[test]
    fn test_duplicate_vessel_prefers_known_description() {
        let registry = reader()
            .read_from("vessel_id,country,shiptype\nv1,Malta,99\nv1,Malta,70\nv1,Malta,30\n".as_bytes())
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("v1").unwrap().description, "Cargo");
    }

    #[test]
    fn test_description_column_without_code_table() {
        let registry = VesselReader::new()
            .read_from("vessel_id,country,shiptype,Description\nv1,Cyprus,70,Cargo\n".as_bytes())
            .unwrap();

        assert_eq!(registry.get("v1").unwrap().description, "Cargo");
        assert_eq!(VesselReader::new().type_code_count(), 0);
    }
}
