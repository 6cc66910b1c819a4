use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::constants::{
    DEFAULT_TYPE_DESCRIPTION, UNKNOWN_COUNTRY, UNKNOWN_DESCRIPTION, UNKNOWN_SHIPTYPE,
    UNKNOWN_TYPE_DESCRIPTION,
};

/// Static attributes of a vessel, keyed by vessel id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesselStatic {
    pub vessel_id: String,
    pub country: String,
    pub shiptype: i64,
    pub description: String,
}

impl VesselStatic {
    pub fn has_known_description(&self) -> bool {
        self.description != UNKNOWN_TYPE_DESCRIPTION && self.description != DEFAULT_TYPE_DESCRIPTION
    }
}

/// Vessel metadata attached to a trip; falls back to placeholders for unregistered vessels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VesselInfo<'a> {
    pub country: &'a str,
    pub shiptype: i64,
    pub description: &'a str,
}

pub const UNKNOWN_VESSEL: VesselInfo<'static> = VesselInfo {
    country: UNKNOWN_COUNTRY,
    shiptype: UNKNOWN_SHIPTYPE,
    description: UNKNOWN_DESCRIPTION,
};

/// Lookup table from vessel id to static attributes.
#[derive(Debug, Clone, Default)]
pub struct VesselRegistry {
    vessels: HashMap<String, VesselStatic>,
}

impl VesselRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vessel. When the id is already present, the existing entry is only replaced
    /// if it lacks a known ship-type description and the new one has it.
    pub fn insert(&mut self, vessel: VesselStatic) -> bool {
        match self.vessels.get(&vessel.vessel_id) {
            Some(existing) if existing.has_known_description() || !vessel.has_known_description() => false,
            _ => {
                self.vessels.insert(vessel.vessel_id.clone(), vessel);
                true
            }
        }
    }

    pub fn get(&self, vessel_id: &str) -> Option<&VesselStatic> {
        self.vessels.get(vessel_id)
    }

    pub fn info(&self, vessel_id: &str) -> VesselInfo<'_> {
        self.get(vessel_id)
            .map(|v| VesselInfo {
                country: &v.country,
                shiptype: v.shiptype,
                description: &v.description,
            })
            .unwrap_or(UNKNOWN_VESSEL)
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    /// Vessel documents sorted by vessel id.
    pub fn documents(&self) -> Vec<VesselDocument> {
        let mut docs: Vec<VesselDocument> = self.vessels.values().map(VesselDocument::from).collect();
        docs.sort_by(|a, b| a.vessel_id.cmp(&b.vessel_id));
        docs
    }
}

impl FromIterator<VesselStatic> for VesselRegistry {
    fn from_iter<T: IntoIterator<Item = VesselStatic>>(iter: T) -> Self {
        let mut registry = Self::new();
        for vessel in iter {
            registry.insert(vessel);
        }
        registry
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeInfo {
    pub shiptype_code: i64,
    pub description: String,
}

/// Output document for the vessels collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VesselDocument {
    pub vessel_id: String,
    pub country: String,
    pub type_info: TypeInfo,
}

impl From<&VesselStatic> for VesselDocument {
    fn from(vessel: &VesselStatic) -> Self {
        Self {
            vessel_id: vessel.vessel_id.trim().to_string(),
            country: vessel.country.clone(),
            type_info: TypeInfo {
                shiptype_code: vessel.shiptype,
                description: vessel.description.trim().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vessel(id: &str, description: &str) -> VesselStatic {
        VesselStatic {
            vessel_id: id.to_string(),
            country: "Greece".to_string(),
            shiptype: 70,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_unknown_vessel_defaults() {
        let registry = VesselRegistry::new();
        let info = registry.info("missing");
        assert_eq!(info.country, "Unknown");
        assert_eq!(info.shiptype, 0);
        assert_eq!(info.description, "N/A");
    }

    #[test]
    fn test_known_description_wins_duplicates() {
        let registry: VesselRegistry = vec![
            vessel("v1", "Unknown Type"),
            vessel("v1", "Cargo"),
            vessel("v1", "Tanker"),
        ]
        .into_iter()
        .collect();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.info("v1").description, "Cargo");
    }

    #[test]
    fn test_first_row_kept_when_none_known() {
        let mut registry = VesselRegistry::new();
        assert!(registry.insert(vessel("v2", "Unknown Type")));
        assert!(!registry.insert(vessel("v2", "Not available (default)")));
        assert_eq!(registry.info("v2").description, "Unknown Type");
    }

    #[test]
    fn test_vessel_document_shape() {
        let doc = VesselDocument::from(&vessel(" v3 ", " Cargo "));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["vessel_id"], "v3");
        assert_eq!(json["type_info"]["shiptype_code"], 70);
        assert_eq!(json["type_info"]["description"], "Cargo");
    }
}
