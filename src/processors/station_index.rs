use crate::error::{ProcessingError, Result};
use crate::models::WeatherStation;
use crate::utils::coordinates::{coordinate_key, truncate_coordinate};
use rayon::prelude::*;
use rstar::RTree;
use std::collections::HashMap;
use tracing::debug;

/// Deduplicated weather stations with nearest-neighbour lookup in planar (lon, lat) space.
///
/// Stations are identified by their coordinates truncated to five decimals. Ids are handed
/// out in first-seen order, so the same input order always produces the same ids.
#[derive(Debug, Clone)]
pub struct StationIndex {
    stations: Vec<WeatherStation>,
    ids_by_key: HashMap<String, u32>,
    tree: RTree<WeatherStation>,
}

impl StationIndex {
    /// Build the index from raw station coordinates `(lon, lat)`.
    pub fn build<I>(coordinates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut stations = Vec::new();
        let mut ids_by_key = HashMap::new();

        for (longitude, latitude) in coordinates {
            let key = coordinate_key(longitude, latitude);
            if ids_by_key.contains_key(&key) {
                continue;
            }

            let cell_id = u32::try_from(stations.len()).map_err(|_| {
                ProcessingError::Config("station count exceeds u32 id space".to_string())
            })?;
            ids_by_key.insert(key, cell_id);
            stations.push(WeatherStation::new(
                cell_id,
                truncate_coordinate(longitude),
                truncate_coordinate(latitude),
            ));
        }

        if stations.is_empty() {
            return Err(ProcessingError::EmptyIndex);
        }

        debug!("Indexed {} unique weather stations", stations.len());

        let tree = RTree::bulk_load(stations.clone());
        Ok(Self {
            stations,
            ids_by_key,
            tree,
        })
    }

    /// Id of the station at exactly these (truncated) coordinates.
    pub fn station_id(&self, longitude: f64, latitude: f64) -> Option<u32> {
        self.ids_by_key
            .get(&coordinate_key(longitude, latitude))
            .copied()
    }

    /// Id of the station closest to `(lon, lat)`. Equidistant stations resolve to the lowest id.
    pub fn nearest(&self, longitude: f64, latitude: f64) -> Result<u32> {
        let query = [longitude, latitude];
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&query);

        let (first, best_distance) = candidates.next().ok_or(ProcessingError::EmptyIndex)?;
        let mut best_id = first.cell_id;

        for (station, distance) in candidates {
            if distance > best_distance {
                break;
            }
            best_id = best_id.min(station.cell_id);
        }

        Ok(best_id)
    }

    /// Resolve many query points at once, in parallel. Output order matches input order.
    pub fn nearest_batch(&self, points: &[(f64, f64)]) -> Result<Vec<u32>> {
        points
            .par_iter()
            .map(|&(lon, lat)| self.nearest(lon, lat))
            .collect()
    }

    pub fn stations(&self) -> &[WeatherStation] {
        &self.stations
    }

    pub fn get(&self, cell_id: u32) -> Option<&WeatherStation> {
        self.stations.get(cell_id as usize)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
