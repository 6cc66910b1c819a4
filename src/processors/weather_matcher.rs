use crate::error::Result;
use crate::models::{EnrichedPosition, VesselPosition, WeatherObservation, WeatherSourceRecord};
use crate::processors::{StationIndex, WeatherTimeTable};
use crate::utils::compass::Cardinal;
use crate::utils::constants::DEFAULT_BATCH_SIZE;
use rayon::prelude::*;
use std::ops::AddAssign;
use tracing::{debug, info};

/// Lookup outcome counts for one or more batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub positions: usize,
    pub matched: usize,
    pub misses: usize,
}

impl AddAssign for MatchStats {
    fn add_assign(&mut self, other: Self) {
        self.positions += other.positions;
        self.matched += other.matched;
        self.misses += other.misses;
    }
}

/// Output of one enrichment batch, in input order.
#[derive(Debug, Clone)]
pub struct MatchedBatch {
    pub positions: Vec<EnrichedPosition>,
    pub stats: MatchStats,
}

/// Attaches the nearest station's weather to vessel positions.
///
/// Holds the station index and weather table read-only; enrichment of a position depends on
/// nothing but the position itself, so batches can be processed in any grouping.
pub struct WeatherMatcher {
    index: StationIndex,
    table: WeatherTimeTable,
    batch_size: usize,
}

impl WeatherMatcher {
    pub fn new(index: StationIndex, table: WeatherTimeTable) -> Self {
        Self {
            index,
            table,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Build the station index and weather table from raw weather source rows.
    ///
    /// Every row contributes its station; only rows with a timestamp contribute an observation.
    pub fn from_source_records(records: &[WeatherSourceRecord]) -> Result<Self> {
        let index = StationIndex::build(records.iter().map(|r| (r.longitude, r.latitude)))?;

        let observations = records.iter().filter_map(|record| {
            let station_id = index.station_id(record.longitude, record.latitude)?;
            WeatherObservation::from_source(station_id, record)
        });
        let table = WeatherTimeTable::build(observations);

        info!(
            "Weather lookup ready: {} stations, {} observations ({} duplicates overwritten)",
            index.len(),
            table.len(),
            table.overwritten()
        );

        Ok(Self::new(index, table))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn station_index(&self) -> &StationIndex {
        &self.index
    }

    pub fn weather_table(&self) -> &WeatherTimeTable {
        &self.table
    }

    /// Enrich a single position.
    pub fn enrich_position(&self, position: VesselPosition) -> Result<EnrichedPosition> {
        let cell_id = self.index.nearest(position.longitude, position.latitude)?;
        let weather = self
            .table
            .lookup(cell_id, position.timestamp.timestamp())
            .copied();

        let course_cardinal = position.course.and_then(Cardinal::from_degrees);
        let wind_cardinal = weather
            .and_then(|w| w.wind_dir)
            .and_then(Cardinal::from_degrees);

        Ok(EnrichedPosition {
            position,
            cell_id,
            weather,
            course_cardinal,
            wind_cardinal,
        })
    }

    /// Enrich one batch in parallel. Output order matches input order.
    pub fn enrich(&self, positions: Vec<VesselPosition>) -> Result<MatchedBatch> {
        let enriched: Vec<EnrichedPosition> = positions
            .into_par_iter()
            .map(|p| self.enrich_position(p))
            .collect::<Result<_>>()?;

        let matched = enriched.iter().filter(|p| p.has_weather()).count();
        let stats = MatchStats {
            positions: enriched.len(),
            matched,
            misses: enriched.len() - matched,
        };

        Ok(MatchedBatch {
            positions: enriched,
            stats,
        })
    }

    /// Lazily enrich `positions` in batches of `batch_size`. Positions are pulled from the
    /// source only as each batch is cut, so a streamed source never has more than one batch in
    /// memory. Concatenating the batches gives the same result as one large call.
    pub fn batches<I>(&self, positions: I) -> Batches<'_, I::IntoIter>
    where
        I: IntoIterator<Item = VesselPosition>,
    {
        Batches {
            matcher: self,
            remaining: positions.into_iter(),
            batch_number: 0,
        }
    }

    pub fn batch_count(&self, total_positions: usize) -> usize {
        total_positions.div_ceil(self.batch_size)
    }
}

/// Iterator over enriched batches; see [`WeatherMatcher::batches`].
pub struct Batches<'a, I> {
    matcher: &'a WeatherMatcher,
    remaining: I,
    batch_number: usize,
}

impl<I: Iterator<Item = VesselPosition>> Iterator for Batches<'_, I> {
    type Item = Result<MatchedBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<VesselPosition> = self
            .remaining
            .by_ref()
            .take(self.matcher.batch_size)
            .collect();

        if chunk.is_empty() {
            return None;
        }

        self.batch_number += 1;
        debug!("Enriching batch {} ({} positions)", self.batch_number, chunk.len());
        Some(self.matcher.enrich(chunk))
    }
}
