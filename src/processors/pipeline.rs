use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{TripDocument, VesselPosition, VesselRegistry};
use crate::processors::{
    CleaningStats, PositionCleaner, RunSummary, TripAssembler, TripSegmenter, WeatherMatcher,
};
use crate::readers::{PositionReader, VesselReader, WeatherReader};
use crate::utils::progress::ProgressReporter;
use crate::writers::{EnrichedCsvWriter, JsonLinesWriter};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::info;

/// Input files for a run.
#[derive(Debug, Clone, Default)]
pub struct InputPaths {
    pub positions: PathBuf,
    pub weather: Vec<PathBuf>,
    pub vessels: Option<PathBuf>,
    pub type_codes: Option<PathBuf>,
}

/// Everything trip assembly needs in memory. `positions` are cleaned and sorted by
/// (vessel id, timestamp).
pub struct LoadedInputs {
    pub matcher: WeatherMatcher,
    pub positions: Vec<VesselPosition>,
    pub registry: VesselRegistry,
    pub summary: RunSummary,
}

/// Positions + weather + vessel table to trip documents.
#[derive(Debug, Clone)]
pub struct TripPipeline {
    config: PipelineConfig,
    silent: bool,
}

impl TripPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            silent: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.silent = !show_progress;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn cleaner(&self) -> PositionCleaner {
        PositionCleaner::new().with_window(self.config.since, self.config.until)
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))
    }

    fn check_positions(inputs: &InputPaths) -> Result<()> {
        if !inputs.positions.exists() {
            return Err(ProcessingError::MissingInput(inputs.positions.clone()));
        }
        Ok(())
    }

    fn spawn_weather(&self, inputs: &InputPaths) -> JoinHandle<Result<WeatherMatcher>> {
        let weather_paths = inputs.weather.clone();
        let batch_size = self.config.batch_size;
        tokio::task::spawn_blocking(move || -> Result<WeatherMatcher> {
            let records = WeatherReader::new().read_sources(&weather_paths)?;
            Ok(WeatherMatcher::from_source_records(&records)?.with_batch_size(batch_size))
        })
    }

    /// Build the weather lookup only. Positions are streamed from disk afterwards.
    pub async fn load_matcher(&self, inputs: &InputPaths) -> Result<WeatherMatcher> {
        Self::check_positions(inputs)?;

        let progress = ProgressReporter::new_spinner("Loading weather...", self.silent);
        let matcher = self.spawn_weather(inputs).await??;
        progress.finish_with_message(&format!(
            "Loaded {} stations",
            matcher.station_index().len()
        ));
        Ok(matcher)
    }

    /// Read all inputs concurrently. Weather and positions are required; a missing vessel table
    /// only means every trip gets the placeholder metadata.
    pub async fn load_inputs(&self, inputs: &InputPaths) -> Result<LoadedInputs> {
        Self::check_positions(inputs)?;

        let progress = ProgressReporter::new_spinner("Loading inputs...", self.silent);

        let weather_task = self.spawn_weather(inputs);

        let positions_path = inputs.positions.clone();
        let use_mmap = self.config.use_mmap;
        let cleaner = self.cleaner();
        let positions_task = tokio::task::spawn_blocking(move || {
            let (raw, read_stats) = PositionReader::with_mmap(use_mmap).read_positions(&positions_path)?;
            let (positions, cleaning_stats) = cleaner.clean(raw);

            let mut summary = RunSummary::new();
            summary.record_read(&read_stats);
            summary.record_cleaning(&cleaning_stats);
            Ok::<_, ProcessingError>((positions, summary))
        });

        let vessels_path = inputs.vessels.clone();
        let codes_path = inputs.type_codes.clone();
        let vessels_task = tokio::task::spawn_blocking(move || -> Result<VesselRegistry> {
            let Some(path) = vessels_path else {
                return Ok(VesselRegistry::new());
            };
            let reader = match codes_path {
                Some(codes) => VesselReader::new().with_type_codes(&codes)?,
                None => VesselReader::new(),
            };
            reader.read_registry(&path)
        });

        let (matcher, positions, registry) =
            tokio::try_join!(weather_task, positions_task, vessels_task)?;
        let matcher = matcher?;
        let (positions, summary) = positions?;
        let registry = registry?;

        progress.finish_with_message(&format!(
            "Loaded {} positions, {} stations, {} vessels",
            positions.len(),
            matcher.station_index().len(),
            registry.len()
        ));

        Ok(LoadedInputs {
            matcher,
            positions,
            registry,
            summary,
        })
    }

    /// Enrich, segment and assemble, streaming trip documents to `trips_path` as they close.
    pub fn run(&self, loaded: LoadedInputs, trips_path: &Path) -> Result<RunSummary> {
        let LoadedInputs {
            matcher,
            positions,
            registry,
            mut summary,
        } = loaded;

        let pool = self.thread_pool()?;
        let writer = JsonLinesWriter::<TripDocument>::create(trips_path)?;

        let progress = ProgressReporter::new_batches(
            matcher.batch_count(positions.len()) as u64,
            "Enriching and assembling trips...",
            self.silent,
        );

        let segmenter = TripSegmenter::new(self.config.gap_threshold_minutes);
        let mut state = segmenter.start();
        let mut assembler = TripAssembler::new(&registry)
            .with_limits(self.config.max_speed_knots, self.config.max_heading_degrees);

        pool.install(|| -> Result<()> {
            for batch in matcher.batches(positions) {
                let batch = batch?;
                summary.record_matching(&batch.stats);

                for position in batch.positions {
                    let trip_id = state.assign(&position);
                    if let Some(document) = assembler.push(trip_id, position) {
                        writer.send(document)?;
                    }
                }
                progress.increment(1);
            }
            Ok(())
        })?;

        if let Some(document) = assembler.finish() {
            writer.send(document)?;
        }
        let written = writer.finish()?;

        summary.trips_segmented = state.trips_started();
        summary.record_assembly(&assembler.stats());

        progress.finish_with_message(&format!("Wrote {} trips", written));
        info!("Wrote {} trips to {}", written, trips_path.display());

        Ok(summary)
    }

    /// Stream the positions file through the matcher into `enriched_path`, one batch in memory at
    /// a time. Rows keep file order.
    pub fn enrich(
        &self,
        matcher: &WeatherMatcher,
        positions_path: &Path,
        enriched_path: &Path,
    ) -> Result<RunSummary> {
        let mut rows = PositionReader::with_mmap(self.config.use_mmap).open(positions_path)?;
        let mut summary = self.enrich_positions(matcher, rows.by_ref(), enriched_path)?;
        summary.record_read(&rows.stats());
        Ok(summary)
    }

    /// Enrich `positions` in the order given. Only the time window and the heading marker are
    /// applied; nothing is sorted or dropped as a duplicate.
    pub fn enrich_positions<I>(
        &self,
        matcher: &WeatherMatcher,
        positions: I,
        enriched_path: &Path,
    ) -> Result<RunSummary>
    where
        I: IntoIterator<Item = VesselPosition>,
        I::IntoIter: Send,
    {
        let pool = self.thread_pool()?;
        let cleaner = self.cleaner();
        let mut cleaning = CleaningStats::default();
        let mut summary = RunSummary::new();

        let mut csv = EnrichedCsvWriter::create(enriched_path)?;
        let progress = ProgressReporter::new_spinner("Enriching positions...", self.silent);
        let source = positions.into_iter();

        pool.install(|| -> Result<()> {
            let kept = source.filter_map(|p| cleaner.normalize(p, &mut cleaning));
            for batch in matcher.batches(kept) {
                let batch = batch?;
                summary.record_matching(&batch.stats);
                csv.write_batch(&batch.positions)?;
                progress.set_message(&format!("Enriched {} positions", csv.rows()));
            }
            Ok(())
        })?;
        summary.record_cleaning(&cleaning);

        let rows = csv.finish()?;
        progress.finish_with_message(&format!("Wrote {} enriched positions", rows));
        info!("Wrote {} enriched positions to {}", rows, enriched_path.display());

        Ok(summary)
    }

    /// Load and run on a blocking thread. With `enriched_path`, the positions file is also
    /// streamed to CSV in file order before trip assembly.
    pub async fn run_files(
        &self,
        inputs: &InputPaths,
        trips_path: PathBuf,
        enriched_path: Option<PathBuf>,
    ) -> Result<RunSummary> {
        let loaded = self.load_inputs(inputs).await?;
        let pipeline = self.clone();
        let positions_path = inputs.positions.clone();
        tokio::task::spawn_blocking(move || {
            if let Some(path) = enriched_path.as_deref() {
                pipeline.enrich(&loaded.matcher, &positions_path, path)?;
            }
            pipeline.run(loaded, &trips_path)
        })
        .await?
    }

    pub async fn enrich_files(&self, inputs: &InputPaths, enriched_path: PathBuf) -> Result<RunSummary> {
        let matcher = self.load_matcher(inputs).await?;
        let pipeline = self.clone();
        let positions_path = inputs.positions.clone();
        tokio::task::spawn_blocking(move || pipeline.enrich(&matcher, &positions_path, &enriched_path))
            .await?
    }
}

impl Default for TripPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VesselStatic, WeatherSourceRecord};
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn matcher() -> WeatherMatcher {
        WeatherMatcher::from_source_records(&[WeatherSourceRecord {
            longitude: 23.5,
            latitude: 37.5,
            timestamp: Some(1_546_300_800.0),
            temperature_k: Some(300.0),
            wind_direction: Some(46.0),
            ..Default::default()
        }])
        .unwrap()
        .with_batch_size(2)
    }

    fn loaded(positions: Vec<VesselPosition>) -> LoadedInputs {
        let registry: VesselRegistry = vec![VesselStatic {
            vessel_id: "v1".to_string(),
            country: "Greece".to_string(),
            shiptype: 70,
            description: "Cargo".to_string(),
        }]
        .into_iter()
        .collect();

        LoadedInputs {
            matcher: matcher(),
            positions,
            registry,
            summary: RunSummary::new(),
        }
    }

    fn fix(vessel: &str, minutes: i64, speed: f64) -> VesselPosition {
        let t0 = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        VesselPosition::new(vessel, t0 + Duration::minutes(minutes), 23.6, 37.6)
            .with_motion(Some(speed), Some(90.0), None)
    }

    fn pipeline() -> TripPipeline {
        let config = PipelineConfig {
            max_workers: 2,
            ..Default::default()
        };
        TripPipeline::new(config)
    }

    #[test]
    fn test_run_streams_trips() {
        let dir = TempDir::new().unwrap();
        let trips = dir.path().join("trips.jsonl");

        let positions = vec![
            fix("v1", 0, 999.0),
            fix("v1", 60, 10.0),
            fix("v1", 300, 5.0),
            fix("v2", 0, 1.0),
            fix("v2", 10, 2.0),
        ];

        let summary = pipeline().run(loaded(positions), &trips).unwrap();

        assert_eq!(summary.trips_segmented, 3);
        assert_eq!(summary.trips_emitted, 2);
        assert_eq!(summary.single_point_trips, 1);
        assert_eq!(summary.speeds_clamped, 1);
        assert_eq!(summary.weather_matches + summary.weather_misses, 5);

        let content = std::fs::read_to_string(&trips).unwrap();
        let docs: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["trip_id"], 1);
        assert_eq!(docs[0]["vessel_type_description"], "Cargo");
        assert_eq!(docs[1]["trip_id"], 3);
        assert_eq!(docs[1]["country"], "Unknown");
    }

    #[test]
    fn test_enrich_only() {
        let dir = TempDir::new().unwrap();
        let enriched = dir.path().join("out").join("enriched.csv");

        let summary = pipeline()
            .enrich_positions(&matcher(), vec![fix("v1", 0, 1.0), fix("v1", 600, 1.0)], &enriched)
            .unwrap();

        assert_eq!(summary.weather_matches, 1);
        assert_eq!(summary.weather_misses, 1);
        assert_eq!(std::fs::read_to_string(&enriched).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_enrich_keeps_input_order_and_repeats() {
        let dir = TempDir::new().unwrap();
        let enriched = dir.path().join("enriched.csv");

        let summary = pipeline()
            .enrich_positions(
                &matcher(),
                vec![fix("z", 0, 1.0), fix("a", 0, 2.0), fix("z", 0, 3.0)],
                &enriched,
            )
            .unwrap();

        let content = std::fs::read_to_string(&enriched).unwrap();
        let ids: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["z", "a", "z"]);
        assert_eq!(summary.duplicates_removed, 0);
        assert_eq!(summary.weather_matches, 3);
    }

    #[test]
    fn test_enrich_respects_time_window() {
        let dir = TempDir::new().unwrap();
        let enriched = dir.path().join("enriched.csv");
        let t0 = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();

        let windowed = TripPipeline::new(PipelineConfig {
            max_workers: 1,
            since: Some(t0 + Duration::minutes(5)),
            ..Default::default()
        });
        let summary = windowed
            .enrich_positions(&matcher(), vec![fix("v1", 10, 1.0), fix("v1", 0, 1.0)], &enriched)
            .unwrap();

        assert_eq!(summary.outside_window, 1);
        assert_eq!(std::fs::read_to_string(&enriched).unwrap().lines().count(), 2);
    }
}
