use crate::cli::args::{Cli, Commands, PipelineArgs};
use crate::config::{ConfigOverrides, PipelineConfig};
use crate::error::Result;
use crate::processors::{InputPaths, RunSummary, StationIndex, TripPipeline};
use crate::readers::{VesselReader, WeatherReader};
use crate::utils::filename::{
    default_enriched_filename, default_stations_filename, default_trips_filename,
    default_vessels_filename,
};
use crate::utils::progress::ProgressReporter;
use crate::writers::{write_json_lines, write_stations};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.log_file.as_deref())?;
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Run {
            pipeline,
            vessels,
            type_codes,
            output_file,
            enriched_output,
            gap_threshold,
        } => {
            let output_file = output_file.unwrap_or_else(default_trips_filename);
            let config = load_config(cli.config.as_deref(), &pipeline.overrides(gap_threshold))?;

            println!("Reconstructing trips...");
            println!("Positions: {}", pipeline.positions.display());
            println!("Output file: {}", output_file.display());
            println!(
                "Workers: {}, Batch size: {}, Gap threshold: {} min",
                config.max_workers, config.batch_size, config.gap_threshold_minutes
            );

            let inputs = InputPaths {
                vessels,
                type_codes,
                ..input_paths(&pipeline)
            };
            let summary = TripPipeline::new(config)
                .with_progress(show_progress)
                .run_files(&inputs, output_file, enriched_output)
                .await?;

            report(&summary);
        }

        Commands::Enrich {
            pipeline,
            output_file,
        } => {
            let output_file = output_file.unwrap_or_else(default_enriched_filename);
            let config = load_config(cli.config.as_deref(), &pipeline.overrides(None))?;

            println!("Enriching positions with weather...");
            println!("Output file: {}", output_file.display());

            let summary = TripPipeline::new(config)
                .with_progress(show_progress)
                .enrich_files(&input_paths(&pipeline), output_file)
                .await?;

            report(&summary);
        }

        Commands::Stations {
            weather,
            output_file,
        } => {
            let output_file = output_file.unwrap_or_else(default_stations_filename);
            let progress = ProgressReporter::new_spinner("Indexing weather stations...", !show_progress);

            let index = tokio::task::spawn_blocking(move || -> Result<StationIndex> {
                let records = WeatherReader::new().read_sources(&weather)?;
                StationIndex::build(records.iter().map(|r| (r.longitude, r.latitude)))
            })
            .await??;

            write_stations(&output_file, index.stations())?;
            progress.finish_with_message(&format!("Indexed {} stations", index.len()));
            println!("Wrote {} stations to {}", index.len(), output_file.display());
        }

        Commands::Vessels {
            static_file,
            type_codes,
            output_file,
        } => {
            let output_file = output_file.unwrap_or_else(default_vessels_filename);

            let reader = match type_codes {
                Some(path) => VesselReader::new().with_type_codes(&path)?,
                None => VesselReader::new(),
            };
            let registry = reader.read_registry(&static_file)?;
            let written = write_json_lines(&output_file, registry.documents())?;

            println!("Wrote {} vessels to {}", written, output_file.display());
        }
    }

    Ok(())
}

fn input_paths(pipeline: &PipelineArgs) -> InputPaths {
    InputPaths {
        positions: pipeline.positions.clone(),
        weather: pipeline.weather.clone(),
        vessels: None,
        type_codes: None,
    }
}

fn load_config(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<PipelineConfig> {
    let config = PipelineConfig::load(file, overrides)?;
    debug!("Using configuration: {:?}", config);
    Ok(config)
}

fn report(summary: &RunSummary) {
    let text = summary.generate_summary();
    info!(
        "Run finished: {} trips emitted, {} weather misses",
        summary.trips_emitted, summary.weather_misses
    );
    println!("\n{}", text);
}

/// Structured logging to stderr, or to `log_file` when given. `RUST_LOG` takes precedence over
/// the verbosity flag.
fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ais_trip_processor={}", level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            registry
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
        None => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if result.is_err() {
        debug!("Logging already initialised");
    }
    Ok(())
}
