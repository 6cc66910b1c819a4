use crate::config::ConfigOverrides;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ais-trips")]
#[command(about = "Weather-enriched vessel trip reconstruction from AIS positions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Suppress progress output")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Configuration file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,
}

/// Options shared by the commands that enrich positions.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    #[arg(short, long, help = "AIS positions CSV")]
    pub positions: PathBuf,

    #[arg(
        short,
        long,
        required = true,
        num_args = 1..,
        help = "Weather CSV source(s); missing files are skipped"
    )]
    pub weather: Vec<PathBuf>,

    #[arg(long, help = "Positions per enrichment batch [default: 500000]")]
    pub batch_size: Option<usize>,

    #[arg(long, help = "Worker threads [default: number of CPUs]")]
    pub max_workers: Option<usize>,

    #[arg(long, help = "Ignore positions before this time (RFC 3339)")]
    pub since: Option<DateTime<Utc>>,

    #[arg(long, help = "Ignore positions at or after this time (RFC 3339)")]
    pub until: Option<DateTime<Utc>>,

    #[arg(long, help = "Memory-map the positions file")]
    pub mmap: bool,
}

impl PipelineArgs {
    pub fn overrides(&self, gap_threshold_minutes: Option<i64>) -> ConfigOverrides {
        ConfigOverrides {
            gap_threshold_minutes,
            batch_size: self.batch_size,
            max_workers: self.max_workers,
            since: self.since,
            until: self.until,
            use_mmap: self.mmap.then_some(true),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enrich positions with weather and write trip documents
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(long, help = "Vessel static CSV (vessel_id,country,shiptype)")]
        vessels: Option<PathBuf>,

        #[arg(long, help = "Ship-type code table (Type Code,Description)")]
        type_codes: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output JSON-lines file [default: output/trips-{YYMMDD}.jsonl]"
        )]
        output_file: Option<PathBuf>,

        #[arg(long, help = "Also write enriched positions to this CSV")]
        enriched_output: Option<PathBuf>,

        #[arg(long, help = "Maximum gap inside a trip, in minutes [default: 120]")]
        gap_threshold: Option<i64>,
    },

    /// Enrich positions with weather and write them as CSV
    Enrich {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(
            short,
            long,
            help = "Output CSV file [default: output/positions-weather-{YYMMDD}.csv]"
        )]
        output_file: Option<PathBuf>,
    },

    /// Build the station lookup from weather sources
    Stations {
        #[arg(short, long, required = true, num_args = 1..)]
        weather: Vec<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output JSON file [default: output/stations-{YYMMDD}.json]"
        )]
        output_file: Option<PathBuf>,
    },

    /// Export vessel static data as JSON lines
    Vessels {
        #[arg(short = 's', long, help = "Vessel static CSV")]
        static_file: PathBuf,

        #[arg(long, help = "Ship-type code table (Type Code,Description)")]
        type_codes: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output JSON-lines file [default: output/vessels-{YYMMDD}.jsonl]"
        )]
        output_file: Option<PathBuf>,
    },
}
