use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_GAP_THRESHOLD_MINUTES, ENV_PREFIX, MAX_HEADING_DEGREES,
    MAX_SPEED_KNOTS,
};
use chrono::{DateTime, Utc};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::{Validate, ValidationError};

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_window"))]
pub struct PipelineConfig {
    #[validate(range(min = 1))]
    pub gap_threshold_minutes: i64,

    #[validate(range(min = 1))]
    pub batch_size: usize,

    #[validate(range(min = 0.0))]
    pub max_speed_knots: f64,

    #[validate(range(min = 0.0))]
    pub max_heading_degrees: f64,

    #[validate(range(min = 1))]
    pub max_workers: usize,

    #[serde(default)]
    pub since: Option<DateTime<Utc>>,

    #[serde(default)]
    pub until: Option<DateTime<Utc>>,

    #[serde(default)]
    pub use_mmap: bool,
}

fn validate_window(config: &PipelineConfig) -> std::result::Result<(), ValidationError> {
    match (config.since, config.until) {
        (Some(since), Some(until)) if since >= until => {
            Err(ValidationError::new("since_not_before_until"))
        }
        _ => Ok(()),
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gap_threshold_minutes: DEFAULT_GAP_THRESHOLD_MINUTES,
            batch_size: DEFAULT_BATCH_SIZE,
            max_speed_knots: MAX_SPEED_KNOTS,
            max_heading_degrees: MAX_HEADING_DEGREES,
            max_workers: num_cpus::get(),
            since: None,
            until: None,
            use_mmap: false,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub gap_threshold_minutes: Option<i64>,
    pub batch_size: Option<usize>,
    pub max_workers: Option<usize>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub use_mmap: Option<bool>,
}

impl PipelineConfig {
    /// Resolve settings from defaults, an optional file, `AIS_TRIPS_*` environment variables
    /// and command-line overrides, in increasing precedence.
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("gap_threshold_minutes", defaults.gap_threshold_minutes)?
            .set_default("batch_size", defaults.batch_size as i64)?
            .set_default("max_speed_knots", defaults.max_speed_knots)?
            .set_default("max_heading_degrees", defaults.max_heading_degrees)?
            .set_default("max_workers", defaults.max_workers as i64)?
            .set_default("use_mmap", defaults.use_mmap)?;

        if let Some(path) = file {
            if !path.exists() {
                return Err(ProcessingError::MissingInput(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("gap_threshold_minutes", overrides.gap_threshold_minutes)?
            .set_override_option("batch_size", overrides.batch_size.map(|v| v as i64))?
            .set_override_option("max_workers", overrides.max_workers.map(|v| v as i64))?
            .set_override_option("since", overrides.since.map(|t| t.to_rfc3339()))?
            .set_override_option("until", overrides.until.map(|t| t.to_rfc3339()))?
            .set_override_option("use_mmap", overrides.use_mmap)?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }
}
