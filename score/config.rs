// ========================================================================================
//                                 Scorer configuration
// ========================================================================================
//
// A scorer is configured by a small TOML file with two tables:
//
//     [params]                  [batch]
//     min_score = 1.0           size = 65536
//     max_score = 100.0         alignment = 32
//     min_adv_boost = 10.0      path = "native"
//     max_adv_boost = 200.0     parallel_chunk = 8192
//     slope = 0.2
//     intercept = 0.5
//
// Every field is optional and falls back to the reference benchmark setup.

use crate::error::ContractError;
use crate::transform::{ManagedTransformer, NativeTransformer, ScoreTransform, TransformPath};
use crate::types::BoostParams;
use log::info;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// The number of items in one reference batch.
pub const DEFAULT_BATCH_SIZE: usize = 64 * 1024;
/// The start-address boundary of every staged region, wide enough for 256-bit lanes.
pub const DEFAULT_ALIGNMENT: usize = 32;
/// The number of items each rayon task transforms on the parallel path.
pub const DEFAULT_PARALLEL_CHUNK: usize = 8192;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid batch alignment: {0}")]
    Alignment(#[from] ContractError),
    #[error("batch.{0} must be greater than zero")]
    Zero(&'static str),
}

/// How batches are sized, laid out and scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchLayout {
    pub size: usize,
    pub alignment: usize,
    pub path: TransformPath,
    pub parallel_chunk: usize,
}

impl Default for BatchLayout {
    fn default() -> Self {
        Self {
            size: DEFAULT_BATCH_SIZE,
            alignment: DEFAULT_ALIGNMENT,
            path: TransformPath::default(),
            parallel_chunk: DEFAULT_PARALLEL_CHUNK,
        }
    }
}

impl BatchLayout {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::Zero("size"));
        }
        if self.parallel_chunk == 0 {
            return Err(ConfigError::Zero("parallel_chunk"));
        }
        crate::error::check_lane_alignment(self.alignment)?;
        Ok(())
    }

    /// Builds the transformer this layout selects.
    pub fn transformer(&self) -> Box<dyn ScoreTransform> {
        match self.path {
            TransformPath::Managed => Box::new(ManagedTransformer::sequential()),
            TransformPath::Parallel => Box::new(ManagedTransformer::parallel(self.parallel_chunk)),
            TransformPath::Native => {
                Box::new(NativeTransformer::with_capacity(self.size, self.alignment))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScorerConfig {
    pub params: BoostParams,
    pub batch: BatchLayout,
}

impl ScorerConfig {
    /// Parses and validates a configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.batch.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(
            "Loaded scorer config from {} ({:?} path, batches of {}, {}-byte alignment)",
            path.display(),
            config.batch.path,
            config.batch.size,
            config.batch.alignment
        );
        Ok(config)
    }
}
