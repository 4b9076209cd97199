use std::fmt::{self, Display};
use std::str::FromStr;

use crate::config::DataConfig;
use crate::error::PipelineError;
use crate::loader::LoaderOptions;

/// Dataset split a region or an epoch dataset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Train,
    Validation,
    Test,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Train => write!(f, "train"),
            Stage::Validation => write!(f, "validation"),
            Stage::Test => write!(f, "test"),
        }
    }
}

impl FromStr for Stage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Stage::Train),
            "val" | "validation" => Ok(Stage::Validation),
            "test" => Ok(Stage::Test),
            other => Err(PipelineError::Configuration(format!(
                "unknown stage: {}",
                other
            ))),
        }
    }
}

///
/// How one stage materializes and serves its examples.
///
/// Built from a [DataConfig] with [StageConfig::train], [StageConfig::validation] or
/// [StageConfig::test].
///
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub stage: Stage,
    /// Jitter headroom kept around peak windows and drawn from at every refresh.
    pub max_jitter: u32,
    /// Non-peaks kept per peak; zero or negative keeps every non-peak.
    pub negative_sampling_ratio: f64,
    pub add_revcomp: bool,
    pub revcomp_fraction: f64,
    /// Permute the materialized examples at every refresh.
    pub shuffle_at_epoch_start: bool,
    pub loader: LoaderOptions,
}

impl StageConfig {
    pub fn train(config: &DataConfig) -> Self {
        StageConfig {
            stage: Stage::Train,
            max_jitter: config.shift,
            negative_sampling_ratio: config.negative_sampling_ratio,
            add_revcomp: true,
            revcomp_fraction: config.revcomp_fraction,
            // peaks stay first in the materialized arrays; the loader shuffles batches
            shuffle_at_epoch_start: false,
            loader: LoaderOptions::from_config(config).with_shuffle(true),
        }
    }

    pub fn validation(config: &DataConfig) -> Self {
        StageConfig {
            stage: Stage::Validation,
            max_jitter: 0,
            negative_sampling_ratio: config.validation_negative_sampling_ratio,
            add_revcomp: false,
            revcomp_fraction: config.revcomp_fraction,
            shuffle_at_epoch_start: false,
            loader: LoaderOptions::from_config(config),
        }
    }

    pub fn test(config: &DataConfig) -> Self {
        StageConfig {
            stage: Stage::Test,
            max_jitter: 0,
            negative_sampling_ratio: -1.0,
            add_revcomp: false,
            revcomp_fraction: config.revcomp_fraction,
            shuffle_at_epoch_start: false,
            loader: LoaderOptions::from_config(config),
        }
    }

    pub fn for_stage(stage: Stage, config: &DataConfig) -> Self {
        match stage {
            Stage::Train => Self::train(config),
            Stage::Validation => Self::validation(config),
            Stage::Test => Self::test(config),
        }
    }

    pub fn with_negative_sampling_ratio(mut self, ratio: f64) -> Self {
        self.negative_sampling_ratio = ratio;
        self
    }

    pub fn with_revcomp(mut self, add_revcomp: bool) -> Self {
        self.add_revcomp = add_revcomp;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: u32) -> Self {
        self.max_jitter = max_jitter;
        self
    }
}
