use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use thiserror::Error;

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Single-region sequence → base-resolution profile examples.
    #[default]
    Profile,
}

///
/// Data loading configuration, usually read from a TOML file.
///
/// Relative paths are resolved against the directory holding the config file.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub data_type: DataType,

    pub peaks: PathBuf,
    pub negatives: Option<PathBuf>,
    pub background: Option<PathBuf>,
    pub chrom_sizes: PathBuf,
    pub fasta: PathBuf,
    /// Signal track: bigWig (with the `bigwig` feature) or bedGraph, optionally gzipped.
    pub bigwig: PathBuf,

    pub in_window: u32,
    pub out_window: u32,
    /// Bases covered by the profile; defaults to `out_window` (one value per base).
    pub profile_width: Option<u32>,
    /// Jitter headroom kept around every window, and the training jitter.
    pub shift: u32,

    pub negative_sampling_ratio: f64,
    pub validation_negative_sampling_ratio: f64,
    pub revcomp_fraction: f64,

    pub batch_size: usize,
    pub num_workers: usize,
    pub seed: u64,

    pub training_chroms: Vec<String>,
    pub validation_chroms: Vec<String>,
    pub test_chroms: Vec<String>,
    pub exclude_chroms: Vec<String>,

    pub train_with_background: bool,
    pub debug: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            data_type: DataType::Profile,
            peaks: PathBuf::new(),
            negatives: None,
            background: None,
            chrom_sizes: PathBuf::new(),
            fasta: PathBuf::new(),
            bigwig: PathBuf::new(),
            in_window: 2114,
            out_window: 1000,
            profile_width: None,
            shift: 500,
            negative_sampling_ratio: 0.1,
            validation_negative_sampling_ratio: 1.0,
            revcomp_fraction: 0.5,
            batch_size: 64,
            num_workers: 0,
            seed: 42,
            training_chroms: Vec::new(),
            validation_chroms: Vec::new(),
            test_chroms: Vec::new(),
            exclude_chroms: Vec::new(),
            train_with_background: false,
            debug: false,
        }
    }
}

/// Format of the signal track named by `bigwig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFileType {
    BigWig,
    BedGraph,
    BedGraphGz,
}

#[derive(Error, Debug)]
pub enum DataConfigError {
    #[error("Missing required field `{0}` in data config")]
    MissingField(&'static str),
    #[error(
        "Unrecognized signal track extension. It must be `bw`, `bigwig`, `bedgraph`, `bg` or one of the latter two gzipped"
    )]
    InvalidTrackFileType,
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type DataConfigResult<T> = std::result::Result<T, DataConfigError>;

impl TrackFileType {
    ///
    /// Determine the track format from the file extension (case-insensitive).
    ///
    pub fn from_path(path: &Path) -> DataConfigResult<Self> {
        let ext = |p: &Path| p.extension().and_then(OsStr::to_str).map(str::to_ascii_lowercase);
        match ext(path).as_deref() {
            Some("bw") | Some("bigwig") => Ok(TrackFileType::BigWig),
            Some("bedgraph") | Some("bg") => Ok(TrackFileType::BedGraph),
            Some("gz") => {
                let file_stem = path
                    .file_stem()
                    .ok_or(DataConfigError::InvalidTrackFileType)?;
                match ext(Path::new(file_stem)).as_deref() {
                    Some("bedgraph") | Some("bg") => Ok(TrackFileType::BedGraphGz),
                    _ => Err(DataConfigError::InvalidTrackFileType),
                }
            }
            _ => Err(DataConfigError::InvalidTrackFileType),
        }
    }
}

impl DataConfig {
    pub fn profile_width(&self) -> u32 {
        self.profile_width.unwrap_or(self.out_window)
    }

    ///
    /// Check the values serde cannot check on its own.
    ///
    pub fn validate(&self) -> DataConfigResult<()> {
        let required = [
            ("peaks", &self.peaks),
            ("chrom_sizes", &self.chrom_sizes),
            ("fasta", &self.fasta),
            ("bigwig", &self.bigwig),
        ];
        for (field, path) in required {
            if path.as_os_str().is_empty() {
                return Err(DataConfigError::MissingField(field));
            }
        }

        let invalid = |field: &'static str, reason: &str| DataConfigError::InvalidValue {
            field,
            reason: reason.to_string(),
        };

        if self.in_window == 0 {
            return Err(invalid("in_window", "must be positive"));
        }
        if self.out_window == 0 {
            return Err(invalid("out_window", "must be positive"));
        }
        if self.profile_width() > self.in_window {
            return Err(invalid(
                "profile_width",
                "profile must fit inside the input window",
            ));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "must be positive"));
        }
        if !self.negative_sampling_ratio.is_finite() {
            return Err(invalid("negative_sampling_ratio", "must be finite"));
        }
        if !self.validation_negative_sampling_ratio.is_finite() {
            return Err(invalid(
                "validation_negative_sampling_ratio",
                "must be finite",
            ));
        }
        if !(0.0..=1.0).contains(&self.revcomp_fraction) {
            return Err(invalid("revcomp_fraction", "must be within [0, 1]"));
        }

        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if !p.as_os_str().is_empty() && p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.peaks);
        resolve(&mut self.chrom_sizes);
        resolve(&mut self.fasta);
        resolve(&mut self.bigwig);
        if let Some(p) = self.negatives.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.background.as_mut() {
            resolve(p);
        }
    }
}

impl TryFrom<&Path> for DataConfig {
    type Error = DataConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let mut config: DataConfig = toml::from_str(&toml_str)?;
        if let Some(parent) = path.parent() {
            config.resolve_paths(parent);
        }
        config.validate()?;
        Ok(config)
    }
}
