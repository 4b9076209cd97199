use thiserror::Error;

use chromloader_core::RegionSetError;
use chromloader_io::StoreError;

use super::config::DataConfigError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Malformed region: {0}")]
    MalformedRegion(String),
    /// Invalid settings, whether set in code or read from a config file.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),
    #[error("Track extraction failed for {region}: {source}")]
    TrackExtraction {
        region: String,
        #[source]
        source: StoreError,
    },
    #[error("Alignment error: {0}")]
    Alignment(String),
    #[error("Index {index} is out of range for a dataset of {size} examples")]
    IndexOutOfRange { index: usize, size: usize },
    #[error("Dataset has not been materialized yet, call refresh() first")]
    NotMaterialized,
    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Input(RegionSetError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<RegionSetError> for PipelineError {
    fn from(e: RegionSetError) -> Self {
        match e {
            RegionSetError::RegionParseError(msg) => PipelineError::MalformedRegion(msg),
            other => PipelineError::Input(other),
        }
    }
}

impl From<DataConfigError> for PipelineError {
    fn from(e: DataConfigError) -> Self {
        PipelineError::Configuration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_config_file_errors_are_configuration_errors() {
        let err = PipelineError::from(DataConfigError::MissingField("peaks"));
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required field `peaks` in data config"
        );
    }

    #[rstest]
    fn test_region_parse_errors_are_malformed_regions() {
        let err = PipelineError::from(RegionSetError::RegionParseError("chr1\t10".to_string()));
        assert!(matches!(err, PipelineError::MalformedRegion(_)));
    }
}
