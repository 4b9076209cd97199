use std::io;
use thiserror::Error;

use chromloader_core::RegionSetError;

/// Error type for sequence and track store lookups.
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error occurred while loading a store.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The store has no data for the requested chromosome.
    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    /// The requested interval is empty, inverted or runs past the chromosome end.
    #[error("Interval {chr}:{start}-{end} is out of range (chromosome length {len})")]
    OutOfRange {
        chr: String,
        start: u32,
        end: u32,
        len: u32,
    },

    /// The interval cannot be placed on the chromosome, or the store returned
    /// data of the wrong length for it.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Malformed FASTA input.
    #[error("Invalid FASTA: {0}")]
    InvalidFasta(String),

    /// Malformed bedGraph input.
    #[error("Invalid bedGraph: {0}")]
    InvalidBedGraph(String),

    /// Error raised by the bigWig reader.
    #[error("bigWig error: {0}")]
    BigWig(String),

    #[error(transparent)]
    Region(#[from] RegionSetError),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
