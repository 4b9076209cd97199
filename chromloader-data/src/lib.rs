//! # chromloader-data
//!
//! Turns labeled genomic intervals into training examples for sequence-to-profile
//! models: one-hot DNA windows paired with binned signal profiles.
//!
//! ## Pipeline
//!
//! - **[`RegionCatalog`]**: normalizes BED / narrowPeak records into fixed-width windows
//! - **[`ChromosomeSplitter`]**: train / validation / test split by chromosome
//! - **[`TrackExtractor`]**: one-hot sequences and binned profiles from a
//!   [`SequenceStore`](chromloader_io::SequenceStore) and a [`TrackStore`](chromloader_io::TrackStore)
//! - **[`NegativeSampler`]**: ratio-bounded non-peak subsampling
//! - **[`SequenceAugmentor`]**: random crop (jitter), reverse complement, shuffle
//! - **[`EpochDataset`]**: per-epoch materialized snapshots with index-based retrieval
//! - **[`BatchLoader`]**: batch iteration over a snapshot
//! - **[`DataModule`]**: wires all of the above from a [`DataConfig`]
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chromloader_core::models::{Region, RegionSet};
//! use chromloader_data::{DataConfig, EpochDataset, ExtractParams, StageConfig, TrackExtractor};
//! use chromloader_io::{InMemorySequenceStore, InMemoryTrackStore};
//!
//! let mut sequences = InMemorySequenceStore::new();
//! sequences.insert("chr1", &b"ACGT".repeat(100));
//! let mut tracks = InMemoryTrackStore::new();
//! tracks.insert("chr1", vec![1.0; 400]);
//! let extractor = TrackExtractor::new(Arc::new(sequences), Arc::new(tracks));
//!
//! let regions = RegionSet::from(vec![
//!     Region::new("chr1", 100, 200, true),
//!     Region::new("chr1", 200, 300, false),
//! ]);
//! let config = DataConfig { shift: 10, ..DataConfig::default() };
//! let params = ExtractParams::new(100, 50, 0);
//!
//! let mut dataset = EpochDataset::from_regions(
//!     &regions,
//!     &extractor,
//!     &params,
//!     StageConfig::train(&config),
//!     42,
//! )
//! .unwrap();
//! dataset.refresh().unwrap();
//!
//! let example = dataset.get(0).unwrap();
//! assert_eq!(example.sequence.dim(), (4, 100));
//! assert_eq!(example.profile.len(), 50);
//! ```
//!
pub mod arrays;
pub mod augment;
pub mod catalog;
pub mod config;
pub mod datamodule;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod loader;
pub mod median;
pub mod sampler;
pub mod splitter;
pub mod stage;

// re-export things
pub use arrays::*;
pub use augment::*;
pub use catalog::*;
pub use config::*;
pub use datamodule::*;
pub use dataset::*;
pub use encoding::*;
pub use error::*;
pub use extract::*;
pub use loader::*;
pub use median::*;
pub use sampler::*;
pub use splitter::*;
pub use stage::*;
