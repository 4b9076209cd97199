//! # Reference sequence and signal track stores.
//!
//! The data pipeline never parses genome or track files itself; it asks a
//! [`SequenceStore`] for nucleotides and a [`TrackStore`] for per-base signal over
//! half-open intervals. This crate defines those two seams and ships in-memory
//! implementations, loaders that fill them from FASTA and bedGraph files, and a
//! bigWig-backed track store behind the `bigwig` feature.
//!
pub mod bedgraph;
#[cfg(feature = "bigwig")]
pub mod bigwig;
pub mod error;
pub mod fasta;
pub mod store;

// re-expose core functions
pub use bedgraph::*;
#[cfg(feature = "bigwig")]
pub use bigwig::*;
pub use error::*;
pub use fasta::*;
pub use store::*;
