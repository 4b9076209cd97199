//! # chromloader-core
//!
//! Core data models shared by the chromloader crates: genomic [`Region`](models::Region)s,
//! [`RegionSet`](models::RegionSet)s partitioned into peaks and non-peaks, chromosome size
//! tables and the raw BED/narrowPeak records regions are built from.
//!
//! ## Example
//!
//! ```rust
//! use chromloader_core::models::{Region, RegionSet};
//!
//! let rs = RegionSet::from(vec![
//!     Region::new("chr1", 100, 200, true),
//!     Region::new("chr1", 500, 600, false),
//! ]);
//! let (peaks, nonpeaks) = rs.split_peaks();
//! assert_eq!(peaks.len(), 1);
//! assert_eq!(nonpeaks.len(), 1);
//! ```
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::*;
