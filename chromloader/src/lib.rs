//! # chromloader
//!
//! Umbrella crate over the chromloader workspace. Each member is re-exported behind
//! a feature of the same name:
//!
//! - `core`: regions, region sets, chromosome sizes
//! - `io`: sequence and signal track stores (`bigwig` adds the bigWig reader)
//! - `data`: catalogs, splits, augmentation, epoch datasets and batch loaders
//!
#[cfg(feature = "core")]
#[doc(inline)]
pub use chromloader_core as core;

#[cfg(feature = "io")]
#[doc(inline)]
pub use chromloader_io as io;

#[cfg(feature = "data")]
#[doc(inline)]
pub use chromloader_data as data;
