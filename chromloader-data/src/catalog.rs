use std::path::Path;

use log::{info, warn};

use chromloader_core::models::{BedRecord, ChromSizes, Region, RegionSet};
use chromloader_core::utils::read_bed_records;

use crate::error::{PipelineError, Result};

///
/// Turns raw BED / narrowPeak records into fixed-width candidate windows.
///
/// Every record is re-centered on its anchor (summit or midpoint) and widened to
/// `window_length`. Windows that would not fit on the chromosome once grown by
/// `shift` bases on each side are dropped.
///
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    pub chrom_sizes: ChromSizes,
    pub window_length: u32,
    pub shift: u32,
}

impl RegionCatalog {
    pub fn new(chrom_sizes: ChromSizes, window_length: u32, shift: u32) -> Result<Self> {
        if window_length == 0 {
            return Err(PipelineError::Configuration(
                "window length must be positive".to_string(),
            ));
        }
        Ok(RegionCatalog {
            chrom_sizes,
            window_length,
            shift,
        })
    }

    ///
    /// Load and normalize every record of a region file.
    ///
    /// # Arguments
    ///
    /// - path: BED or narrowPeak file, optionally gzipped
    /// - is_peak: label stamped on every region
    ///
    pub fn load<P: AsRef<Path>>(&self, path: P, is_peak: bool) -> Result<RegionSet> {
        let path = path.as_ref();
        let records = read_bed_records(path)?;
        let mut regions = self.normalize_records(&records, is_peak)?;
        regions.path = Some(path.to_path_buf());

        info!(
            "Loaded {} {} regions from {}",
            regions.len(),
            if is_peak { "peak" } else { "non-peak" },
            path.display()
        );

        Ok(regions)
    }

    pub fn normalize_records(&self, records: &[BedRecord], is_peak: bool) -> Result<RegionSet> {
        let mut regions = Vec::with_capacity(records.len());
        let mut dropped = 0usize;

        for record in records {
            match self.normalize(record, is_peak)? {
                Some(region) => regions.push(region),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(
                "Dropped {} of {} regions whose {}bp window (+/- {}bp) runs off the chromosome",
                dropped,
                records.len(),
                self.window_length,
                self.shift
            );
        }

        Ok(RegionSet::from(regions))
    }

    ///
    /// Window of `window_length` bases centered on the record's anchor, or `None` when
    /// the window enlarged by `shift` does not fit on the chromosome.
    ///
    pub fn normalize(&self, record: &BedRecord, is_peak: bool) -> Result<Option<Region>> {
        let chrom_len = self.chrom_sizes.get(&record.chr).ok_or_else(|| {
            PipelineError::MalformedRegion(format!(
                "unknown chromosome {} in {}:{}-{}",
                record.chr, record.chr, record.start, record.end
            ))
        })?;

        let half = self.window_length / 2;
        let start = match record.anchor()?.checked_sub(half) {
            Some(start) if start >= self.shift => start,
            _ => return Ok(None),
        };
        let end = start as u64 + self.window_length as u64;
        if end + self.shift as u64 > chrom_len as u64 {
            return Ok(None);
        }

        Ok(Some(Region::new(&record.chr, start, end as u32, is_peak)))
    }
}

///
/// Load a region file into fixed-width windows in one call.
///
pub fn load_regions<P: AsRef<Path>>(
    path: P,
    chrom_sizes: &ChromSizes,
    window_length: u32,
    shift: u32,
    is_peak: bool,
) -> Result<RegionSet> {
    RegionCatalog::new(chrom_sizes.clone(), window_length, shift)?.load(path, is_peak)
}
