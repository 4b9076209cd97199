use std::path::Path;
use std::sync::Mutex;

use bigtools::BigWigRead;
use bigtools::utils::reopen::ReopenableFile;

use chromloader_core::models::ChromSizes;

use crate::error::{Result, StoreError};
use crate::store::{TrackStore, check_range};

///
/// Track store reading directly from a bigWig file.
///
/// The reader needs `&mut` access, so lookups are serialized behind a mutex; clone
/// the store per worker (reopening the file) when that becomes a bottleneck.
///
pub struct BigWigTrackStore {
    reader: Mutex<BigWigRead<ReopenableFile>>,
    chrom_sizes: ChromSizes,
}

impl BigWigTrackStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| StoreError::BigWig(format!("non UTF-8 path: {:?}", path)))?;

        let reader = BigWigRead::open_file(path_str)
            .map_err(|e| StoreError::BigWig(format!("{}: {:?}", path.display(), e)))?;
        let chrom_sizes = reader
            .chroms()
            .iter()
            .map(|c| (c.name.clone(), c.length))
            .collect();

        Ok(BigWigTrackStore {
            reader: Mutex::new(reader),
            chrom_sizes,
        })
    }

    pub fn chrom_sizes(&self) -> &ChromSizes {
        &self.chrom_sizes
    }
}

impl TrackStore for BigWigTrackStore {
    fn values(&self, chr: &str, start: u32, end: u32) -> Result<Vec<f32>> {
        let len = self
            .chrom_sizes
            .get(chr)
            .ok_or_else(|| StoreError::UnknownChromosome(chr.to_string()))?;
        check_range(chr, start, end, len)?;

        let mut out = vec![0.0f32; (end - start) as usize];
        let mut reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::BigWig("reader lock poisoned".to_string()))?;

        let intervals = reader
            .get_interval(chr, start, end)
            .map_err(|e| StoreError::BigWig(format!("{:?}", e)))?;
        for value in intervals {
            let value = value.map_err(|e| StoreError::BigWig(format!("{:?}", e)))?;
            if value.value.is_nan() {
                continue;
            }
            let from = value.start.max(start);
            let to = value.end.min(end);
            if from < to {
                out[(from - start) as usize..(to - start) as usize].fill(value.value);
            }
        }

        Ok(out)
    }
}
