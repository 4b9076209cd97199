use fxhash::FxHashMap as HashMap;

use chromloader_core::models::ChromSizes;

use crate::error::{Result, StoreError};

///
/// Source of reference nucleotides.
///
/// Implementations are shared read-only across loader workers, hence `Send + Sync`.
///
pub trait SequenceStore: Send + Sync {
    ///
    /// Raw nucleotides of the half-open interval `[start, end)` on `chr`.
    /// The returned slice must be exactly `end - start` bytes long.
    ///
    fn fetch(&self, chr: &str, start: u32, end: u32) -> Result<Vec<u8>>;

    fn chrom_len(&self, chr: &str) -> Option<u32>;
}

///
/// Source of per-base signal (coverage, counts).
///
pub trait TrackStore: Send + Sync {
    ///
    /// One value per base of `[start, end)` on `chr`. Positions without data are 0.
    ///
    fn values(&self, chr: &str, start: u32, end: u32) -> Result<Vec<f32>>;
}

pub(crate) fn check_range(chr: &str, start: u32, end: u32, len: u32) -> Result<()> {
    if start >= end || end > len {
        return Err(StoreError::OutOfRange {
            chr: chr.to_string(),
            start,
            end,
            len,
        });
    }
    Ok(())
}

/// Whole chromosomes held in memory, upper-cased on insert.
#[derive(Clone, Debug, Default)]
pub struct InMemorySequenceStore {
    sequences: HashMap<String, Vec<u8>>,
}

impl InMemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, chr: S, sequence: &[u8]) {
        self.sequences
            .insert(chr.into(), sequence.to_ascii_uppercase());
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Chromosome lengths of everything loaded.
    pub fn chrom_sizes(&self) -> ChromSizes {
        self.sequences
            .iter()
            .map(|(chr, seq)| (chr.clone(), seq.len() as u32))
            .collect()
    }
}

impl SequenceStore for InMemorySequenceStore {
    fn fetch(&self, chr: &str, start: u32, end: u32) -> Result<Vec<u8>> {
        let seq = self
            .sequences
            .get(chr)
            .ok_or_else(|| StoreError::UnknownChromosome(chr.to_string()))?;
        check_range(chr, start, end, seq.len() as u32)?;
        Ok(seq[start as usize..end as usize].to_vec())
    }

    fn chrom_len(&self, chr: &str) -> Option<u32> {
        self.sequences.get(chr).map(|s| s.len() as u32)
    }
}

/// Dense per-base signal held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTrackStore {
    tracks: HashMap<String, Vec<f32>>,
}

impl InMemoryTrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-filled tracks for every chromosome in `chrom_sizes`.
    pub fn zeros(chrom_sizes: &ChromSizes) -> Self {
        let tracks = chrom_sizes
            .iter()
            .map(|(chr, len)| (chr.clone(), vec![0.0; *len as usize]))
            .collect();
        InMemoryTrackStore { tracks }
    }

    pub fn insert<S: Into<String>>(&mut self, chr: S, values: Vec<f32>) {
        self.tracks.insert(chr.into(), values);
    }

    pub(crate) fn track_mut(&mut self, chr: &str) -> Option<&mut Vec<f32>> {
        self.tracks.get_mut(chr)
    }
}

impl TrackStore for InMemoryTrackStore {
    fn values(&self, chr: &str, start: u32, end: u32) -> Result<Vec<f32>> {
        let track = self
            .tracks
            .get(chr)
            .ok_or_else(|| StoreError::UnknownChromosome(chr.to_string()))?;
        check_range(chr, start, end, track.len() as u32)?;
        Ok(track[start as usize..end as usize]
            .iter()
            .map(|v| if v.is_nan() { 0.0 } else { *v })
            .collect())
    }
}
