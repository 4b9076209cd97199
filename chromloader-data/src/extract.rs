use std::sync::Arc;

use log::debug;
use ndarray::{Array2, Array3, s};
use rayon::prelude::*;

use chromloader_core::models::{Orientation, Region, RegionSet};
use chromloader_io::{SequenceStore, StoreError, TrackStore};

use crate::arrays::{CoordinateRecord, ExampleArrays};
use crate::encoding::one_hot_into;
use crate::error::{PipelineError, Result};

///
/// Window geometry used when pulling sequence and signal for regions.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractParams {
    /// Sequence window length served to the model.
    pub input_length: u32,
    /// Number of profile bins served to the model.
    pub output_length: u32,
    /// Bases covered by the profile; `profile_width / output_length` bases per bin.
    pub profile_width: u32,
    /// Extra bases fetched on each side of peak windows so they can be cropped later.
    pub max_jitter: u32,
}

impl ExtractParams {
    /// Per-base profile (`profile_width == output_length`).
    pub fn new(input_length: u32, output_length: u32, max_jitter: u32) -> Self {
        ExtractParams {
            input_length,
            output_length,
            profile_width: output_length,
            max_jitter,
        }
    }

    pub fn with_profile_width(mut self, profile_width: u32) -> Self {
        self.profile_width = profile_width;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: u32) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    ///
    /// Bases aggregated into one profile bin.
    ///
    /// Fails when the profile width is not a multiple of the bin count, or when the
    /// jitter margin would shift the profile by a fraction of a bin.
    ///
    pub fn bin_size(&self) -> Result<u32> {
        if self.output_length == 0 || self.input_length == 0 {
            return Err(PipelineError::Configuration(
                "input and output lengths must be positive".to_string(),
            ));
        }
        if self.profile_width % self.output_length != 0 {
            return Err(PipelineError::Alignment(format!(
                "profile width {} is not divisible into {} bins",
                self.profile_width, self.output_length
            )));
        }
        let bin_size = self.profile_width / self.output_length;
        if (2 * self.max_jitter) % bin_size != 0 {
            return Err(PipelineError::Alignment(format!(
                "jitter margin {} is not a multiple of the {}bp bin size",
                2 * self.max_jitter,
                bin_size
            )));
        }
        Ok(bin_size)
    }
}

///
/// Pulls one-hot sequences and binned count profiles for regions out of a
/// sequence store and a track store.
///
#[derive(Clone)]
pub struct TrackExtractor {
    sequences: Arc<dyn SequenceStore>,
    tracks: Arc<dyn TrackStore>,
}

/// Output of [TrackExtractor::extract]: peaks (jitter-enlarged) and non-peaks, kept apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub peaks: ExampleArrays,
    pub nonpeaks: ExampleArrays,
}

struct ExtractedRow {
    seq: Vec<u8>,
    profile: Vec<f32>,
    coord: CoordinateRecord,
}

fn extraction_error(region: &Region, source: StoreError) -> PipelineError {
    PipelineError::TrackExtraction {
        region: format!("{}:{}-{}", region.chr, region.start, region.end),
        source,
    }
}

impl TrackExtractor {
    pub fn new(sequences: Arc<dyn SequenceStore>, tracks: Arc<dyn TrackStore>) -> Self {
        TrackExtractor { sequences, tracks }
    }

    ///
    /// Extract every region of a (possibly mixed) region set.
    ///
    /// Peak windows are grown by `params.max_jitter` on each side, non-peak
    /// windows are fetched at their final size.
    ///
    pub fn extract(&self, regions: &RegionSet, params: &ExtractParams) -> Result<Extracted> {
        let (peaks, nonpeaks) = regions.split_peaks();
        Ok(Extracted {
            peaks: self.extract_with_jitter(&peaks, params, params.max_jitter)?,
            nonpeaks: self.extract_with_jitter(&nonpeaks, params, 0)?,
        })
    }

    ///
    /// Extract every region with the same `jitter` flank, regardless of its label.
    ///
    /// Sequences come out as `(n, input_length + 2 * jitter, 4)` and profiles as
    /// `(n, output_length + 2 * jitter / bin_size)`.
    ///
    pub fn extract_with_jitter(
        &self,
        regions: &RegionSet,
        params: &ExtractParams,
        jitter: u32,
    ) -> Result<ExampleArrays> {
        let params = params.with_max_jitter(jitter);
        let bin_size = params.bin_size()? as usize;

        let seq_len = (params.input_length + 2 * jitter) as usize;
        let profile_len = (params.profile_width + 2 * jitter) as usize / bin_size;

        let rows = regions
            .regions
            .par_iter()
            .map(|region| self.extract_region(region, &params, bin_size))
            .collect::<Result<Vec<ExtractedRow>>>()?;

        let n = rows.len();
        let mut seqs = Array3::<u8>::zeros((n, seq_len, 4));
        let mut cts = Array2::<f32>::zeros((n, profile_len));
        let mut coords = Vec::with_capacity(n);

        for (i, row) in rows.into_iter().enumerate() {
            one_hot_into(&row.seq, seqs.slice_mut(s![i, .., ..]));
            for (j, v) in row.profile.into_iter().enumerate() {
                cts[[i, j]] = v;
            }
            coords.push(row.coord);
        }

        debug!(
            "Extracted {} windows of {}bp with {} profile bins",
            n, seq_len, profile_len
        );

        ExampleArrays::new(seqs, cts, coords)
    }

    ///
    /// Binned count profiles only, without jitter. Used for count statistics.
    ///
    pub fn extract_profiles(&self, regions: &RegionSet, params: &ExtractParams) -> Result<Array2<f32>> {
        let params = params.with_max_jitter(0);
        let bin_size = params.bin_size()? as usize;

        let profiles = regions
            .regions
            .par_iter()
            .map(|region| self.fetch_profile(region, &params, bin_size))
            .collect::<Result<Vec<Vec<f32>>>>()?;

        let n = profiles.len();
        let flat: Vec<f32> = profiles.into_iter().flatten().collect();
        Array2::from_shape_vec((n, params.output_length as usize), flat)
            .map_err(|e| PipelineError::Alignment(e.to_string()))
    }

    fn extract_region(
        &self,
        region: &Region,
        params: &ExtractParams,
        bin_size: usize,
    ) -> Result<ExtractedRow> {
        let jitter = params.max_jitter;
        let (start, end) = region.centered(params.input_length, jitter).ok_or_else(|| {
            extraction_error(
                region,
                StoreError::InvalidInterval(format!(
                    "{}bp window with {}bp flank starts before the chromosome",
                    params.input_length, jitter
                )),
            )
        })?;

        let seq = self
            .sequences
            .fetch(&region.chr, start, end)
            .map_err(|e| extraction_error(region, e))?;
        if seq.len() != (end - start) as usize {
            return Err(extraction_error(
                region,
                StoreError::InvalidInterval(format!(
                    "expected {} bases, store returned {}",
                    end - start,
                    seq.len()
                )),
            ));
        }

        let profile = self.fetch_profile(region, params, bin_size)?;

        Ok(ExtractedRow {
            seq,
            profile,
            coord: CoordinateRecord {
                chr: region.chr.clone(),
                start,
                orientation: Orientation::Forward,
                is_peak: region.is_peak,
            },
        })
    }

    fn fetch_profile(
        &self,
        region: &Region,
        params: &ExtractParams,
        bin_size: usize,
    ) -> Result<Vec<f32>> {
        let jitter = params.max_jitter;
        let (start, end) = region.centered(params.profile_width, jitter).ok_or_else(|| {
            extraction_error(
                region,
                StoreError::InvalidInterval(format!(
                    "{}bp profile with {}bp flank starts before the chromosome",
                    params.profile_width, jitter
                )),
            )
        })?;

        let values = self
            .tracks
            .values(&region.chr, start, end)
            .map_err(|e| extraction_error(region, e))?;
        if values.len() != (end - start) as usize {
            return Err(extraction_error(
                region,
                StoreError::InvalidInterval(format!(
                    "expected {} signal values, store returned {}",
                    end - start,
                    values.len()
                )),
            ));
        }

        Ok(values
            .chunks_exact(bin_size)
            .map(|bin| bin.iter().map(|v| if v.is_nan() { 0.0 } else { *v }).sum())
            .collect())
    }
}
