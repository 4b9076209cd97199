use log::info;
use ndarray::Axis;
use rand::Rng;

use chromloader_core::models::RegionSet;

use crate::error::{PipelineError, Result};
use crate::extract::{ExtractParams, TrackExtractor};
use crate::sampler::NegativeSampler;

///
/// Median of `values`. The two middle values are averaged for even lengths.
///
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(PipelineError::EmptyDataset(
            "cannot take the median of no values".to_string(),
        ));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    Ok(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

///
/// Median total count over the peaks of `regions` plus a ratio-sized sample of
/// its non-peaks. Typically used to weight the count loss.
///
/// # Arguments
///
/// - regions: usually the train and validation regions together
/// - ratio: non-peaks kept per peak; zero or below keeps them all
///
pub fn estimate_median_count<R: Rng + ?Sized>(
    regions: &RegionSet,
    extractor: &TrackExtractor,
    params: &ExtractParams,
    ratio: f64,
    rng: &mut R,
) -> Result<f64> {
    let (peaks, nonpeaks) = regions.split_peaks();
    let sampled = NegativeSampler::new(ratio).sample_regions(&nonpeaks, peaks.len(), rng);
    let selected = peaks.concat(&sampled);

    let profiles = extractor.extract_profiles(&selected, params)?;
    let totals: Vec<f64> = profiles
        .sum_axis(Axis(1))
        .iter()
        .map(|&v| v as f64)
        .collect();

    let median = median(&totals)?;
    info!(
        "Median count over {} regions ({} peaks): {}",
        selected.len(),
        peaks.len(),
        median
    );
    Ok(median)
}
