use std::sync::Arc;

use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;

use chromloader_core::models::RegionSet;

use crate::arrays::{CoordinateRecord, ExampleArrays};
use crate::augment::SequenceAugmentor;
use crate::extract::{ExtractParams, Extracted, TrackExtractor};
use crate::error::{PipelineError, Result};
use crate::loader::BatchLoader;
use crate::sampler::NegativeSampler;
use crate::stage::StageConfig;

///
/// One served example.
///
/// - `sequence`: channel-first one-hot window, `(4, input_length)`
/// - `profile`: `(output_length,)`
///
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub sequence: Array2<f32>,
    pub profile: Array1<f32>,
}

///
/// Examples materialized for one epoch. Never mutated once built; a refresh
/// produces a new snapshot instead.
///
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSnapshot {
    pub epoch: u64,
    pub arrays: ExampleArrays,
}

impl EpochSnapshot {
    pub fn new(epoch: u64, arrays: ExampleArrays) -> Self {
        EpochSnapshot { epoch, arrays }
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(PipelineError::IndexOutOfRange {
                index,
                size: self.len(),
            });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<Example> {
        self.check_index(index)?;
        let sequence = self
            .arrays
            .seqs
            .index_axis(Axis(0), index)
            .t()
            .mapv(f32::from);
        let profile = self.arrays.cts.index_axis(Axis(0), index).to_owned();
        Ok(Example { sequence, profile })
    }

    /// Where example `index` came from.
    pub fn coords(&self, index: usize) -> Result<&CoordinateRecord> {
        self.check_index(index)?;
        Ok(&self.arrays.coords[index])
    }
}

///
/// Peak and non-peak examples of one stage, re-sampled and re-augmented at every
/// [refresh](EpochDataset::refresh).
///
/// The dataset starts out stale: nothing can be retrieved until the first refresh.
///
/// ```no_run
/// # fn demo(dataset: &mut chromloader_data::EpochDataset) -> chromloader_data::error::Result<()> {
/// dataset.refresh()?;
/// for batch in dataset.loader()? {
///     let batch = batch?;
///     assert_eq!(batch.sequence.shape()[1], 4);
/// }
/// # Ok(())
/// # }
/// ```
///
pub struct EpochDataset {
    peaks: ExampleArrays,
    nonpeaks: ExampleArrays,
    stage: StageConfig,
    sampler: NegativeSampler,
    augmentor: SequenceAugmentor,
    seed: u64,
    rng: StdRng,
    epoch: u64,
    snapshot: Option<Arc<EpochSnapshot>>,
}

impl EpochDataset {
    ///
    /// Build a dataset from extracted arrays.
    ///
    /// Peaks must be enlarged by `stage.max_jitter` on each side; non-peaks must
    /// already be at `params.input_length`.
    ///
    pub fn new(extracted: Extracted, params: &ExtractParams, stage: StageConfig, seed: u64) -> Result<Self> {
        let Extracted { peaks, nonpeaks } = extracted;
        if peaks.is_empty() && nonpeaks.is_empty() {
            return Err(PipelineError::EmptyDataset(format!(
                "no peak or non-peak examples for the {} stage",
                stage.stage
            )));
        }

        let bin_size = params.with_max_jitter(stage.max_jitter).bin_size()? as usize;
        let augmentor = SequenceAugmentor::new(
            params.input_length as usize,
            params.output_length as usize,
            bin_size,
        )
        .with_revcomp(stage.add_revcomp, stage.revcomp_fraction)
        .with_shuffle(stage.shuffle_at_epoch_start);

        Ok(EpochDataset {
            peaks,
            nonpeaks,
            sampler: NegativeSampler::new(stage.negative_sampling_ratio),
            augmentor,
            stage,
            seed,
            rng: StdRng::seed_from_u64(seed),
            epoch: 0,
            snapshot: None,
        })
    }

    /// Extract `regions` and build a dataset over them.
    pub fn from_regions(
        regions: &RegionSet,
        extractor: &TrackExtractor,
        params: &ExtractParams,
        stage: StageConfig,
        seed: u64,
    ) -> Result<Self> {
        let params = params.with_max_jitter(stage.max_jitter);
        let extracted = extractor.extract(regions, &params)?;
        Self::new(extracted, &params, stage, seed)
    }

    ///
    /// Materialize the next epoch from the internal rng and swap it in.
    ///
    pub fn refresh(&mut self) -> Result<Arc<EpochSnapshot>> {
        let mut rng = self.rng.clone();
        let arrays = self.materialize(&mut rng)?;
        self.rng = rng;
        Ok(self.install(arrays))
    }

    /// Like [refresh](EpochDataset::refresh), drawing from a caller-supplied rng.
    pub fn refresh_with(&mut self, rng: &mut StdRng) -> Result<Arc<EpochSnapshot>> {
        let arrays = self.materialize(rng)?;
        Ok(self.install(arrays))
    }

    /// Restart the internal rng from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn materialize(&self, rng: &mut StdRng) -> Result<ExampleArrays> {
        let peaks = self.augmentor.random_crop(&self.peaks, rng)?;

        let nonpeaks = if peaks.is_empty() {
            self.nonpeaks.clone()
        } else {
            self.sampler.sample(&self.nonpeaks, peaks.len(), rng)
        };

        let mut arrays = peaks.concat(&nonpeaks)?;
        if self.augmentor.add_revcomp {
            arrays = self.augmentor.reverse_complement(&arrays, rng);
        }
        if self.augmentor.shuffle {
            arrays = self.augmentor.shuffle(&arrays, rng);
        }

        Ok(arrays)
    }

    fn install(&mut self, arrays: ExampleArrays) -> Arc<EpochSnapshot> {
        self.epoch += 1;
        debug!(
            "{} epoch {}: {} examples ({} peaks)",
            self.stage.stage,
            self.epoch,
            arrays.len(),
            arrays.peak_count()
        );
        let snapshot = Arc::new(EpochSnapshot::new(self.epoch, arrays));
        self.snapshot = Some(snapshot.clone());
        snapshot
    }

    pub fn is_materialized(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Current snapshot, `NotMaterialized` before the first refresh.
    pub fn snapshot(&self) -> Result<Arc<EpochSnapshot>> {
        self.snapshot.clone().ok_or(PipelineError::NotMaterialized)
    }

    /// Materialized examples; 0 before the first refresh.
    pub fn len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<Example> {
        self.snapshot
            .as_ref()
            .ok_or(PipelineError::NotMaterialized)?
            .get(index)
    }

    pub fn coords(&self, index: usize) -> Result<CoordinateRecord> {
        self.snapshot
            .as_ref()
            .ok_or(PipelineError::NotMaterialized)?
            .coords(index)
            .cloned()
    }

    ///
    /// Batches over the current snapshot. The shuffle order changes with every epoch.
    ///
    pub fn loader(&self) -> Result<BatchLoader> {
        let options = self
            .stage
            .loader
            .clone()
            .with_seed(self.seed.wrapping_add(self.epoch));
        BatchLoader::new(self.snapshot()?, &options)
    }

    pub fn stage(&self) -> &StageConfig {
        &self.stage
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn peak_count(&self) -> usize {
        self.peaks.len()
    }

    pub fn nonpeak_count(&self) -> usize {
        self.nonpeaks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chromloader_core::models::Orientation;
    use ndarray::Array3;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::config::DataConfig;

    fn arrays(n: usize, seq_len: usize, profile_len: usize, is_peak: bool) -> ExampleArrays {
        let coords = (0..n)
            .map(|i| CoordinateRecord {
                chr: "chr1".to_string(),
                start: i as u32,
                orientation: Orientation::Forward,
                is_peak,
            })
            .collect();
        let seqs = Array3::from_shape_fn((n, seq_len, 4), |(_, j, c)| u8::from(j % 4 == c));
        let cts = Array2::from_shape_fn((n, profile_len), |(i, j)| (i + j) as f32);
        ExampleArrays::new(seqs, cts, coords).unwrap()
    }

    fn dataset(n_peaks: usize, n_nonpeaks: usize, ratio: f64, seed: u64) -> EpochDataset {
        let config = DataConfig {
            shift: 2,
            negative_sampling_ratio: ratio,
            ..DataConfig::default()
        };
        let stage = StageConfig::train(&config);
        let params = ExtractParams::new(8, 8, 2);
        let extracted = Extracted {
            peaks: arrays(n_peaks, 12, 12, true),
            nonpeaks: arrays(n_nonpeaks, 8, 8, false),
        };
        EpochDataset::new(extracted, &params, stage, seed).unwrap()
    }

    #[rstest]
    fn test_stale_until_refresh() {
        let dataset = dataset(4, 10, 0.5, 1);
        assert!(!dataset.is_materialized());
        assert_eq!(dataset.len(), 0);
        assert!(matches!(dataset.get(0), Err(PipelineError::NotMaterialized)));
        assert!(matches!(dataset.loader(), Err(PipelineError::NotMaterialized)));
    }

    #[rstest]
    fn test_refresh_sizes() {
        let mut dataset = dataset(4, 10, 0.5, 1);
        let snapshot = dataset.refresh().unwrap();
        assert_eq!(snapshot.len(), 6);
        assert_eq!(snapshot.arrays.peak_count(), 4);
        assert_eq!(snapshot.arrays.seq_len(), 8);
        assert_eq!(dataset.len(), 6);
        assert_eq!(dataset.epoch(), 1);
    }

    #[rstest]
    fn test_get_bounds() {
        let mut dataset = dataset(4, 10, 0.5, 1);
        dataset.refresh().unwrap();

        let example = dataset.get(dataset.len() - 1).unwrap();
        assert_eq!(example.sequence.dim(), (4, 8));
        assert_eq!(example.profile.dim(), 8);
        assert!(matches!(
            dataset.get(dataset.len()),
            Err(PipelineError::IndexOutOfRange { index: 6, size: 6 })
        ));
    }

    #[rstest]
    fn test_same_seed_same_snapshots() {
        let mut a = dataset(5, 40, 2.0, 7);
        let mut b = dataset(5, 40, 2.0, 7);
        for _ in 0..3 {
            assert_eq!(a.refresh().unwrap(), b.refresh().unwrap());
        }
    }

    #[rstest]
    fn test_epochs_differ() {
        let mut dataset = dataset(5, 40, 2.0, 7);
        let first = dataset.refresh().unwrap();
        let second = dataset.refresh().unwrap();
        assert_eq!(first.len(), second.len());
        assert_ne!(first.arrays.coords, second.arrays.coords);
    }

    #[rstest]
    fn test_loader_keeps_its_snapshot() {
        let mut dataset = dataset(5, 40, 2.0, 7);
        dataset.refresh().unwrap();
        let loader = dataset.loader().unwrap();
        dataset.refresh().unwrap();

        assert_eq!(loader.snapshot().epoch, 1);
        assert_eq!(dataset.snapshot().unwrap().epoch, 2);
        let served: usize = loader.map(|b| b.unwrap().len()).sum();
        assert_eq!(served, 15);
    }

    #[rstest]
    fn test_refresh_with_external_rng() {
        let mut internal = dataset(5, 40, 2.0, 7);
        internal.refresh().unwrap();
        internal.reseed(11);
        let expected = internal.refresh().unwrap();

        let mut external = dataset(5, 40, 2.0, 7);
        let mut rng = StdRng::seed_from_u64(11);
        let snapshot = external.refresh_with(&mut rng).unwrap();
        assert_eq!(snapshot.arrays, expected.arrays);
        assert_eq!(external.epoch(), 1);
    }

    #[rstest]
    fn test_sampling_ratio_override_keeps_every_nonpeak() {
        let config = DataConfig {
            shift: 2,
            ..DataConfig::default()
        };
        let stage = StageConfig::train(&config).with_negative_sampling_ratio(-1.0);
        let extracted = Extracted {
            peaks: arrays(3, 12, 12, true),
            nonpeaks: arrays(25, 8, 8, false),
        };
        let mut dataset = EpochDataset::new(extracted, &ExtractParams::new(8, 8, 2), stage, 1).unwrap();
        let snapshot = dataset.refresh().unwrap();
        assert_eq!(snapshot.len(), 28);
        assert_eq!(snapshot.arrays.peak_count(), 3);
    }

    #[rstest]
    fn test_only_nonpeaks_are_served_whole() {
        let mut dataset = dataset(0, 10, 0.1, 1);
        assert_eq!(dataset.refresh().unwrap().len(), 10);
    }

    #[rstest]
    fn test_empty_dataset() {
        let config = DataConfig::default();
        let result = EpochDataset::new(
            Extracted {
                peaks: ExampleArrays::empty(8, 8),
                nonpeaks: ExampleArrays::empty(8, 8),
            },
            &ExtractParams::new(8, 8, 0),
            StageConfig::test(&config),
            0,
        );
        assert!(matches!(result, Err(PipelineError::EmptyDataset(_))));
    }
}
