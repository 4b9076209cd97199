use std::fmt::{self, Display};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use chromloader_core::models::{ChromSizes, RegionSet};
use chromloader_io::{FastaStore, InMemoryTrackStore, SequenceStore, TrackStore};

use crate::catalog::RegionCatalog;
use crate::config::{DataConfig, TrackFileType};
use crate::dataset::EpochDataset;
use crate::error::{PipelineError, Result};
use crate::extract::{ExtractParams, TrackExtractor};
use crate::loader::BatchLoader;
use crate::median::estimate_median_count;
use crate::sampler::NegativeSampler;
use crate::splitter::{ChromosomeSplitter, SplitRegions};
use crate::stage::{Stage, StageConfig};

/// Seed of the debug subsampling, fixed so debug runs see the same regions.
const DEBUG_SEED: u64 = 42;
const DEBUG_PEAK_FRACTION: f64 = 0.01;
const DEBUG_NEGATIVE_FRACTION: f64 = 0.1;

/// Which datasets [DataModule::setup] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    /// Train and validation.
    Fit,
    Test,
}

impl FromStr for SetupStage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fit" => Ok(SetupStage::Fit),
            "test" => Ok(SetupStage::Test),
            other => Err(PipelineError::Configuration(format!(
                "unknown setup stage: {}",
                other
            ))),
        }
    }
}

///
/// Chromosomes a [chrom_dataset](DataModule::chrom_dataset) is built over.
///
/// Parses from `train`, `val`, `test`, `all`, or a comma-separated list of names.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromSelection {
    Stage(Stage),
    All,
    Names(Vec<String>),
}

impl FromStr for ChromSelection {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(ChromSelection::Stage(Stage::Train)),
            "val" => Ok(ChromSelection::Stage(Stage::Validation)),
            "test" => Ok(ChromSelection::Stage(Stage::Test)),
            "all" => Ok(ChromSelection::All),
            names => {
                let names: Vec<String> = names
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect();
                if names.is_empty() {
                    return Err(PipelineError::Configuration(
                        "empty chromosome selection".to_string(),
                    ));
                }
                Ok(ChromSelection::Names(names))
            }
        }
    }
}

impl Display for ChromSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChromSelection::Stage(Stage::Validation) => write!(f, "val"),
            ChromSelection::Stage(stage) => write!(f, "{}", stage),
            ChromSelection::All => write!(f, "all"),
            ChromSelection::Names(names) => write!(f, "{}", names.join(",")),
        }
    }
}

/// Region sets a [DataModule] is built from.
#[derive(Debug, Clone, Default)]
pub struct RegionInputs {
    pub peaks: RegionSet,
    pub negatives: Option<RegionSet>,
    pub background: Option<RegionSet>,
}

///
/// Owns the region catalogs and their chromosome split, and builds the epoch
/// datasets and batch loaders of every stage.
///
/// ```no_run
/// use chromloader_data::{DataModule, SetupStage};
///
/// let mut dm = DataModule::from_config("data.toml").unwrap();
/// dm.setup(SetupStage::Fit).unwrap();
/// for _epoch in 0..10 {
///     for batch in dm.train_loader().unwrap() {
///         let batch = batch.unwrap();
///         assert_eq!(batch.sequence.shape()[1], 4);
///     }
/// }
/// ```
///
pub struct DataModule {
    config: DataConfig,
    extractor: TrackExtractor,
    params: ExtractParams,
    splitter: ChromosomeSplitter,

    peaks: RegionSet,
    negatives: Option<RegionSet>,
    background: Option<RegionSet>,
    /// Peaks followed by negatives.
    data: RegionSet,
    split: SplitRegions,

    train_dataset: Option<EpochDataset>,
    val_dataset: Option<EpochDataset>,
    test_dataset: Option<EpochDataset>,
    negative_dataset: Option<EpochDataset>,

    median_count: Option<f64>,
}

impl DataModule {
    ///
    /// Read a TOML config and open the FASTA and signal track it points to.
    ///
    pub fn from_config<P: AsRef<Path>>(cfg_path: P) -> Result<Self> {
        let config = DataConfig::try_from(cfg_path.as_ref())?;
        Self::open(config)
    }

    ///
    /// Open the stores named by `config`: the FASTA is loaded into memory, the signal
    /// track is read as bigWig or bedGraph depending on its extension.
    ///
    pub fn open(config: DataConfig) -> Result<Self> {
        config.validate()?;
        let chrom_sizes = ChromSizes::from_path(&config.chrom_sizes)?;

        let t0 = Instant::now();
        let sequences: Arc<dyn SequenceStore> = Arc::new(FastaStore::from_fasta(&config.fasta)?);
        let tracks = open_track_store(&config.bigwig, &chrom_sizes)?;
        info!(
            "Opened genome and signal track in {:.2} seconds",
            t0.elapsed().as_secs_f64()
        );

        Self::load(config, chrom_sizes, TrackExtractor::new(sequences, tracks))
    }

    ///
    /// Build a data module over caller-provided stores. Region files are still
    /// read from the paths in `config`.
    ///
    pub fn new(
        config: DataConfig,
        sequences: Arc<dyn SequenceStore>,
        tracks: Arc<dyn TrackStore>,
    ) -> Result<Self> {
        config.validate()?;
        let chrom_sizes = ChromSizes::from_path(&config.chrom_sizes)?;
        Self::load(config, chrom_sizes, TrackExtractor::new(sequences, tracks))
    }

    fn load(config: DataConfig, chrom_sizes: ChromSizes, extractor: TrackExtractor) -> Result<Self> {
        let catalog = RegionCatalog::new(chrom_sizes, config.in_window, config.shift)?;

        let peaks = catalog.load(&config.peaks, true)?;
        let negatives = config
            .negatives
            .as_ref()
            .map(|path| catalog.load(path, false))
            .transpose()?;
        let background = config
            .background
            .as_ref()
            .map(|path| catalog.load(path, false))
            .transpose()?;

        Self::from_regions(
            config,
            RegionInputs {
                peaks,
                negatives,
                background,
            },
            extractor,
        )
    }

    ///
    /// Build a data module from already normalized regions.
    ///
    /// Region windows must be `config.in_window` wide; paths in `config` are not used.
    ///
    pub fn from_regions(config: DataConfig, inputs: RegionInputs, extractor: TrackExtractor) -> Result<Self> {
        let params = ExtractParams::new(config.in_window, config.out_window, 0)
            .with_profile_width(config.profile_width());
        // jitter margins must line up with the profile bins before anything is extracted
        params.with_max_jitter(config.shift).bin_size()?;

        let RegionInputs {
            mut peaks,
            mut negatives,
            background,
        } = inputs;

        if config.debug {
            let (p, n) = debug_subsample(&peaks, negatives.as_ref());
            peaks = p;
            negatives = n;
        }

        let data = match &negatives {
            Some(negatives) => peaks.concat(negatives),
            None => peaks.clone(),
        };

        let splitter = ChromosomeSplitter::new(
            &config.training_chroms,
            &config.validation_chroms,
            &config.test_chroms,
            &config.exclude_chroms,
        )?;
        let mut split = splitter.split(&data);

        if config.train_with_background {
            match &background {
                Some(background) => {
                    let train_background = splitter.split(background).train;
                    info!(
                        "Adding {} background regions to the training set",
                        train_background.len()
                    );
                    split.train = split.train.concat(&train_background);
                }
                None => warn!("train_with_background is set but no background regions were given"),
            }
        }

        Ok(DataModule {
            config,
            extractor,
            params,
            splitter,
            peaks,
            negatives,
            background,
            data,
            split,
            train_dataset: None,
            val_dataset: None,
            test_dataset: None,
            negative_dataset: None,
            median_count: None,
        })
    }

    fn stage_dataset(&self, stage: Stage) -> Result<EpochDataset> {
        EpochDataset::from_regions(
            self.split.get(stage),
            &self.extractor,
            &self.params,
            StageConfig::for_stage(stage, &self.config),
            self.config.seed,
        )
    }

    ///
    /// Extract the datasets of `stage`. Validation and test datasets are materialized
    /// here, once; the train dataset is materialized by every [train_loader](DataModule::train_loader) call.
    ///
    pub fn setup(&mut self, stage: SetupStage) -> Result<()> {
        info!("Setting up data...");
        let t0 = Instant::now();

        match stage {
            SetupStage::Fit => {
                let train = self.stage_dataset(Stage::Train)?;
                let mut val = self.stage_dataset(Stage::Validation)?;
                val.refresh()?;
                self.train_dataset = Some(train);
                self.val_dataset = Some(val);
            }
            SetupStage::Test => {
                let mut test = self.stage_dataset(Stage::Test)?;
                test.refresh()?;
                self.test_dataset = Some(test);
            }
        }

        info!(
            "Data setup complete in {:.2} seconds",
            t0.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Re-sample and re-augment the train dataset, then batch it.
    pub fn train_loader(&mut self) -> Result<BatchLoader> {
        let dataset = self
            .train_dataset
            .as_mut()
            .ok_or_else(|| not_set_up("train", "setup(SetupStage::Fit)"))?;
        dataset.refresh()?;
        dataset.loader()
    }

    pub fn val_loader(&self) -> Result<BatchLoader> {
        self.val_dataset
            .as_ref()
            .ok_or_else(|| not_set_up("validation", "setup(SetupStage::Fit)"))?
            .loader()
    }

    pub fn test_loader(&self) -> Result<BatchLoader> {
        self.test_dataset
            .as_ref()
            .ok_or_else(|| not_set_up("test", "setup(SetupStage::Test)"))?
            .loader()
    }

    ///
    /// Every negative region, without jitter or sampling. Built on first use.
    ///
    pub fn negative_dataset(&mut self) -> Result<&EpochDataset> {
        if self.negative_dataset.is_none() {
            let negatives = self.negatives.as_ref().ok_or_else(|| {
                PipelineError::Configuration("no negative regions were configured".to_string())
            })?;
            let mut dataset = EpochDataset::from_regions(
                negatives,
                &self.extractor,
                &self.params,
                StageConfig::test(&self.config),
                self.config.seed,
            )?;
            dataset.refresh()?;
            self.negative_dataset = Some(dataset);
        }
        self.negative_dataset
            .as_ref()
            .ok_or(PipelineError::NotMaterialized)
    }

    pub fn negative_loader(&mut self) -> Result<BatchLoader> {
        self.negative_dataset()?.loader()
    }

    ///
    /// Jitter-free dataset over the peaks and negatives of `selection`.
    ///
    /// A positive `negative_sampling_ratio` subsamples the non-peaks once, relative to
    /// the number of peaks; otherwise every non-peak is kept.
    ///
    pub fn chrom_dataset(&self, selection: &ChromSelection, negative_sampling_ratio: f64) -> Result<EpochDataset> {
        let chroms: Vec<String> = match selection {
            ChromSelection::Stage(stage) => self.splitter.chroms(*stage).to_vec(),
            ChromSelection::All => self.splitter.all_chroms(),
            ChromSelection::Names(names) => names.clone(),
        };

        let (peaks, nonpeaks) = self.data.filter_chroms(&chroms).split_peaks();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let nonpeaks = NegativeSampler::new(negative_sampling_ratio).sample_regions(&nonpeaks, peaks.len(), &mut rng);
        info!(
            "Chromosome dataset {}: {} peaks, {} non-peaks",
            selection,
            peaks.len(),
            nonpeaks.len()
        );

        let mut dataset = EpochDataset::from_regions(
            &peaks.concat(&nonpeaks),
            &self.extractor,
            &self.params,
            StageConfig::test(&self.config),
            self.config.seed,
        )?;
        dataset.refresh()?;
        Ok(dataset)
    }

    ///
    /// Loader over [chrom_dataset](DataModule::chrom_dataset), returned with the
    /// dataset so coordinates can be looked up.
    ///
    pub fn chrom_loader(
        &self,
        selection: &ChromSelection,
        negative_sampling_ratio: f64,
    ) -> Result<(BatchLoader, EpochDataset)> {
        let dataset = self.chrom_dataset(selection, negative_sampling_ratio)?;
        Ok((dataset.loader()?, dataset))
    }

    ///
    /// Median total count over the train and validation regions, non-peaks
    /// subsampled at `negative_sampling_ratio`. Recomputed on every call.
    ///
    pub fn median_count<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        estimate_median_count(
            &self.split.train_val(),
            &self.extractor,
            &self.params,
            self.config.negative_sampling_ratio,
            rng,
        )
    }

    /// [median_count](DataModule::median_count) seeded from the config, computed once.
    pub fn median_count_cached(&mut self) -> Result<f64> {
        if let Some(median) = self.median_count {
            return Ok(median);
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let median = self.median_count(&mut rng)?;
        self.median_count = Some(median);
        Ok(median)
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    pub fn params(&self) -> &ExtractParams {
        &self.params
    }

    pub fn extractor(&self) -> &TrackExtractor {
        &self.extractor
    }

    pub fn splitter(&self) -> &ChromosomeSplitter {
        &self.splitter
    }

    pub fn peaks(&self) -> &RegionSet {
        &self.peaks
    }

    pub fn negatives(&self) -> Option<&RegionSet> {
        self.negatives.as_ref()
    }

    pub fn background(&self) -> Option<&RegionSet> {
        self.background.as_ref()
    }

    pub fn data(&self) -> &RegionSet {
        &self.data
    }

    pub fn split(&self) -> &SplitRegions {
        &self.split
    }

    pub fn train_dataset(&self) -> Option<&EpochDataset> {
        self.train_dataset.as_ref()
    }

    pub fn val_dataset(&self) -> Option<&EpochDataset> {
        self.val_dataset.as_ref()
    }

    pub fn test_dataset(&self) -> Option<&EpochDataset> {
        self.test_dataset.as_ref()
    }
}

fn not_set_up(name: &str, call: &str) -> PipelineError {
    PipelineError::Configuration(format!(
        "the {} dataset is not set up, call {} first",
        name, call
    ))
}

fn open_track_store(path: &Path, chrom_sizes: &ChromSizes) -> Result<Arc<dyn TrackStore>> {
    match TrackFileType::from_path(path)? {
        TrackFileType::BigWig => open_bigwig(path),
        TrackFileType::BedGraph | TrackFileType::BedGraphGz => Ok(Arc::new(
            InMemoryTrackStore::from_bedgraph(path, chrom_sizes)?,
        )),
    }
}

#[cfg(feature = "bigwig")]
fn open_bigwig(path: &Path) -> Result<Arc<dyn TrackStore>> {
    Ok(Arc::new(chromloader_io::BigWigTrackStore::open(path)?))
}

#[cfg(not(feature = "bigwig"))]
fn open_bigwig(path: &Path) -> Result<Arc<dyn TrackStore>> {
    Err(PipelineError::Configuration(format!(
        "{} is a bigWig file, rebuild with the `bigwig` feature to read it",
        path.display()
    )))
}

fn subsample(regions: &RegionSet, amount: usize, seed: u64) -> RegionSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, regions.len(), amount.min(regions.len())).into_vec();
    picked.sort_unstable();
    regions.select(&picked)
}

///
/// Keep 1% of the peaks and negatives worth 10% of the kept peaks.
///
fn debug_subsample(peaks: &RegionSet, negatives: Option<&RegionSet>) -> (RegionSet, Option<RegionSet>) {
    let n_peaks = (DEBUG_PEAK_FRACTION * peaks.len() as f64) as usize;
    let peaks = subsample(peaks, n_peaks, DEBUG_SEED);
    let negatives = negatives.map(|negatives| {
        let n_negatives = (DEBUG_NEGATIVE_FRACTION * peaks.len() as f64) as usize;
        subsample(negatives, n_negatives, DEBUG_SEED)
    });

    warn!(
        "Debug mode: keeping {} peaks and {} negatives",
        peaks.len(),
        negatives.as_ref().map_or(0, |n| n.len())
    );
    (peaks, negatives)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chromloader_core::models::Region;
    use chromloader_io::InMemorySequenceStore;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const CHROM_LEN: u32 = 2_000;

    fn extractor() -> TrackExtractor {
        let mut sequences = InMemorySequenceStore::new();
        let mut tracks = InMemoryTrackStore::new();
        for chr in ["chr1", "chr2", "chr3"] {
            sequences.insert(chr, &b"ACGGT".repeat(CHROM_LEN as usize / 5));
            tracks.insert(chr, vec![1.0; CHROM_LEN as usize]);
        }
        TrackExtractor::new(Arc::new(sequences), Arc::new(tracks))
    }

    fn regions(chr: &str, n: u32, is_peak: bool) -> RegionSet {
        (0..n)
            .map(|i| Region::new(chr, 100 + i * 10, 200 + i * 10, is_peak))
            .collect()
    }

    #[fixture]
    fn config() -> DataConfig {
        DataConfig {
            in_window: 100,
            out_window: 50,
            shift: 10,
            negative_sampling_ratio: 0.5,
            batch_size: 4,
            training_chroms: vec!["chr1".to_string()],
            validation_chroms: vec!["chr2".to_string()],
            test_chroms: vec!["chr3".to_string()],
            ..DataConfig::default()
        }
    }

    fn inputs() -> RegionInputs {
        let peaks = regions("chr1", 6, true)
            .concat(&regions("chr2", 2, true))
            .concat(&regions("chr3", 3, true));
        let negatives = regions("chr1", 20, false)
            .concat(&regions("chr2", 10, false))
            .concat(&regions("chr3", 4, false));
        RegionInputs {
            peaks,
            negatives: Some(negatives),
            background: Some(regions("chr1", 5, false)),
        }
    }

    #[fixture]
    fn module(config: DataConfig) -> DataModule {
        DataModule::from_regions(config, inputs(), extractor()).unwrap()
    }

    #[rstest]
    fn test_split_sizes(module: DataModule) {
        assert_eq!(module.data().len(), 45);
        assert_eq!(module.split().train.len(), 26);
        assert_eq!(module.split().validation.len(), 12);
        assert_eq!(module.split().test.len(), 7);
    }

    #[rstest]
    fn test_loaders_require_setup(mut module: DataModule) {
        assert!(matches!(module.train_loader(), Err(PipelineError::Configuration(_))));
        assert!(matches!(module.test_loader(), Err(PipelineError::Configuration(_))));
    }

    #[rstest]
    fn test_fit(mut module: DataModule) {
        module.setup(SetupStage::Fit).unwrap();

        // 6 peaks + floor(0.5 * 6) negatives, refreshed per call
        let served: usize = module.train_loader().unwrap().map(|b| b.unwrap().len()).sum();
        assert_eq!(served, 9);
        let second = module.train_loader().unwrap();
        assert_eq!(second.snapshot().epoch, 2);

        // 2 peaks + min(floor(1.0 * 2), 10) negatives, fixed
        let val = module.val_dataset().unwrap();
        assert_eq!(val.len(), 4);
        assert_eq!(val.epoch(), 1);
        let batch = module.val_loader().unwrap().next().unwrap().unwrap();
        assert_eq!(batch.sequence.dim(), (4, 4, 100));
        assert_eq!(batch.profile.dim(), (4, 50));
        assert_eq!(batch.profile[[0, 0]], 1.0);
    }

    #[rstest]
    fn test_test_stage_keeps_all_negatives(mut module: DataModule) {
        module.setup(SetupStage::Test).unwrap();
        assert_eq!(module.test_dataset().unwrap().len(), 7);
        assert_eq!(module.test_loader().unwrap().num_batches(), 2);
    }

    #[rstest]
    fn test_background_joins_training(config: DataConfig) {
        let config = DataConfig {
            train_with_background: true,
            ..config
        };
        let module = DataModule::from_regions(config, inputs(), extractor()).unwrap();
        assert_eq!(module.split().train.len(), 31);
        assert_eq!(module.split().train.peak_count(), 6);
    }

    #[rstest]
    fn test_negative_dataset(mut module: DataModule) {
        assert_eq!(module.negative_dataset().unwrap().len(), 34);
        let coords = module.negative_dataset().unwrap().coords(0).unwrap();
        assert!(!coords.is_peak);
    }

    #[rstest]
    #[case(ChromSelection::Stage(Stage::Train), -1.0, 26)]
    #[case(ChromSelection::Stage(Stage::Train), 1.0, 12)]
    #[case(ChromSelection::All, -1.0, 45)]
    #[case(ChromSelection::Names(vec!["chr3".to_string()]), -1.0, 7)]
    fn test_chrom_dataset(
        module: DataModule,
        #[case] selection: ChromSelection,
        #[case] ratio: f64,
        #[case] expected: usize,
    ) {
        let dataset = module.chrom_dataset(&selection, ratio).unwrap();
        assert_eq!(dataset.len(), expected);
    }

    #[rstest]
    #[case("train", ChromSelection::Stage(Stage::Train))]
    #[case("val", ChromSelection::Stage(Stage::Validation))]
    #[case("all", ChromSelection::All)]
    #[case("chr1, chr2", ChromSelection::Names(vec!["chr1".to_string(), "chr2".to_string()]))]
    fn test_parse_chrom_selection(#[case] s: &str, #[case] expected: ChromSelection) {
        assert_eq!(s.parse::<ChromSelection>().unwrap(), expected);
    }

    #[rstest]
    fn test_median_count(mut module: DataModule) {
        // flat signal of 1.0 over 50bp profiles
        assert_eq!(module.median_count_cached().unwrap(), 50.0);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(module.median_count(&mut rng).unwrap(), 50.0);
    }

    #[rstest]
    fn test_debug_subsample() {
        let peaks = regions("chr1", 150, true);
        let negatives = regions("chr1", 100, false);
        let (peaks, negatives) = debug_subsample(&peaks, Some(&negatives));
        assert_eq!(peaks.len(), 1);
        assert_eq!(negatives.map(|n| n.len()), Some(0));
    }

    #[rstest]
    fn test_misaligned_jitter(config: DataConfig) {
        let config = DataConfig {
            out_window: 10,
            profile_width: Some(50),
            shift: 3,
            ..config
        };
        assert!(matches!(
            DataModule::from_regions(config, inputs(), extractor()),
            Err(PipelineError::Alignment(_))
        ));
    }
}
