use std::collections::BTreeSet;

use fxhash::FxHashSet as HashSet;
use log::{info, warn};

use chromloader_core::models::RegionSet;

use crate::error::{PipelineError, Result};
use crate::stage::Stage;

///
/// Assigns regions to train / validation / test by chromosome.
///
/// Excluded chromosomes are removed from every list up front; what remains must be
/// pairwise disjoint.
///
#[derive(Debug, Clone, Default)]
pub struct ChromosomeSplitter {
    train: Vec<String>,
    validation: Vec<String>,
    test: Vec<String>,
    exclude: HashSet<String>,
}

/// Regions of one catalog, split by stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitRegions {
    pub train: RegionSet,
    pub validation: RegionSet,
    pub test: RegionSet,
}

impl SplitRegions {
    pub fn get(&self, stage: Stage) -> &RegionSet {
        match stage {
            Stage::Train => &self.train,
            Stage::Validation => &self.validation,
            Stage::Test => &self.test,
        }
    }

    /// Train regions followed by validation regions.
    pub fn train_val(&self) -> RegionSet {
        self.train.concat(&self.validation)
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChromosomeSplitter {
    pub fn new<S: AsRef<str>>(train: &[S], validation: &[S], test: &[S], exclude: &[S]) -> Result<Self> {
        let exclude: HashSet<String> = exclude.iter().map(|c| c.as_ref().to_string()).collect();
        let keep = |list: &[S]| -> Vec<String> {
            list.iter()
                .map(|c| c.as_ref().to_string())
                .filter(|c| !exclude.contains(c))
                .collect()
        };

        let (train, validation, test) = (keep(train), keep(validation), keep(test));
        let splitter = ChromosomeSplitter {
            train,
            validation,
            test,
            exclude,
        };

        let named = [
            (Stage::Train, &splitter.train),
            (Stage::Validation, &splitter.validation),
            (Stage::Test, &splitter.test),
        ];
        for (i, (stage_a, a)) in named.iter().enumerate() {
            for (stage_b, b) in named.iter().skip(i + 1) {
                if let Some(chr) = a.iter().find(|c| b.contains(*c)) {
                    return Err(PipelineError::Configuration(format!(
                        "chromosome {} is listed for both {} and {}",
                        chr, stage_a, stage_b
                    )));
                }
            }
        }

        Ok(splitter)
    }

    pub fn chroms(&self, stage: Stage) -> &[String] {
        match stage {
            Stage::Train => &self.train,
            Stage::Validation => &self.validation,
            Stage::Test => &self.test,
        }
    }

    /// Every chromosome assigned to a stage.
    pub fn all_chroms(&self) -> Vec<String> {
        self.train
            .iter()
            .chain(&self.validation)
            .chain(&self.test)
            .cloned()
            .collect()
    }

    pub fn is_excluded(&self, chr: &str) -> bool {
        self.exclude.contains(chr)
    }

    pub fn stage_of(&self, chr: &str) -> Option<Stage> {
        [Stage::Train, Stage::Validation, Stage::Test]
            .into_iter()
            .find(|stage| self.chroms(*stage).iter().any(|c| c == chr))
    }

    ///
    /// Partition `regions` by chromosome, keeping file order within each stage.
    /// Regions on excluded or unlisted chromosomes are dropped.
    ///
    pub fn split(&self, regions: &RegionSet) -> SplitRegions {
        let mut split = SplitRegions::default();
        let mut unlisted: BTreeSet<&str> = BTreeSet::new();
        let mut dropped = 0usize;

        for region in regions {
            match self.stage_of(&region.chr) {
                Some(Stage::Train) => split.train.regions.push(region.clone()),
                Some(Stage::Validation) => split.validation.regions.push(region.clone()),
                Some(Stage::Test) => split.test.regions.push(region.clone()),
                None => {
                    if !self.is_excluded(&region.chr) {
                        unlisted.insert(&region.chr);
                    }
                    dropped += 1;
                }
            }
        }

        if !unlisted.is_empty() {
            warn!(
                "Chromosomes not assigned to any split were dropped: {}",
                unlisted.into_iter().collect::<Vec<_>>().join(", ")
            );
        }
        info!(
            "Split {} regions into {} train, {} validation, {} test ({} dropped)",
            regions.len(),
            split.train.len(),
            split.validation.len(),
            split.test.len(),
            dropped
        );

        split
    }

    /// Regions on train or validation chromosomes, in file order.
    pub fn train_val(&self, regions: &RegionSet) -> RegionSet {
        regions
            .iter()
            .filter(|r| matches!(self.stage_of(&r.chr), Some(Stage::Train | Stage::Validation)))
            .cloned()
            .collect()
    }
}
