use std::sync::Arc;

use ndarray::{Array2, Array3, Axis, stack};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::config::DataConfig;
use crate::dataset::{EpochSnapshot, Example};
use crate::error::{PipelineError, Result};

/// Batch iteration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    pub batch_size: usize,
    pub shuffle: bool,
    pub drop_last: bool,
    /// Worker threads assembling each batch; 0 assembles on the calling thread.
    pub num_workers: usize,
    /// Seed of the iteration order when `shuffle` is on.
    pub seed: u64,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            batch_size: 64,
            shuffle: false,
            drop_last: false,
            num_workers: 0,
            seed: 42,
        }
    }
}

impl LoaderOptions {
    pub fn from_config(config: &DataConfig) -> Self {
        LoaderOptions {
            batch_size: config.batch_size,
            num_workers: config.num_workers,
            seed: config.seed,
            ..LoaderOptions::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

///
/// A stack of examples.
///
/// - `sequence`: `(batch, 4, input_length)`
/// - `profile`: `(batch, output_length)`
/// - `indices`: snapshot index of every row
///
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub sequence: Array3<f32>,
    pub profile: Array2<f32>,
    pub indices: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn from_examples(examples: &[Example], indices: Vec<usize>) -> Result<Self> {
        let to_alignment = |e: ndarray::ShapeError| PipelineError::Alignment(e.to_string());
        let sequences: Vec<_> = examples.iter().map(|e| e.sequence.view()).collect();
        let profiles: Vec<_> = examples.iter().map(|e| e.profile.view()).collect();

        Ok(Batch {
            sequence: stack(Axis(0), &sequences).map_err(to_alignment)?,
            profile: stack(Axis(0), &profiles).map_err(to_alignment)?,
            indices,
        })
    }
}

///
/// Iterates one epoch snapshot in batches.
///
/// The loader holds its own handle to the snapshot, so refreshing the dataset
/// while a loader is alive never changes what the loader serves.
///
pub struct BatchLoader {
    snapshot: Arc<EpochSnapshot>,
    order: Vec<usize>,
    batch_size: usize,
    drop_last: bool,
    pool: Option<ThreadPool>,
    cursor: usize,
}

impl BatchLoader {
    pub fn new(snapshot: Arc<EpochSnapshot>, options: &LoaderOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(PipelineError::Configuration(
                "batch size must be positive".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..snapshot.len()).collect();
        if options.shuffle {
            let mut rng = StdRng::seed_from_u64(options.seed);
            order.shuffle(&mut rng);
        }

        let pool = match options.num_workers {
            0 => None,
            n => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| PipelineError::Configuration(e.to_string()))?,
            ),
        };

        Ok(BatchLoader {
            snapshot,
            order,
            batch_size: options.batch_size,
            drop_last: options.drop_last,
            pool,
            cursor: 0,
        })
    }

    /// Number of batches a full pass yields.
    pub fn num_batches(&self) -> usize {
        let n = self.order.len();
        if self.drop_last {
            n / self.batch_size
        } else {
            n.div_ceil(self.batch_size)
        }
    }

    pub fn snapshot(&self) -> &Arc<EpochSnapshot> {
        &self.snapshot
    }

    fn assemble(&self, indices: &[usize]) -> Result<Vec<Example>> {
        match &self.pool {
            Some(pool) => pool.install(|| {
                indices
                    .par_iter()
                    .map(|&i| self.snapshot.get(i))
                    .collect::<Result<Vec<Example>>>()
            }),
            None => indices.iter().map(|&i| self.snapshot.get(i)).collect(),
        }
    }
}

impl Iterator for BatchLoader {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.order.len();
        if self.cursor >= n {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(n);
        if self.drop_last && end - self.cursor < self.batch_size {
            self.cursor = n;
            return None;
        }

        let indices = self.order[self.cursor..end].to_vec();
        self.cursor = end;

        Some(
            self.assemble(&indices)
                .and_then(|examples| Batch::from_examples(&examples, indices)),
        )
    }
}
