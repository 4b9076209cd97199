use ndarray::{Array2, Array3, Axis, s};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::arrays::ExampleArrays;
use crate::encoding::{reverse_complement, reverse_profile};
use crate::error::{PipelineError, Result};

///
/// Random cropping, reverse complementing and shuffling of materialized examples.
///
/// Every draw comes from the caller's rng, so the same rng state always produces
/// the same augmented arrays.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceAugmentor {
    pub input_length: usize,
    pub output_length: usize,
    /// Bases per profile bin. Crop offsets are multiples of it.
    pub bin_size: usize,
    pub add_revcomp: bool,
    /// Chance that any one example is replaced by its reverse complement.
    pub revcomp_fraction: f64,
    pub shuffle: bool,
}

impl SequenceAugmentor {
    pub fn new(input_length: usize, output_length: usize, bin_size: usize) -> Self {
        SequenceAugmentor {
            input_length,
            output_length,
            bin_size: bin_size.max(1),
            add_revcomp: false,
            revcomp_fraction: 0.5,
            shuffle: false,
        }
    }

    pub fn with_revcomp(mut self, add_revcomp: bool, revcomp_fraction: f64) -> Self {
        self.add_revcomp = add_revcomp;
        self.revcomp_fraction = revcomp_fraction;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    ///
    /// Crop every window down to `input_length` bases and `output_length` bins.
    ///
    /// Each row gets its own offset, drawn uniformly among the bin-aligned
    /// positions of the margin, and the same offset is applied to sequence and
    /// profile. Arrays already at the target size are returned untouched without
    /// drawing from `rng`.
    ///
    pub fn random_crop<R: Rng + ?Sized>(&self, arrays: &ExampleArrays, rng: &mut R) -> Result<ExampleArrays> {
        let seq_len = arrays.seq_len();
        let profile_len = arrays.profile_len();

        if seq_len < self.input_length || profile_len < self.output_length {
            return Err(PipelineError::Alignment(format!(
                "cannot crop ({}, {}) windows to ({}, {})",
                seq_len, profile_len, self.input_length, self.output_length
            )));
        }

        let seq_margin = seq_len - self.input_length;
        let cts_margin = profile_len - self.output_length;
        if seq_margin % self.bin_size != 0 || seq_margin / self.bin_size != cts_margin {
            return Err(PipelineError::Alignment(format!(
                "sequence margin {} does not match profile margin {} at {}bp per bin",
                seq_margin, cts_margin, self.bin_size
            )));
        }

        if seq_margin == 0 {
            return Ok(arrays.clone());
        }

        let n = arrays.len();
        let mut seqs = Array3::<u8>::zeros((n, self.input_length, 4));
        let mut cts = Array2::<f32>::zeros((n, self.output_length));
        let mut coords = arrays.coords.clone();

        for i in 0..n {
            let k = rng.random_range(0..=cts_margin);
            let offset = k * self.bin_size;

            seqs.slice_mut(s![i, .., ..])
                .assign(&arrays.seqs.slice(s![i, offset..offset + self.input_length, ..]));
            cts.slice_mut(s![i, ..])
                .assign(&arrays.cts.slice(s![i, k..k + self.output_length]));
            coords[i].start += offset as u32;
        }

        ExampleArrays::new(seqs, cts, coords)
    }

    ///
    /// Replace each example by its reverse complement with probability
    /// `revcomp_fraction`. The number of examples does not change.
    ///
    pub fn reverse_complement<R: Rng + ?Sized>(&self, arrays: &ExampleArrays, rng: &mut R) -> ExampleArrays {
        let p = self.revcomp_fraction.clamp(0.0, 1.0);
        let mut out = arrays.clone();

        for i in 0..out.len() {
            if !rng.random_bool(p) {
                continue;
            }
            let seq = reverse_complement(arrays.seqs.index_axis(Axis(0), i));
            out.seqs.index_axis_mut(Axis(0), i).assign(&seq);

            let profile = reverse_profile(arrays.cts.index_axis(Axis(0), i));
            out.cts.index_axis_mut(Axis(0), i).assign(&profile);

            out.coords[i].orientation = out.coords[i].orientation.flip();
        }

        out
    }

    pub fn shuffle<R: Rng + ?Sized>(&self, arrays: &ExampleArrays, rng: &mut R) -> ExampleArrays {
        let mut order: Vec<usize> = (0..arrays.len()).collect();
        order.shuffle(rng);
        arrays.select(&order)
    }

    /// Crop, then reverse complement and shuffle when enabled.
    pub fn augment<R: Rng + ?Sized>(&self, arrays: &ExampleArrays, rng: &mut R) -> Result<ExampleArrays> {
        let mut out = self.random_crop(arrays, rng)?;
        if self.add_revcomp {
            out = self.reverse_complement(&out, rng);
        }
        if self.shuffle {
            out = self.shuffle(&out, rng);
        }
        Ok(out)
    }
}
