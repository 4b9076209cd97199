use std::fmt::{self, Display};

use ndarray::{Array2, Array3, Axis, concatenate};

use chromloader_core::models::Orientation;

use crate::error::{PipelineError, Result};

///
/// Where a materialized example came from: chromosome, start of the sequence
/// window actually served, strand it is presented on and its peak label.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoordinateRecord {
    pub chr: String,
    pub start: u32,
    pub orientation: Orientation,
    pub is_peak: bool,
}

impl Display for CoordinateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.chr,
            self.start,
            self.orientation,
            if self.is_peak { 1 } else { 0 }
        )
    }
}

///
/// Row-aligned example arrays.
///
/// - `seqs`: one-hot sequences, shape `(n, seq_len, 4)`
/// - `cts`: count profiles, shape `(n, profile_len)`
/// - `coords`: one record per row
///
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleArrays {
    pub seqs: Array3<u8>,
    pub cts: Array2<f32>,
    pub coords: Vec<CoordinateRecord>,
}

impl ExampleArrays {
    pub fn new(seqs: Array3<u8>, cts: Array2<f32>, coords: Vec<CoordinateRecord>) -> Result<Self> {
        let n = seqs.len_of(Axis(0));
        if cts.len_of(Axis(0)) != n || coords.len() != n {
            return Err(PipelineError::Alignment(format!(
                "row counts differ: {} sequences, {} profiles, {} coordinates",
                n,
                cts.len_of(Axis(0)),
                coords.len()
            )));
        }
        if seqs.len_of(Axis(2)) != 4 {
            return Err(PipelineError::Alignment(format!(
                "one-hot sequences need 4 channels, found {}",
                seqs.len_of(Axis(2))
            )));
        }
        Ok(ExampleArrays { seqs, cts, coords })
    }

    pub fn empty(seq_len: usize, profile_len: usize) -> Self {
        ExampleArrays {
            seqs: Array3::zeros((0, seq_len, 4)),
            cts: Array2::zeros((0, profile_len)),
            coords: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn seq_len(&self) -> usize {
        self.seqs.len_of(Axis(1))
    }

    pub fn profile_len(&self) -> usize {
        self.cts.len_of(Axis(1))
    }

    pub fn peak_count(&self) -> usize {
        self.coords.iter().filter(|c| c.is_peak).count()
    }

    ///
    /// Rows at `indices`, in that order. Indices must be in bounds.
    ///
    pub fn select(&self, indices: &[usize]) -> Self {
        ExampleArrays {
            seqs: self.seqs.select(Axis(0), indices),
            cts: self.cts.select(Axis(0), indices),
            coords: indices.iter().map(|&i| self.coords[i].clone()).collect(),
        }
    }

    ///
    /// Rows of `self` followed by rows of `other`. Both must share window and profile lengths.
    ///
    pub fn concat(&self, other: &ExampleArrays) -> Result<Self> {
        let mismatch = |e: ndarray::ShapeError| {
            PipelineError::Alignment(format!(
                "cannot concatenate ({}, {}) examples with ({}, {}) examples: {}",
                self.seq_len(),
                self.profile_len(),
                other.seq_len(),
                other.profile_len(),
                e
            ))
        };
        let seqs = concatenate(Axis(0), &[self.seqs.view(), other.seqs.view()]).map_err(mismatch)?;
        let cts = concatenate(Axis(0), &[self.cts.view(), other.cts.view()]).map_err(mismatch)?;

        let mut coords = Vec::with_capacity(self.len() + other.len());
        coords.extend_from_slice(&self.coords);
        coords.extend_from_slice(&other.coords);

        Ok(ExampleArrays { seqs, cts, coords })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn arrays(n: usize, seq_len: usize, profile_len: usize, is_peak: bool) -> ExampleArrays {
        let coords = (0..n)
            .map(|i| CoordinateRecord {
                chr: "chr1".to_string(),
                start: i as u32 * 100,
                orientation: Orientation::Forward,
                is_peak,
            })
            .collect();
        let cts = Array2::from_shape_fn((n, profile_len), |(i, j)| (i * 10 + j) as f32);
        ExampleArrays::new(Array3::zeros((n, seq_len, 4)), cts, coords).unwrap()
    }

    #[rstest]
    fn test_new_rejects_misaligned_rows() {
        let result = ExampleArrays::new(
            Array3::zeros((2, 10, 4)),
            Array2::zeros((3, 5)),
            Vec::new(),
        );
        assert!(matches!(result, Err(PipelineError::Alignment(_))));
    }

    #[rstest]
    fn test_select_keeps_rows_together() {
        let a = arrays(4, 10, 3, true);
        let picked = a.select(&[3, 1]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.coords[0].start, 300);
        assert_eq!(picked.cts[[0, 0]], 30.0);
        assert_eq!(picked.cts[[1, 2]], 12.0);
    }

    #[rstest]
    fn test_concat() {
        let joined = arrays(2, 10, 3, true).concat(&arrays(3, 10, 3, false)).unwrap();
        assert_eq!(joined.len(), 5);
        assert_eq!(joined.peak_count(), 2);
        assert_eq!(joined.seqs.dim(), (5, 10, 4));
    }

    #[rstest]
    fn test_concat_shape_mismatch() {
        let result = arrays(2, 10, 3, true).concat(&arrays(2, 12, 3, false));
        assert!(matches!(result, Err(PipelineError::Alignment(_))));
    }

    #[rstest]
    fn test_coordinate_display() {
        let record = CoordinateRecord {
            chr: "chr2".to_string(),
            start: 42,
            orientation: Orientation::Reverse,
            is_peak: true,
        };
        assert_eq!(record.to_string(), "chr2\t42\tr\t1");
    }
}
