//! One-hot encoding of nucleotides.
//!
//! Channels are ordered `A, C, G, T`, so complementing a base is the same as
//! reversing the channel axis.
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2, s};

pub const ALPHABET: [u8; 4] = *b"ACGT";

fn channel(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

///
/// One-hot encode `seq` into a `(seq.len(), 4)` array. Ambiguous bases (N, IUPAC codes)
/// become all-zero rows.
///
pub fn one_hot_encode(seq: &[u8]) -> Array2<u8> {
    let mut out = Array2::zeros((seq.len(), 4));
    one_hot_into(seq, out.view_mut());
    out
}

/// Encode into an existing, zeroed `(seq.len(), 4)` view.
pub fn one_hot_into(seq: &[u8], mut out: ArrayViewMut2<u8>) {
    for (i, &base) in seq.iter().enumerate() {
        if let Some(c) = channel(base) {
            out[[i, c]] = 1;
        }
    }
}

/// Back to nucleotides; all-zero rows decode to `N`.
pub fn decode(onehot: ArrayView2<u8>) -> Vec<u8> {
    onehot
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .position(|&v| v != 0)
                .map_or(b'N', |c| ALPHABET[c])
        })
        .collect()
}

///
/// Reverse complement of a one-hot `(len, 4)` window: positions reversed and
/// channels reversed (A↔T, C↔G).
///
pub fn reverse_complement(onehot: ArrayView2<u8>) -> Array2<u8> {
    onehot.slice(s![..;-1, ..;-1]).to_owned()
}

/// Profile matching a reverse-complemented window.
pub fn reverse_profile(profile: ArrayView1<f32>) -> ndarray::Array1<f32> {
    profile.slice(s![..;-1]).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_one_hot_encode() {
        let encoded = one_hot_encode(b"ACgtN");
        assert_eq!(
            encoded,
            array![[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1], [0, 0, 0, 0]]
        );
    }

    #[rstest]
    #[case(b"GATTACA", b"TGTAATC")]
    #[case(b"AAAA", b"TTTT")]
    #[case(b"ACNGT", b"ACNGT")]
    #[case(b"", b"")]
    fn test_reverse_complement(#[case] seq: &[u8], #[case] expected: &[u8]) {
        let rc = reverse_complement(one_hot_encode(seq).view());
        assert_eq!(decode(rc.view()), expected.to_vec());
    }

    #[rstest]
    fn test_reverse_complement_twice_is_identity() {
        let seq = one_hot_encode(b"TTGACNNAGGCATC");
        let twice = reverse_complement(reverse_complement(seq.view()).view());
        assert_eq!(twice, seq);

        let profile = array![1.0f32, 2.0, 3.0, 0.5];
        assert_eq!(reverse_profile(reverse_profile(profile.view()).view()), profile);
    }
}
