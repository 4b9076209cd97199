use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

///
/// Region struct, a fixed-width window on one chromosome tagged as peak or non-peak
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    pub chr: String,
    pub start: u32,
    pub end: u32,

    pub is_peak: bool,
}

/// Strand a materialized window is presented on.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    #[default]
    Forward,
    Reverse,
}

impl Orientation {
    pub fn flip(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Forward => write!(f, "f"),
            Orientation::Reverse => write!(f, "r"),
        }
    }
}

impl Region {
    pub fn new(chr: &str, start: u32, end: u32, is_peak: bool) -> Self {
        Region {
            chr: chr.to_string(),
            start,
            end,
            is_peak,
        }
    }

    ///
    /// Get width of the region
    ///
    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    /// Midpoint of the region: `start + width / 2`.
    pub fn mid_point(&self) -> u32 {
        self.start + self.width() / 2
    }

    ///
    /// Interval of `width` bases centered on this region's midpoint, grown by `flank`
    /// on both sides. Returns `None` when the interval would start before zero.
    ///
    pub fn centered(&self, width: u32, flank: u32) -> Option<(u32, u32)> {
        let start = self.mid_point().checked_sub(width / 2)?.checked_sub(flank)?;
        Some((start, start + width + 2 * flank))
    }

    ///
    /// Get file string of Region
    ///
    pub fn as_string(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.chr,
            self.start,
            self.end,
            if self.is_peak { 1 } else { 0 }
        )
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_width_and_midpoint() {
        let region = Region::new("chr1", 100, 200, true);
        assert_eq!(region.width(), 100);
        assert_eq!(region.mid_point(), 150);
    }

    #[rstest]
    #[case(100, 0, Some((100, 200)))]
    #[case(100, 10, Some((90, 210)))]
    #[case(40, 0, Some((130, 170)))]
    #[case(100, 101, None)]
    fn test_centered(#[case] width: u32, #[case] flank: u32, #[case] expected: Option<(u32, u32)>) {
        let region = Region::new("chr1", 100, 200, true);
        assert_eq!(region.centered(width, flank), expected);
    }

    #[rstest]
    fn test_orientation_flip() {
        assert_eq!(Orientation::Forward.flip(), Orientation::Reverse);
        assert_eq!(Orientation::Reverse.flip().flip(), Orientation::Reverse);
        assert_eq!(Orientation::default().to_string(), "f");
    }
}
