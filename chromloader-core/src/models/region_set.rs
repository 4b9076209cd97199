use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::path::PathBuf;

use crate::models::Region;

///
/// RegionSet struct, an ordered collection of normalized windows that can be
/// partitioned into peaks and non-peaks.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionSet {
    pub regions: Vec<Region>,
    pub path: Option<PathBuf>,
}

pub struct RegionSetIterator<'a> {
    region_set: &'a RegionSet,
    index: usize,
}

impl From<Vec<Region>> for RegionSet {
    fn from(regions: Vec<Region>) -> Self {
        RegionSet {
            regions,
            path: None,
        }
    }
}

impl FromIterator<Region> for RegionSet {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        RegionSet::from(iter.into_iter().collect::<Vec<Region>>())
    }
}

impl<'a> Iterator for RegionSetIterator<'a> {
    type Item = &'a Region;

    fn next(&mut self) -> Option<Self::Item> {
        let region = self.region_set.regions.get(self.index)?;
        self.index += 1;
        Some(region)
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = RegionSetIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        RegionSetIterator {
            region_set: self,
            index: 0,
        }
    }
}

impl RegionSet {
    pub fn iter(&self) -> RegionSetIterator<'_> {
        self.into_iter()
    }

    ///
    /// Unique chromosomes located in RegionSet, sorted by name
    ///
    pub fn iter_chroms(&self) -> impl Iterator<Item = &String> {
        let unique_chroms: BTreeSet<&String> = self.regions.iter().map(|r| &r.chr).collect();
        unique_chroms.into_iter()
    }

    ///
    /// Iterate through regions located on specific Chromosome in RegionSet
    ///
    /// # Arguments
    /// - chr: chromosome name
    ///
    pub fn iter_chr_regions<'a>(&'a self, chr: &'a str) -> impl Iterator<Item = &'a Region> {
        self.regions.iter().filter(move |r| r.chr == chr)
    }

    ///
    /// Keep only regions whose chromosome is in `chroms`, preserving order.
    ///
    pub fn filter_chroms<S: AsRef<str>>(&self, chroms: &[S]) -> RegionSet {
        self.regions
            .iter()
            .filter(|r| chroms.iter().any(|c| c.as_ref() == r.chr))
            .cloned()
            .collect()
    }

    ///
    /// Partition into `(peaks, nonpeaks)`, each keeping the original relative order.
    ///
    pub fn split_peaks(&self) -> (RegionSet, RegionSet) {
        let (peaks, nonpeaks): (Vec<Region>, Vec<Region>) =
            self.regions.iter().cloned().partition(|r| r.is_peak);
        (RegionSet::from(peaks), RegionSet::from(nonpeaks))
    }

    pub fn peaks(&self) -> RegionSet {
        self.regions.iter().filter(|r| r.is_peak).cloned().collect()
    }

    pub fn nonpeaks(&self) -> RegionSet {
        self.regions.iter().filter(|r| !r.is_peak).cloned().collect()
    }

    pub fn peak_count(&self) -> usize {
        self.regions.iter().filter(|r| r.is_peak).count()
    }

    ///
    /// Append the regions of `other` after this set's regions.
    ///
    pub fn concat(&self, other: &RegionSet) -> RegionSet {
        let mut regions = Vec::with_capacity(self.len() + other.len());
        regions.extend_from_slice(&self.regions);
        regions.extend_from_slice(&other.regions);
        RegionSet::from(regions)
    }

    ///
    /// Regions at the given indices, in index order.
    ///
    pub fn select(&self, indices: &[usize]) -> RegionSet {
        indices
            .iter()
            .filter_map(|&i| self.regions.get(i).cloned())
            .collect()
    }

    ///
    /// Is regionSet empty?
    ///
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    ///
    /// Get number of regions in RegionSet
    ///
    pub fn len(&self) -> usize {
        self.regions.len()
    }
}

impl Display for RegionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegionSet with {} regions ({} peaks).",
            self.len(),
            self.peak_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn region_set() -> RegionSet {
        RegionSet::from(vec![
            Region::new("chr2", 0, 10, true),
            Region::new("chr1", 0, 10, false),
            Region::new("chr1", 20, 30, true),
            Region::new("chr3", 5, 15, false),
        ])
    }

    #[rstest]
    fn test_split_peaks_is_a_partition(region_set: RegionSet) {
        let (peaks, nonpeaks) = region_set.split_peaks();
        assert_eq!(peaks.len() + nonpeaks.len(), region_set.len());
        assert!(peaks.iter().all(|r| r.is_peak));
        assert!(nonpeaks.iter().all(|r| !r.is_peak));
        assert_eq!(peaks.regions[0].chr, "chr2");
        assert_eq!(peaks, region_set.peaks());
        assert_eq!(nonpeaks, region_set.nonpeaks());
    }

    #[rstest]
    fn test_iter_chroms_sorted(region_set: RegionSet) {
        let chroms: Vec<&String> = region_set.iter_chroms().collect();
        assert_eq!(chroms, vec!["chr1", "chr2", "chr3"]);
    }

    #[rstest]
    fn test_filter_chroms(region_set: RegionSet) {
        let filtered = region_set.filter_chroms(&["chr1", "chr3"]);
        assert_eq!(filtered.len(), 3);
        assert_eq!(region_set.iter_chr_regions("chr1").count(), 2);
    }

    #[rstest]
    fn test_concat_and_select(region_set: RegionSet) {
        let doubled = region_set.concat(&region_set);
        assert_eq!(doubled.len(), 8);
        let picked = doubled.select(&[7, 0]);
        assert_eq!(picked.regions[0].chr, "chr3");
        assert_eq!(picked.regions[1].chr, "chr2");
    }

    #[rstest]
    fn test_display(region_set: RegionSet) {
        assert_eq!(region_set.to_string(), "RegionSet with 4 regions (2 peaks).");
    }
}
