use std::path::Path;

use fxhash::FxHashMap as HashMap;

use crate::errors::Result;
use crate::utils::get_chrom_sizes;

///
/// Chromosome name → length table used to keep windows on their chromosome.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChromSizes {
    sizes: HashMap<String, u32>,
}

impl ChromSizes {
    ///
    /// Read a chrom sizes file (`name<whitespace>length` per line).
    ///
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let sizes = get_chrom_sizes(path)?;
        Ok(ChromSizes { sizes })
    }

    pub fn get(&self, chr: &str) -> Option<u32> {
        self.sizes.get(chr).copied()
    }

    pub fn contains(&self, chr: &str) -> bool {
        self.sizes.contains_key(chr)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.sizes.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for ChromSizes {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        ChromSizes {
            sizes: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
