use log::debug;
use rand::Rng;
use rand::seq::index;

use chromloader_core::models::RegionSet;

use crate::arrays::ExampleArrays;

///
/// Draws a random subset of non-peak examples sized relative to the number of peaks.
///
/// The subset holds `floor(ratio * peak_count)` examples, capped at the population
/// size, drawn uniformly without replacement. A ratio of zero or below disables
/// sampling and keeps the whole population.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegativeSampler {
    pub ratio: f64,
}

impl NegativeSampler {
    pub fn new(ratio: f64) -> Self {
        NegativeSampler { ratio }
    }

    pub fn is_enabled(&self) -> bool {
        self.ratio > 0.0
    }

    pub fn target_size(&self, peak_count: usize, population: usize) -> usize {
        if !self.is_enabled() {
            return population;
        }
        let target = (self.ratio * peak_count as f64).floor() as usize;
        target.min(population)
    }

    ///
    /// Sorted, distinct row indices into a population of `population` examples.
    ///
    pub fn sample_indices<R: Rng + ?Sized>(
        &self,
        population: usize,
        peak_count: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        let target = self.target_size(peak_count, population);
        if target == population {
            return (0..population).collect();
        }
        let mut picked = index::sample(rng, population, target).into_vec();
        picked.sort_unstable();
        picked
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        nonpeaks: &ExampleArrays,
        peak_count: usize,
        rng: &mut R,
    ) -> ExampleArrays {
        if !self.is_enabled() {
            return nonpeaks.clone();
        }
        let picked = self.sample_indices(nonpeaks.len(), peak_count, rng);
        debug!(
            "Sampled {} of {} non-peaks for {} peaks (ratio {})",
            picked.len(),
            nonpeaks.len(),
            peak_count,
            self.ratio
        );
        nonpeaks.select(&picked)
    }

    /// Same draw applied to regions instead of materialized examples.
    pub fn sample_regions<R: Rng + ?Sized>(
        &self,
        nonpeaks: &RegionSet,
        peak_count: usize,
        rng: &mut R,
    ) -> RegionSet {
        if !self.is_enabled() {
            return nonpeaks.clone();
        }
        let picked = self.sample_indices(nonpeaks.len(), peak_count, rng);
        nonpeaks.select(&picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::*;

    #[rstest]
    #[case(0.1, 10, 200, 1)]
    #[case(0.5, 10, 200, 5)]
    #[case(2.0, 10, 15, 15)]
    #[case(0.0, 10, 200, 200)]
    #[case(-1.0, 10, 200, 200)]
    #[case(0.25, 3, 200, 0)]
    fn test_target_size(
        #[case] ratio: f64,
        #[case] peaks: usize,
        #[case] population: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(NegativeSampler::new(ratio).target_size(peaks, population), expected);
    }

    #[rstest]
    fn test_indices_are_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = NegativeSampler::new(3.0).sample_indices(100, 20, &mut rng);

        assert_eq!(picked.len(), 60);
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 60);
        assert!(picked.iter().all(|&i| i < 100));
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
    }

    #[rstest]
    fn test_same_seed_same_draw() {
        let sampler = NegativeSampler::new(0.5);
        let a = sampler.sample_indices(1000, 100, &mut StdRng::seed_from_u64(42));
        let b = sampler.sample_indices(1000, 100, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[rstest]
    fn test_disabled_keeps_population() {
        let mut rng = StdRng::seed_from_u64(1);
        let arrays = ExampleArrays::empty(10, 5);
        let sampled = NegativeSampler::new(-1.0).sample(&arrays, 3, &mut rng);
        assert_eq!(sampled, arrays);
    }
}
