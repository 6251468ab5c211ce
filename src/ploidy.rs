use anyhow::Result;
use bio_types::genome;

use crate::errors::Error;
use crate::utils::overlaps;

/// Read-only copy number lookup shared by all workers.
///
/// Implementations provide a base ploidy that applies wherever no override
/// does, region-specific overrides, and the ploidy bounds over the whole run.
pub trait PloidyMap {
    /// Ploidy assumed wherever no override applies.
    fn base_ploidy(&self) -> u32;

    /// Smallest ploidy that can occur anywhere in the run.
    fn min_ploidy(&self) -> u32;

    /// Largest ploidy that can occur anywhere in the run.
    fn max_ploidy(&self) -> u32;

    /// All overrides whose region intersects the given interval.
    fn overlapping_overrides(&self, region: &genome::Interval) -> Vec<(genome::Interval, u32)>;
}

/// Interval-list backed ploidy map.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct IntervalPloidyMap {
    #[getset(get_copy = "pub")]
    base_ploidy: u32,
    #[getset(get = "pub")]
    overrides: Vec<(genome::Interval, u32)>,
}

impl IntervalPloidyMap {
    pub fn new(base_ploidy: u32, overrides: Vec<(genome::Interval, u32)>) -> Result<Self> {
        for &ploidy in std::iter::once(&base_ploidy).chain(overrides.iter().map(|(_, p)| p)) {
            if ploidy == 0 {
                return Err(Error::InvalidPloidy { ploidy }.into());
            }
        }
        Ok(IntervalPloidyMap {
            base_ploidy,
            overrides,
        })
    }
}

impl PloidyMap for IntervalPloidyMap {
    fn base_ploidy(&self) -> u32 {
        self.base_ploidy
    }

    fn min_ploidy(&self) -> u32 {
        self.overrides
            .iter()
            .map(|(_, ploidy)| *ploidy)
            .min()
            .unwrap_or(self.base_ploidy)
            .min(self.base_ploidy)
    }

    fn max_ploidy(&self) -> u32 {
        self.overrides
            .iter()
            .map(|(_, ploidy)| *ploidy)
            .max()
            .unwrap_or(self.base_ploidy)
            .max(self.base_ploidy)
    }

    fn overlapping_overrides(&self, region: &genome::Interval) -> Vec<(genome::Interval, u32)> {
        self.overrides
            .iter()
            .filter(|(interval, _)| overlaps(interval, region))
            .cloned()
            .collect()
    }
}
