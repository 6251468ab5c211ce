//! The calling pipeline: turn (read, overlapping loci) pairs into one
//! genotype call per site.
//!
//! Reads are processed independently; per-site evidence is combined with a
//! commutative, associative sum, so partial aggregates computed on
//! different workers merge in arbitrary order. The rayon map/reduce below
//! is one possible execution substrate; correctness only depends on the
//! combiner.

use std::collections::HashMap;

use anyhow::Result;
use itertools::Itertools;
use rayon::prelude::*;

use crate::errors::Error;
use crate::ploidy::PloidyMap;
use crate::variants::evidence::disambiguation::Disambiguator;
use crate::variants::evidence::observation::{Observation, ObservedRead};
use crate::variants::DiscoveredVariant;

pub mod record;

pub use self::record::{GenotypeAllele, GenotypeCall};

/// Identity of a genotyped site: position plus allele pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, new)]
pub struct SiteKey {
    contig: String,
    start: u64,
    ref_allele: Option<String>,
    alt_allele: Option<String>,
}

impl From<&DiscoveredVariant> for SiteKey {
    fn from(variant: &DiscoveredVariant) -> Self {
        SiteKey::new(
            variant.contig().to_owned(),
            variant.start(),
            variant.ref_allele().clone(),
            variant.alt_allele().clone(),
        )
    }
}

type SiteMap = HashMap<SiteKey, (DiscoveredVariant, Observation)>;

/// Single-sample biallelic genotyper.
#[derive(Builder, Debug, Clone)]
pub struct Caller {
    /// Score every covered position, not only candidate loci.
    #[builder(default = "false")]
    score_all_sites: bool,
    /// Base qualities above this are clamped.
    #[builder(default = "93")]
    max_base_quality: u32,
    /// Mapping qualities above this are clamped.
    #[builder(default = "93")]
    max_mapping_quality: u32,
}

impl Caller {
    /// Genotype all sites backed by the given reads.
    ///
    /// Every read has been spatially joined upstream with the candidate
    /// loci it overlaps. Fails before any processing if the reads stem from
    /// more than one sample; a failure to process a single read is logged
    /// and dropped instead.
    pub fn call<P>(
        &self,
        reads: &[(ObservedRead, Vec<DiscoveredVariant>)],
        ploidy: &P,
    ) -> Result<Vec<GenotypeCall>>
    where
        P: PloidyMap + Sync,
    {
        let sample = single_sample(reads)?;
        let disambiguator = Disambiguator::new(
            ploidy,
            self.score_all_sites,
            self.max_base_quality,
            self.max_mapping_quality,
        );

        let sites: SiteMap = reads
            .par_iter()
            .map(|(read, loci)| {
                let mut local = SiteMap::new();
                for (variant, summarized) in disambiguator.observe(read, loci) {
                    accumulate(&mut local, variant, summarized.expand());
                }
                local
            })
            .reduce(SiteMap::new, merge_site_maps);

        let mut calls = sites
            .into_iter()
            .map(|(_, (variant, observation))| record::genotype_site(&variant, &observation, sample))
            .collect::<Result<Vec<_>>>()?;
        calls.sort_by(|a, b| {
            let key = |call: &GenotypeCall| {
                (
                    call.variant().contig().to_owned(),
                    call.variant().start(),
                    call.variant().ref_allele().clone(),
                    call.variant().alt_allele().clone(),
                )
            };
            key(a).cmp(&key(b))
        });
        Ok(calls)
    }
}

/// The one sample all reads must come from (empty if there are no reads).
fn single_sample(reads: &[(ObservedRead, Vec<DiscoveredVariant>)]) -> Result<&str> {
    let mut samples = reads.iter().map(|(read, _)| read.sample().as_str()).unique();
    match (samples.next(), samples.next()) {
        (Some(first), Some(second)) => Err(Error::MultipleSamples {
            first: first.to_owned(),
            second: second.to_owned(),
        }
        .into()),
        (first, None) => Ok(first.unwrap_or_default()),
        (None, Some(_)) => unreachable!("iterator cannot yield None before Some"),
    }
}

fn accumulate(sites: &mut SiteMap, variant: DiscoveredVariant, observation: Observation) {
    use std::collections::hash_map::Entry;
    match sites.entry(SiteKey::from(&variant)) {
        Entry::Occupied(mut entry) => {
            entry.get_mut().1 += observation;
        }
        Entry::Vacant(entry) => {
            entry.insert((variant, observation));
        }
    }
}

fn merge_site_maps(mut a: SiteMap, b: SiteMap) -> SiteMap {
    for (_, (variant, observation)) in b {
        accumulate(&mut a, variant, observation);
    }
    a
}
