//! Attribution of one read's positional observations to the candidate loci
//! it overlaps.
//!
//! Each locus receives at most one verdict per read (non-ref-model loci are
//! the exception: every contributing observation is scored). Ambiguous
//! insertion/deletion shapes resolve to an uninformative verdict by policy;
//! they are not errors. Any actual failure while processing a read is
//! logged and degrades to an empty contribution, leaving sibling reads
//! untouched.

use anyhow::Result;
use bio_types::genome::{self, AbstractInterval};

use crate::errors::Error;
use crate::ploidy::PloidyMap;
use crate::utils::overlaps;
use crate::variants::evidence::observation::{
    ObservationClass, ObservedRead, PositionObservation, SummarizedObservation,
};
use crate::variants::DiscoveredVariant;

#[derive(Debug, new)]
pub(crate) struct Disambiguator<'a, P: PloidyMap> {
    ploidy: &'a P,
    score_all_sites: bool,
    max_base_quality: u32,
    max_mapping_quality: u32,
}

impl<'a, P: PloidyMap> Disambiguator<'a, P> {
    /// Attribute the read's observations to the loci it overlaps.
    pub(crate) fn observe(
        &self,
        read: &ObservedRead,
        loci: &[DiscoveredVariant],
    ) -> Vec<(DiscoveredVariant, SummarizedObservation)> {
        match self.try_observe(read, loci) {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!("dropping evidence of read from {}: {}", read.sample(), e);
                Vec::new()
            }
        }
    }

    fn try_observe(
        &self,
        read: &ObservedRead,
        loci: &[DiscoveredVariant],
    ) -> Result<Vec<(DiscoveredVariant, SummarizedObservation)>> {
        if loci.is_empty() && !self.score_all_sites {
            return Ok(Vec::new());
        }

        // ploidy overrides are looked up once per read
        let overrides = read
            .span()
            .map(|span| self.ploidy.overlapping_overrides(&span))
            .unwrap_or_default();

        let mut by_locus: Vec<(&DiscoveredVariant, Vec<&PositionObservation>)> =
            loci.iter().map(|locus| (locus, Vec::new())).collect();
        let mut unassigned: Vec<&PositionObservation> = Vec::new();
        for obs in read.observations() {
            let mut assigned = false;
            for (locus, bucket) in by_locus.iter_mut() {
                if overlaps(obs.interval(), locus.interval()) {
                    bucket.push(obs);
                    assigned = true;
                }
            }
            if !assigned {
                unassigned.push(obs);
            }
        }

        let mut pairs = Vec::new();
        for (locus, bucket) in by_locus {
            if bucket.is_empty() {
                continue;
            }
            let copy_number = self.copy_number_at(locus, &overrides);
            if locus.is_non_ref_model() {
                for obs in bucket {
                    pairs.push((
                        locus.clone(),
                        self.summarize(Self::non_ref_class(obs), Some(obs), copy_number),
                    ));
                }
            } else {
                let (class, representative) = self.resolve(locus, &bucket)?;
                pairs.push((
                    locus.clone(),
                    self.summarize(class, representative, copy_number),
                ));
            }
        }

        if self.score_all_sites {
            for obs in unassigned {
                let locus = DiscoveredVariant::non_ref_model(obs.interval().clone());
                let copy_number = self.copy_number_at(&locus, &overrides);
                let summarized = self.summarize(Self::non_ref_class(obs), Some(obs), copy_number);
                pairs.push((locus, summarized));
            }
        }

        self.suppress_overlapping_alts(&mut pairs);

        Ok(pairs)
    }

    /// One locus, one verdict. The returned observation backs the verdict's
    /// qualities; `None` marks an uninformative outcome.
    fn resolve<'o>(
        &self,
        locus: &DiscoveredVariant,
        bucket: &[&'o PositionObservation],
    ) -> Result<(ObservationClass, Option<&'o PositionObservation>)> {
        let missing = || Error::MissingAlleles {
            contig: locus.contig().to_owned(),
            pos: locus.start(),
        };
        let ref_allele = locus.ref_allele().as_deref().ok_or_else(missing)?;
        let alt_allele = locus.alt_allele().as_deref().ok_or_else(missing)?;

        if locus.is_insertion() {
            let ins_allele = &alt_allele[1..];
            let supporting: Vec<&'o PositionObservation> = bucket
                .iter()
                .copied()
                .filter(|obs| obs.allele().as_str() == ins_allele)
                .collect();
            if bucket.len() == 2 && supporting.len() == 1 {
                let anchor: &'o PositionObservation = bucket
                    .iter()
                    .copied()
                    .find(|obs| obs.allele().as_str() != ins_allele)
                    .unwrap();
                if anchor.allele().as_bytes().first() == alt_allele.as_bytes().first() {
                    return Ok((ObservationClass::Allele, Some(supporting[0])));
                }
                return Ok((ObservationClass::Uninformative, None));
            }
            if bucket.iter().all(|obs| obs.evidence().is_ref()) {
                return Ok((ObservationClass::Reference, Some(bucket[0])));
            }
            return Ok((ObservationClass::Uninformative, None));
        }

        let matching: Vec<&'o PositionObservation> = bucket
            .iter()
            .copied()
            .filter(|obs| obs.allele().as_str() == alt_allele)
            .collect();
        let conflicting = bucket
            .iter()
            .filter(|obs| obs.allele().as_str() != alt_allele && !obs.allele().is_empty())
            .count();
        if matching.len() == 1 && conflicting == 0 {
            if locus.is_deletion() {
                // the accepted call is the spanning observation, and it has
                // to cover exactly the deleted bases
                let spanning: Vec<&'o PositionObservation> = bucket
                    .iter()
                    .copied()
                    .filter(|obs| obs.allele().as_str() != alt_allele)
                    .collect();
                if spanning.len() == 1 && spanning[0].width() == locus.deletion_length() {
                    return Ok((ObservationClass::Allele, Some(spanning[0])));
                }
                return Ok((ObservationClass::Uninformative, None));
            }
            return Ok((ObservationClass::Allele, Some(matching[0])));
        }

        if bucket.len() == ref_allele.len() && bucket.iter().all(|obs| obs.evidence().is_ref()) {
            return Ok((ObservationClass::Reference, Some(bucket[0])));
        }
        Ok((ObservationClass::Uninformative, None))
    }

    /// Downgrade alternate calls whose locus overlaps a different locus that
    /// received a definite call, so one read never backs two competing
    /// alternate alleles at overlapping loci.
    fn suppress_overlapping_alts(&self, pairs: &mut [(DiscoveredVariant, SummarizedObservation)]) {
        let definite: Vec<(usize, genome::Interval)> = pairs
            .iter()
            .enumerate()
            .filter(|(_, (_, obs))| obs.is_definite())
            .map(|(i, (locus, _))| (i, locus.interval().clone()))
            .collect();
        for (i, (locus, obs)) in pairs.iter_mut().enumerate() {
            if obs.is_alt()
                && definite
                    .iter()
                    .any(|(j, region)| *j != i && overlaps(locus.interval(), region))
            {
                obs.downgrade_to_other();
            }
        }
    }

    fn non_ref_class(obs: &PositionObservation) -> ObservationClass {
        if obs.evidence().is_ref() {
            ObservationClass::Reference
        } else {
            ObservationClass::NonRef
        }
    }

    fn summarize(
        &self,
        class: ObservationClass,
        obs: Option<&PositionObservation>,
        copy_number: u32,
    ) -> SummarizedObservation {
        match (class, obs) {
            (ObservationClass::Uninformative, _) | (_, None) => {
                SummarizedObservation::uninformative(copy_number)
            }
            (class, Some(obs)) => SummarizedObservation::new(
                class,
                obs.evidence().strand().is_forward(),
                obs.evidence().base_quality().min(self.max_base_quality),
                obs.evidence().mapping_quality().min(self.max_mapping_quality),
                copy_number,
            ),
        }
    }

    fn copy_number_at(
        &self,
        locus: &DiscoveredVariant,
        overrides: &[(genome::Interval, u32)],
    ) -> u32 {
        overrides
            .iter()
            .find(|(region, _)| overlaps(region, locus.interval()))
            .map_or_else(|| self.ploidy.base_ploidy(), |(_, ploidy)| *ploidy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ploidy::IntervalPloidyMap;
    use crate::variants::evidence::observation::{Evidence, Strand};

    fn interval(start: u64, end: u64) -> genome::Interval {
        genome::Interval::new("1".to_owned(), start..end)
    }

    fn observation(start: u64, end: u64, allele: &str, is_ref: bool) -> PositionObservation {
        PositionObservation::new(
            interval(start, end),
            allele.to_owned(),
            Evidence::new(Strand::Forward, 30, 60, is_ref),
        )
    }

    fn read(observations: Vec<PositionObservation>) -> ObservedRead {
        ObservedRead::new("sample".to_owned(), observations)
    }

    fn diploid() -> IntervalPloidyMap {
        IntervalPloidyMap::new(2, Vec::new()).unwrap()
    }

    fn disambiguator(ploidy: &IntervalPloidyMap) -> Disambiguator<IntervalPloidyMap> {
        Disambiguator::new(ploidy, false, 93, 93)
    }

    #[test]
    fn test_no_loci_without_score_all_sites() {
        let ploidy = diploid();
        let pairs = disambiguator(&ploidy).observe(&read(vec![observation(10, 11, "A", true)]), &[]);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_snp_alt_call() {
        let ploidy = diploid();
        let locus = DiscoveredVariant::new(interval(10, 11), "A", "T");
        let pairs = disambiguator(&ploidy).observe(
            &read(vec![observation(10, 11, "T", false)]),
            &[locus.clone()],
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, locus);
        assert_eq!(pairs[0].1.class(), ObservationClass::Allele);
        assert_eq!(pairs[0].1.copy_number(), 2);
    }

    #[test]
    fn test_snp_reference_fallback() {
        let ploidy = diploid();
        let locus = DiscoveredVariant::new(interval(10, 11), "A", "T");
        let pairs = disambiguator(&ploidy)
            .observe(&read(vec![observation(10, 11, "A", true)]), &[locus]);
        assert_eq!(pairs[0].1.class(), ObservationClass::Reference);
    }

    #[test]
    fn test_snp_mismatching_allele_is_uninformative() {
        let ploidy = diploid();
        let locus = DiscoveredVariant::new(interval(10, 11), "A", "T");
        let pairs = disambiguator(&ploidy)
            .observe(&read(vec![observation(10, 11, "G", false)]), &[locus]);
        assert_eq!(pairs[0].1.class(), ObservationClass::Uninformative);
    }

    #[test]
    fn test_insertion_alt_call() {
        let ploidy = diploid();
        let locus = DiscoveredVariant::new(interval(10, 11), "A", "AT");
        // the tail observation shares the anchor interval
        let pairs = disambiguator(&ploidy).observe(
            &read(vec![
                observation(10, 11, "A", true),
                observation(10, 11, "T", false),
            ]),
            &[locus],
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1.class(), ObservationClass::Allele);
    }

    #[test]
    fn test_insertion_lead_base_mismatch_is_uninformative() {
        let ploidy = diploid();
        let locus = DiscoveredVariant::new(interval(10, 11), "A", "AT");
        let pairs = disambiguator(&ploidy).observe(
            &read(vec![
                observation(10, 11, "G", false),
                observation(10, 11, "T", false),
            ]),
            &[locus],
        );
        assert_eq!(pairs[0].1.class(), ObservationClass::Uninformative);
    }

    #[test]
    fn test_insertion_all_reference() {
        let ploidy = diploid();
        let locus = DiscoveredVariant::new(interval(10, 11), "A", "AT");
        let pairs = disambiguator(&ploidy)
            .observe(&read(vec![observation(10, 11, "A", true)]), &[locus]);
        assert_eq!(pairs[0].1.class(), ObservationClass::Reference);
    }

    #[test]
    fn test_deletion_alt_call() {
        let ploidy = diploid();
        let locus = DiscoveredVariant::new(interval(10, 13), "GAA", "G");
        let pairs = disambiguator(&ploidy).observe(
            &read(vec![
                observation(10, 11, "G", true),
                observation(11, 13, "", false),
            ]),
            &[locus],
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1.class(), ObservationClass::Allele);
    }

    #[test]
    fn test_deletion_width_mismatch_is_uninformative() {
        let ploidy = diploid();
        let locus = DiscoveredVariant::new(interval(10, 13), "GAA", "G");
        let pairs = disambiguator(&ploidy).observe(
            &read(vec![
                observation(10, 11, "G", true),
                observation(11, 14, "", false),
            ]),
            &[locus],
        );
        assert_eq!(pairs[0].1.class(), ObservationClass::Uninformative);
    }

    #[test]
    fn test_reference_call_requires_full_width() {
        let ploidy = diploid();
        let locus = DiscoveredVariant::new(interval(10, 13), "GAA", "G");
        // only two of the three reference bases observed
        let pairs = disambiguator(&ploidy).observe(
            &read(vec![
                observation(10, 11, "G", true),
                observation(11, 12, "A", true),
            ]),
            &[locus.clone()],
        );
        assert_eq!(pairs[0].1.class(), ObservationClass::Uninformative);

        let pairs = disambiguator(&ploidy).observe(
            &read(vec![
                observation(10, 11, "G", true),
                observation(11, 12, "A", true),
                observation(12, 13, "A", true),
            ]),
            &[locus],
        );
        assert_eq!(pairs[0].1.class(), ObservationClass::Reference);
    }

    #[test]
    fn test_overlap_suppression_downgrades_alt() {
        let ploidy = diploid();
        let deletion = DiscoveredVariant::new(interval(10, 13), "GAA", "G");
        let snp = DiscoveredVariant::new(interval(10, 11), "G", "T");
        let pairs = disambiguator(&ploidy).observe(
            &read(vec![
                observation(10, 11, "G", true),
                observation(11, 13, "", false),
            ]),
            &[deletion.clone(), snp.clone()],
        );
        assert_eq!(pairs.len(), 2);
        let deletion_verdict = pairs.iter().find(|(locus, _)| *locus == deletion).unwrap();
        let snp_verdict = pairs.iter().find(|(locus, _)| *locus == snp).unwrap();
        // the anchor base pins the read to the SNP locus reference, so the
        // deletion call is demoted to an unspecified other allele
        assert_eq!(snp_verdict.1.class(), ObservationClass::Reference);
        assert_eq!(deletion_verdict.1.class(), ObservationClass::OtherAllele);
    }

    #[test]
    fn test_score_all_sites_synthesizes_loci() {
        let ploidy = diploid();
        let caller = Disambiguator::new(&ploidy, true, 93, 93);
        let pairs = caller.observe(
            &read(vec![
                observation(10, 11, "A", true),
                observation(11, 12, "C", false),
            ]),
            &[],
        );
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|(locus, _)| locus.is_non_ref_model()));
        assert_eq!(pairs[0].1.class(), ObservationClass::Reference);
        assert_eq!(pairs[1].1.class(), ObservationClass::NonRef);
    }

    #[test]
    fn test_score_all_sites_mixes_loci_and_synthesis() {
        let ploidy = diploid();
        let caller = Disambiguator::new(&ploidy, true, 93, 93);
        let locus = DiscoveredVariant::new(interval(10, 11), "A", "T");
        let pairs = caller.observe(
            &read(vec![
                observation(10, 11, "T", false),
                observation(11, 12, "A", true),
            ]),
            &[locus.clone()],
        );
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, locus);
        assert_eq!(pairs[0].1.class(), ObservationClass::Allele);
        assert!(pairs[1].0.is_non_ref_model());
        assert_eq!(pairs[1].1.class(), ObservationClass::Reference);
    }

    #[test]
    fn test_copy_number_override_is_stamped() {
        let ploidy =
            IntervalPloidyMap::new(2, vec![(interval(0, 1000), 1)]).unwrap();
        let locus = DiscoveredVariant::new(interval(10, 11), "A", "T");
        let pairs = disambiguator(&ploidy)
            .observe(&read(vec![observation(10, 11, "T", false)]), &[locus]);
        assert_eq!(pairs[0].1.copy_number(), 1);
    }

    #[test]
    fn test_quality_clamps() {
        let ploidy = diploid();
        let caller = Disambiguator::new(&ploidy, false, 40, 50);
        let locus = DiscoveredVariant::new(interval(10, 11), "A", "T");
        let pairs = caller.observe(
            &read(vec![PositionObservation::new(
                interval(10, 11),
                "T".to_owned(),
                Evidence::new(Strand::Forward, 93, 93, false),
            )]),
            &[locus],
        );
        assert_eq!(pairs[0].1.base_quality(), 40);
        assert_eq!(pairs[0].1.mapping_quality(), 50);
    }

    #[test]
    fn test_malformed_candidate_drops_read() {
        let ploidy = diploid();
        let good = DiscoveredVariant::new(interval(20, 21), "A", "T");
        // a malformed candidate poisons the whole read, including its
        // evidence at well-formed loci
        let pairs = disambiguator(&ploidy).observe(
            &read(vec![
                observation(10, 11, "T", false),
                observation(20, 21, "T", false),
            ]),
            &[DiscoveredVariant::malformed(interval(10, 11)), good],
        );
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_disambiguation_is_deterministic() {
        let ploidy = diploid();
        let caller = Disambiguator::new(&ploidy, true, 93, 93);
        let loci = vec![
            DiscoveredVariant::new(interval(10, 13), "GAA", "G"),
            DiscoveredVariant::new(interval(10, 11), "G", "T"),
        ];
        let input = read(vec![
            observation(10, 11, "G", true),
            observation(11, 13, "", false),
            observation(20, 21, "A", true),
        ]);
        let first = caller.observe(&input, &loci);
        let second = caller.observe(&input, &loci);
        assert_eq!(first, second);
    }
}
