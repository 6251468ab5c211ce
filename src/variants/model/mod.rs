//! Genotype decision over aggregated site evidence.

use anyhow::Result;

use crate::errors::Error;
use crate::variants::evidence::observation::Observation;
use self::likelihood::CurvePeak;

pub mod likelihood;

/// The two-allele hypotheses competing at a site, in tie-break priority
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumIter)]
pub enum Hypothesis {
    AlleleReference,
    AlleleOther,
    OtherReference,
}

/// Outcome of the closed-form genotype decision at one site. The allele
/// counts always sum to the site's copy number.
#[derive(Debug, Clone, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct GenotypeDecision {
    hypothesis: Hypothesis,
    alt_count: u32,
    ref_count: u32,
    other_count: u32,
    quality: f64,
}

/// Pick the most probable two-allele genotype for the site.
///
/// Blends the aggregated single-allele dosage curves into the three
/// competing hypotheses, scores each by the phred-scaled gap between its
/// best and runner-up state, and takes the highest-quality hypothesis
/// (earlier hypotheses win ties).
pub fn decide(observation: &Observation) -> Result<GenotypeDecision> {
    let expected = observation.copy_number() as usize + 1;
    for curve in &[
        observation.reference_log_likelihoods(),
        observation.allele_log_likelihoods(),
        observation.other_log_likelihoods(),
        observation.non_ref_log_likelihoods(),
    ] {
        if curve.len() != expected {
            return Err(Error::CurveShape {
                len: curve.len(),
                copy_number: observation.copy_number(),
                expected,
            }
            .into());
        }
    }

    let allele = observation.allele_log_likelihoods();
    let reference = observation.reference_log_likelihoods();
    let other = observation.other_log_likelihoods();

    let candidates = vec![
        (Hypothesis::AlleleReference, allele.blend(reference).peak()),
        (Hypothesis::AlleleOther, allele.blend(other).peak()),
        (Hypothesis::OtherReference, other.blend(reference).peak()),
    ];

    let (mut hypothesis, mut peak): (Hypothesis, CurvePeak) = candidates[0];
    for &(candidate, candidate_peak) in &candidates[1..] {
        if candidate_peak.quality() > peak.quality() {
            hypothesis = candidate;
            peak = candidate_peak;
        }
    }

    let state = peak.state() as u32;
    let complement = observation.copy_number() - state;
    let (alt_count, ref_count, other_count) = match hypothesis {
        Hypothesis::AlleleReference => (state, complement, 0),
        Hypothesis::AlleleOther => (state, 0, complement),
        Hypothesis::OtherReference => (0, complement, state),
    };

    Ok(GenotypeDecision {
        hypothesis,
        alt_count,
        ref_count,
        other_count,
        quality: peak.quality(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::evidence::observation::{ObservationClass, SummarizedObservation};

    fn expand(class: ObservationClass, copy_number: u32) -> Observation {
        SummarizedObservation::new(class, true, 30, 60, copy_number).expand()
    }

    #[test]
    fn test_degenerate_tie_breaks_to_reference_genotype() {
        // no informative evidence: all blends are flat, every hypothesis has
        // quality 0, and the allele/reference hypothesis wins by priority
        // with its earliest (zero alt copies) state
        let decision = decide(&Observation::identity(2)).unwrap();
        assert_eq!(decision.hypothesis(), Hypothesis::AlleleReference);
        assert_eq!(decision.alt_count(), 0);
        assert_eq!(decision.ref_count(), 2);
        assert_eq!(decision.other_count(), 0);
        assert_relative_eq!(decision.quality(), 0.0);
    }

    #[test]
    fn test_hom_alt() {
        let mut obs = expand(ObservationClass::Allele, 2);
        for _ in 0..4 {
            obs += expand(ObservationClass::Allele, 2);
        }
        let decision = decide(&obs).unwrap();
        // allele/reference ties with allele/other here (no other-allele
        // evidence, so the reference and other curves coincide); priority
        // keeps allele/reference
        assert_eq!(decision.hypothesis(), Hypothesis::AlleleReference);
        assert_eq!(decision.alt_count(), 2);
        assert_eq!(decision.ref_count(), 0);
        assert!(decision.quality() > 0.0);
    }

    #[test]
    fn test_het() {
        let mut obs = Observation::identity(2);
        for _ in 0..3 {
            obs += expand(ObservationClass::Allele, 2);
            obs += expand(ObservationClass::Reference, 2);
        }
        let decision = decide(&obs).unwrap();
        assert_eq!(decision.hypothesis(), Hypothesis::AlleleReference);
        assert_eq!(decision.alt_count(), 1);
        assert_eq!(decision.ref_count(), 1);
        assert_eq!(decision.other_count(), 0);
    }

    #[test]
    fn test_counts_sum_to_copy_number() {
        for copy_number in 1..=4 {
            let mut obs = expand(ObservationClass::Allele, copy_number);
            obs += expand(ObservationClass::OtherAllele, copy_number);
            obs += expand(ObservationClass::Reference, copy_number);
            let decision = decide(&obs).unwrap();
            assert_eq!(
                decision.alt_count() + decision.ref_count() + decision.other_count(),
                copy_number
            );
        }
    }

    #[test]
    fn test_other_reference_hypothesis() {
        let mut obs = Observation::identity(2);
        for _ in 0..3 {
            obs += expand(ObservationClass::OtherAllele, 2);
            obs += expand(ObservationClass::Reference, 2);
        }
        let decision = decide(&obs).unwrap();
        assert_eq!(decision.hypothesis(), Hypothesis::OtherReference);
        assert_eq!(decision.alt_count(), 0);
        assert_eq!(decision.ref_count(), 1);
        assert_eq!(decision.other_count(), 1);
    }

    #[test]
    fn test_curve_shape_is_checked() {
        let mismatched = Observation::identity(2).with_copy_number(3);
        let err = decide(&mismatched).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::CurveShape {
                len: 3,
                copy_number: 3,
                expected: 4,
            })
        );
    }
}
