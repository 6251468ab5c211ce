//! Assembly of the final per-site genotype record.

use anyhow::Result;
use itertools::{repeat_n, Itertools};

use crate::utils::stats::strand_bias_phred;
use crate::variants::evidence::observation::Observation;
use crate::variants::model::{self, likelihood::LikelihoodCurve};
use crate::variants::DiscoveredVariant;

/// Allele token of a called genotype. The output ordering is fixed for wire
/// compatibility: all ALT copies first, then REF, then OTHER_ALT.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
pub enum GenotypeAllele {
    #[strum(serialize = "ALT")]
    Alt,
    #[strum(serialize = "REF")]
    Ref,
    #[strum(serialize = "OTHER_ALT")]
    OtherAlt,
}

/// A genotyped site, ready for serialization into a variant-call
/// representation.
#[derive(Debug, Clone, PartialEq, Serialize, Getters, CopyGetters)]
pub struct GenotypeCall {
    #[getset(get = "pub")]
    variant: DiscoveredVariant,
    #[getset(get = "pub")]
    sample: String,
    #[getset(get = "pub")]
    alleles: Vec<GenotypeAllele>,
    #[getset(get = "pub")]
    genotype_likelihoods: LikelihoodCurve,
    #[getset(get = "pub")]
    non_ref_likelihoods: LikelihoodCurve,
    #[getset(get_copy = "pub")]
    total_coverage: u32,
    #[getset(get_copy = "pub")]
    allele_coverage: u32,
    #[getset(get_copy = "pub")]
    other_coverage: u32,
    #[getset(get_copy = "pub")]
    rms_mapping_quality: f64,
    #[getset(get_copy = "pub")]
    strand_bias: f64,
    #[getset(get_copy = "pub")]
    genotype_quality: i32,
}

/// Decide the genotype at one site and assemble its call record.
pub(crate) fn genotype_site(
    variant: &DiscoveredVariant,
    observation: &Observation,
    sample: &str,
) -> Result<GenotypeCall> {
    let decision = model::decide(observation)?;

    let alleles = repeat_n(GenotypeAllele::Alt, decision.alt_count() as usize)
        .chain(repeat_n(GenotypeAllele::Ref, decision.ref_count() as usize))
        .chain(repeat_n(
            GenotypeAllele::OtherAlt,
            decision.other_count() as usize,
        ))
        .collect_vec();

    let genotype_likelihoods = observation
        .allele_log_likelihoods()
        .blend(observation.reference_log_likelihoods());
    let non_ref_likelihoods = observation
        .non_ref_log_likelihoods()
        .blend(observation.reference_log_likelihoods());

    let strand_bias = strand_bias_phred(
        observation.other_forward_strand(),
        observation.other_coverage() - observation.other_forward_strand(),
        observation.allele_forward_strand(),
        observation.allele_coverage() - observation.allele_forward_strand(),
    );

    Ok(GenotypeCall {
        variant: variant.clone(),
        sample: sample.to_owned(),
        alleles,
        genotype_likelihoods,
        non_ref_likelihoods,
        total_coverage: observation.total_coverage(),
        allele_coverage: observation.allele_coverage(),
        other_coverage: observation.other_coverage(),
        rms_mapping_quality: rms_mapping_quality(observation),
        strand_bias,
        genotype_quality: decision.quality() as i32,
    })
}

/// Root-mean-square mapping quality over allele- and other-supporting reads.
/// Sites without such reads have no informative mapping evidence and report
/// 0.0 instead of dividing by zero.
pub(crate) fn rms_mapping_quality(observation: &Observation) -> f64 {
    let depth = observation.allele_coverage() + observation.other_coverage();
    if depth == 0 {
        0.0
    } else {
        (observation.square_map_q() / f64::from(depth)).sqrt()
    }
}
