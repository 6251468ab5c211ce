use auto_ops::impl_op_ex;
use bio_types::genome::{self, AbstractInterval};

use crate::variants::model::likelihood::{self, LikelihoodCurve};

/// Strand a read aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn is_forward(&self) -> bool {
        *self == Strand::Forward
    }
}

/// Base-level evidence attached to one observed reference position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Evidence {
    strand: Strand,
    base_quality: u32,
    mapping_quality: u32,
    /// Whether the read matches the reference at this position.
    is_ref: bool,
}

/// One read's statement about one reference position: where, which allele,
/// and how confidently. The allele string is empty for a deleted span, a
/// single base for a SNP or reference match, and the inserted tail for an
/// insertion (sharing the anchor position's interval).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new, Getters)]
pub struct PositionObservation {
    #[getset(get = "pub")]
    interval: genome::Interval,
    #[getset(get = "pub")]
    allele: String,
    #[getset(get = "pub")]
    evidence: Evidence,
}

impl PositionObservation {
    /// Reference bases spanned by this observation.
    pub(crate) fn width(&self) -> u64 {
        self.interval.range().end - self.interval.range().start
    }
}

/// A read as delivered by the upstream observation extractor, together with
/// its sample of origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new, Getters)]
#[getset(get = "pub")]
pub struct ObservedRead {
    sample: String,
    observations: Vec<PositionObservation>,
}

impl ObservedRead {
    /// Smallest interval covering all of the read's observations.
    pub(crate) fn span(&self) -> Option<genome::Interval> {
        let contig = self.observations.first()?.interval().contig().to_owned();
        let start = self
            .observations
            .iter()
            .map(|obs| obs.interval().range().start)
            .min()?;
        let end = self
            .observations
            .iter()
            .map(|obs| obs.interval().range().end)
            .max()?;
        Some(genome::Interval::new(contig, start..end))
    }
}

/// Which hypothesis bucket a read's evidence at a site feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationClass {
    /// Supports the locus reference allele.
    Reference,
    /// Supports the locus alternate allele.
    Allele,
    /// Supports some non-reference allele other than the locus alternate.
    OtherAllele,
    /// Supports a non-reference allele at a site scored without a fixed
    /// alternate.
    NonRef,
    /// Disambiguation could not attribute the read; contributes to no
    /// hypothesis.
    Uninformative,
}

/// One read's disambiguated verdict at one site, with qualities already
/// clamped and the local copy number stamped on.
#[derive(Debug, Clone, PartialEq, Serialize, new, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct SummarizedObservation {
    class: ObservationClass,
    forward_strand: bool,
    base_quality: u32,
    mapping_quality: u32,
    copy_number: u32,
}

impl SummarizedObservation {
    pub(crate) fn uninformative(copy_number: u32) -> Self {
        SummarizedObservation::new(ObservationClass::Uninformative, false, 0, 0, copy_number)
    }

    pub(crate) fn is_alt(&self) -> bool {
        self.class == ObservationClass::Allele
    }

    /// A definite verdict pins the read to the locus reference or alternate
    /// allele; other/non-ref/uninformative verdicts do not.
    pub(crate) fn is_definite(&self) -> bool {
        matches!(
            self.class,
            ObservationClass::Reference | ObservationClass::Allele
        )
    }

    pub(crate) fn downgrade_to_other(&mut self) {
        self.class = ObservationClass::OtherAllele;
    }

    /// Expand the verdict into the aggregatable evidence record with its
    /// four dosage curves.
    pub fn expand(&self) -> Observation {
        let states = self.copy_number as usize + 1;
        if self.class == ObservationClass::Uninformative {
            return Observation::identity(self.copy_number);
        }

        let concordance = likelihood::concordance(self.base_quality, self.mapping_quality);
        let supporting = LikelihoodCurve::supporting(concordance, self.copy_number);
        let conflicting = LikelihoodCurve::conflicting(concordance, self.copy_number);
        let forward = self.forward_strand as u32;
        let square_map_q = f64::from(self.mapping_quality).powi(2);

        let mut observation = Observation {
            is_ref: false,
            is_other: false,
            is_non_ref: false,
            allele_forward_strand: 0,
            other_forward_strand: 0,
            square_map_q: 0.0,
            reference_log_likelihoods: conflicting.clone(),
            allele_log_likelihoods: conflicting.clone(),
            other_log_likelihoods: conflicting.clone(),
            non_ref_log_likelihoods: conflicting,
            allele_coverage: 0,
            other_coverage: 0,
            total_coverage: 1,
            copy_number: self.copy_number,
        };
        debug_assert_eq!(observation.reference_log_likelihoods.len(), states);

        match self.class {
            ObservationClass::Reference => {
                observation.is_ref = true;
                observation.reference_log_likelihoods = supporting;
            }
            ObservationClass::Allele => {
                observation.allele_log_likelihoods = supporting.clone();
                observation.non_ref_log_likelihoods = supporting;
                observation.allele_coverage = 1;
                observation.allele_forward_strand = forward;
                observation.square_map_q = square_map_q;
            }
            ObservationClass::OtherAllele => {
                observation.is_other = true;
                observation.other_log_likelihoods = supporting.clone();
                observation.non_ref_log_likelihoods = supporting;
                observation.other_coverage = 1;
                observation.other_forward_strand = forward;
                observation.square_map_q = square_map_q;
            }
            ObservationClass::NonRef => {
                observation.is_non_ref = true;
                observation.non_ref_log_likelihoods = supporting;
            }
            ObservationClass::Uninformative => unreachable!(),
        }
        observation
    }
}

/// Aggregated evidence of all reads at one site: coverage and strand counts,
/// summed squared mapping quality, and the four dosage log-likelihood curves.
/// Each curve has exactly `copy_number + 1` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Getters, CopyGetters)]
pub struct Observation {
    #[getset(get_copy = "pub")]
    is_ref: bool,
    #[getset(get_copy = "pub")]
    is_other: bool,
    #[getset(get_copy = "pub")]
    is_non_ref: bool,
    #[getset(get_copy = "pub")]
    allele_forward_strand: u32,
    #[getset(get_copy = "pub")]
    other_forward_strand: u32,
    #[getset(get_copy = "pub")]
    square_map_q: f64,
    #[getset(get = "pub")]
    reference_log_likelihoods: LikelihoodCurve,
    #[getset(get = "pub")]
    allele_log_likelihoods: LikelihoodCurve,
    #[getset(get = "pub")]
    other_log_likelihoods: LikelihoodCurve,
    #[getset(get = "pub")]
    non_ref_log_likelihoods: LikelihoodCurve,
    #[getset(get_copy = "pub")]
    allele_coverage: u32,
    #[getset(get_copy = "pub")]
    other_coverage: u32,
    #[getset(get_copy = "pub")]
    total_coverage: u32,
    #[getset(get_copy = "pub")]
    copy_number: u32,
}

impl Observation {
    /// The additive identity for the given copy number: no coverage, flat
    /// curves.
    pub(crate) fn identity(copy_number: u32) -> Self {
        let states = copy_number as usize + 1;
        Observation {
            is_ref: false,
            is_other: false,
            is_non_ref: false,
            allele_forward_strand: 0,
            other_forward_strand: 0,
            square_map_q: 0.0,
            reference_log_likelihoods: LikelihoodCurve::flat(states),
            allele_log_likelihoods: LikelihoodCurve::flat(states),
            other_log_likelihoods: LikelihoodCurve::flat(states),
            non_ref_log_likelihoods: LikelihoodCurve::flat(states),
            allele_coverage: 0,
            other_coverage: 0,
            total_coverage: 0,
            copy_number,
        }
    }
}

#[cfg(test)]
impl Observation {
    pub(crate) fn with_copy_number(mut self, copy_number: u32) -> Self {
        self.copy_number = copy_number;
        self
    }
}

impl_op_ex!(+= |a: &mut Observation, b: &Observation| {
    assert_eq!(
        a.copy_number, b.copy_number,
        "evidence merged across differing copy numbers"
    );
    // first-wins for is_ref/copy_number (uniform within a site); the other
    // bucket tags are ORed, which is commutative and loses no information
    a.is_other |= b.is_other;
    a.is_non_ref |= b.is_non_ref;
    a.allele_forward_strand += b.allele_forward_strand;
    a.other_forward_strand += b.other_forward_strand;
    a.square_map_q += b.square_map_q;
    a.reference_log_likelihoods = a.reference_log_likelihoods.merged(&b.reference_log_likelihoods);
    a.allele_log_likelihoods = a.allele_log_likelihoods.merged(&b.allele_log_likelihoods);
    a.other_log_likelihoods = a.other_log_likelihoods.merged(&b.other_log_likelihoods);
    a.non_ref_log_likelihoods = a.non_ref_log_likelihoods.merged(&b.non_ref_log_likelihoods);
    a.allele_coverage += b.allele_coverage;
    a.other_coverage += b.other_coverage;
    a.total_coverage += b.total_coverage;
});

impl_op_ex!(+ |a: &Observation, b: &Observation| -> Observation {
    let mut sum = a.clone();
    sum += b;
    sum
});
