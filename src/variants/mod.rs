use bio_types::genome::{self, AbstractInterval};

pub mod evidence;
pub mod model;

/// A candidate locus to genotype: a reference region plus the allele pair
/// discovered there, or a synthetic score-everywhere position without a
/// fixed alternate allele.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, CopyGetters)]
pub struct DiscoveredVariant {
    #[getset(get = "pub")]
    interval: genome::Interval,
    #[getset(get = "pub")]
    ref_allele: Option<String>,
    #[getset(get = "pub")]
    alt_allele: Option<String>,
    #[getset(get_copy = "pub")]
    is_non_ref_model: bool,
}

impl DiscoveredVariant {
    pub fn new(interval: genome::Interval, ref_allele: &str, alt_allele: &str) -> Self {
        DiscoveredVariant {
            interval,
            ref_allele: Some(ref_allele.to_owned()),
            alt_allele: Some(alt_allele.to_owned()),
            is_non_ref_model: false,
        }
    }

    /// Synthetic locus used to score a covered position without a concrete
    /// alternate allele (gVCF-style).
    pub fn non_ref_model(interval: genome::Interval) -> Self {
        DiscoveredVariant {
            interval,
            ref_allele: None,
            alt_allele: None,
            is_non_ref_model: true,
        }
    }

    pub fn contig(&self) -> &str {
        self.interval.contig()
    }

    pub fn start(&self) -> u64 {
        self.interval.range().start
    }

    fn ref_len(&self) -> u64 {
        self.ref_allele.as_ref().map_or(0, |allele| allele.len() as u64)
    }

    fn alt_len(&self) -> u64 {
        self.alt_allele.as_ref().map_or(0, |allele| allele.len() as u64)
    }

    pub fn is_snp(&self) -> bool {
        !self.is_non_ref_model && self.ref_len() == 1 && self.alt_len() == 1
    }

    pub fn is_deletion(&self) -> bool {
        !self.is_non_ref_model && self.ref_len() > 1 && self.alt_len() == 1
    }

    pub fn is_insertion(&self) -> bool {
        !self.is_non_ref_model && self.ref_len() == 1 && self.alt_len() > 1
    }

    /// Number of reference bases removed by a deletion allele.
    pub fn deletion_length(&self) -> u64 {
        self.ref_len().saturating_sub(self.alt_len())
    }

    /// A concrete candidate without alleles, as deserialized from malformed
    /// upstream input.
    #[cfg(test)]
    pub(crate) fn malformed(interval: genome::Interval) -> Self {
        DiscoveredVariant {
            interval,
            ref_allele: None,
            alt_allele: None,
            is_non_ref_model: false,
        }
    }
}
