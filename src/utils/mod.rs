use bio::stats::{LogProb, PHREDProb, Prob};
use bio_types::genome::{self, AbstractInterval};

pub mod stats;

/// Error probability encoded by a phred-scaled quality score.
/// Uses rust-bio's `PHREDProb` and `Prob` types for precise, idiomatic conversion.
pub(crate) fn phred_error(quality: u32) -> f64 {
    *Prob::from(PHREDProb(f64::from(quality)))
}

/// Phred-scaled rendering of a natural-log probability.
pub(crate) fn log_to_phred(ln_prob: f64) -> f64 {
    *PHREDProb::from(LogProb(ln_prob))
}

/// True if both half-open intervals share a contig and intersect.
pub(crate) fn overlaps(a: &genome::Interval, b: &genome::Interval) -> bool {
    a.contig() == b.contig()
        && a.range().start < b.range().end
        && b.range().start < a.range().end
}
