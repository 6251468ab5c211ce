//! Ploidy-aware dosage likelihoods.
//!
//! Every observation contributes, per allele class, a curve of natural-log
//! likelihoods indexed by the hypothesized number of copies of that class
//! (0 up to the local copy number). Curves are sized at runtime from the
//! copy number map; all combinators check shapes.

use crate::utils::{log_to_phred, phred_error};

/// Ordered log-likelihoods over allele dosage, one entry per copy count
/// `0..=copy_number`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Derefable)]
pub struct LikelihoodCurve {
    #[deref]
    inner: Vec<f64>,
}

impl LikelihoodCurve {
    pub fn new(inner: Vec<f64>) -> Self {
        LikelihoodCurve { inner }
    }

    /// The additive identity: a flat all-zero curve.
    pub(crate) fn flat(states: usize) -> Self {
        LikelihoodCurve {
            inner: vec![0.0; states],
        }
    }

    /// P(observation | g copies) for an observation supporting the allele
    /// class in question.
    pub(crate) fn supporting(concordance: f64, copy_number: u32) -> Self {
        Self::dosage(concordance, copy_number)
    }

    /// Same, for an observation contradicting the allele class.
    pub(crate) fn conflicting(concordance: f64, copy_number: u32) -> Self {
        Self::dosage(1.0 - concordance, copy_number)
    }

    fn dosage(prob_match: f64, copy_number: u32) -> Self {
        let total = f64::from(copy_number);
        LikelihoodCurve {
            inner: (0..=copy_number)
                .map(|copies| {
                    let copies = f64::from(copies);
                    ((copies * prob_match + (total - copies) * (1.0 - prob_match)) / total).ln()
                })
                .collect(),
        }
    }

    /// Elementwise sum with a same-shaped curve.
    pub(crate) fn merged(&self, other: &Self) -> Self {
        assert_eq!(
            self.len(),
            other.len(),
            "likelihood curves of different shape cannot be summed"
        );
        LikelihoodCurve {
            inner: self
                .iter()
                .zip(other.iter())
                .map(|(a, b)| a + b)
                .collect(),
        }
    }

    /// Joint curve for a two-allele genotype: entry `i` combines `i` copies
    /// backing `self` with `states - 1 - i` copies backing `other`, under
    /// independence of the two single-allele curves.
    pub fn blend(&self, other: &Self) -> Self {
        assert_eq!(
            self.len(),
            other.len(),
            "likelihood curves of different shape cannot be blended"
        );
        let states = self.len();
        LikelihoodCurve {
            inner: (0..states)
                .map(|i| self.inner[i] + other.inner[states - 1 - i])
                .collect(),
        }
    }

    /// Position of the maximum together with the runner-up value.
    ///
    /// The first two entries are compared directly; later entries replace
    /// the running maximum or runner-up on strict improvement only, so index
    /// ties resolve to the earliest occurrence.
    pub fn peak(&self) -> CurvePeak {
        assert!(self.len() >= 2, "dosage curve needs at least two states");
        let (mut state, mut max, mut runner_up) = if self.inner[1] > self.inner[0] {
            (1, self.inner[1], self.inner[0])
        } else {
            (0, self.inner[0], self.inner[1])
        };
        for (i, &value) in self.inner.iter().enumerate().skip(2) {
            if value > max {
                runner_up = max;
                max = value;
                state = i;
            } else if value > runner_up {
                runner_up = value;
            }
        }
        CurvePeak {
            state,
            max,
            runner_up,
        }
    }
}

/// Maximum of a curve together with the second-largest entry.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct CurvePeak {
    state: usize,
    max: f64,
    runner_up: f64,
}

impl CurvePeak {
    /// Phred-scaled confidence: the log-likelihood gap between the best and
    /// the runner-up dosage.
    pub fn quality(&self) -> f64 {
        log_to_phred(self.runner_up - self.max)
    }
}

/// Probability that a read faithfully reports its template allele, given
/// clamped base and mapping qualities. A mismapped read is treated as an
/// uninformative coin flip.
pub(crate) fn concordance(base_quality: u32, mapping_quality: u32) -> f64 {
    let base_error = phred_error(base_quality);
    let mismap = phred_error(mapping_quality);
    (1.0 - mismap) * (1.0 - base_error) + mismap * 0.5
}
