//! stats.rs
//!
//! Log-space statistics for strand bias assessment.

use crate::utils::log_to_phred;

const LN_FACTORIAL_TABLE_SIZE: usize = 1 << 16;

lazy_static! {
    static ref LN_FACTORIAL: Vec<f64> = {
        let mut table = vec![0.0; LN_FACTORIAL_TABLE_SIZE];
        for n in 2..LN_FACTORIAL_TABLE_SIZE {
            table[n] = table[n - 1] + (n as f64).ln();
        }
        table
    };
}

/// ln(n!), tabulated for the coverage ranges seen in practice and extended
/// iteratively beyond the table.
pub fn ln_factorial(n: u64) -> f64 {
    if (n as usize) < LN_FACTORIAL_TABLE_SIZE {
        LN_FACTORIAL[n as usize]
    } else {
        let mut acc = LN_FACTORIAL[LN_FACTORIAL_TABLE_SIZE - 1];
        for k in LN_FACTORIAL_TABLE_SIZE as u64..=n {
            acc += (k as f64).ln();
        }
        acc
    }
}

/// Phred-scaled Fisher's exact test on the 2x2 strand contingency table.
///
/// Rows are allele classes (other vs allele), columns are strands. All
/// factorial terms are evaluated in log space so that site coverages in the
/// thousands cannot overflow.
pub fn strand_bias_phred(
    other_forward: u32,
    other_reverse: u32,
    allele_forward: u32,
    allele_reverse: u32,
) -> f64 {
    let (a, b, c, d) = (
        u64::from(other_forward),
        u64::from(other_reverse),
        u64::from(allele_forward),
        u64::from(allele_reverse),
    );
    let n = a + b + c + d;
    let ln_p = ln_factorial(a + b) + ln_factorial(c + d) + ln_factorial(a + c)
        + ln_factorial(b + d)
        - ln_factorial(a)
        - ln_factorial(b)
        - ln_factorial(c)
        - ln_factorial(d)
        - ln_factorial(n);
    log_to_phred(ln_p)
}
