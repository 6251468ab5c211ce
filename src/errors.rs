use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error(
        "reads from multiple samples given ({first} and {second}); exactly one sample is genotyped per run"
    )]
    MultipleSamples { first: String, second: String },
    #[error("candidate at {contig}:{pos} lacks reference/alternate alleles")]
    MissingAlleles { contig: String, pos: u64 },
    #[error(
        "likelihood curve with {len} entries does not fit copy number {copy_number} (expected {expected})"
    )]
    CurveShape {
        len: usize,
        copy_number: u32,
        expected: usize,
    },
    #[error("invalid ploidy {ploidy}; every region needs at least one allele copy")]
    InvalidPloidy { ploidy: u32 },
}
