//! Biallelic genotype calling from per-read observations.
//!
//! The crate consumes a stream of reads paired with the candidate loci they
//! overlap (spatial join and read observation happen upstream), attributes
//! each read's evidence to single loci, aggregates evidence per site into
//! ploidy-aware log-likelihood curves, and decides the most probable
//! biallelic genotype per site together with a phred-scaled quality and a
//! strand-bias statistic.

#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate derefable;
#[macro_use]
extern crate strum_macros;
#[macro_use]
extern crate approx;

pub mod calling;
pub mod errors;
pub mod ploidy;
pub mod utils;
pub mod variants;
