//! # Interval set algebra for callable region bookkeeping
//!
//! Set operations over [RegionSet](callable_core::models::RegionSet) values:
//! subtraction, union with a gap distance, intersection and reduction. The
//! callable-region pipeline is built from these alone, e.g. the callable part
//! of a genome is `reference.setdiff(&uncallable)`.
//!
//! ```rust
//! use callable_core::models::RegionSet;
//! use callable_ranges::IntervalRanges;
//!
//! let genome = RegionSet::from_bed_str("chr1\t0\t1000\n").unwrap();
//! let blocks = RegionSet::from_bed_str("chr1\t400\t700\n").unwrap();
//!
//! let callable = genome.setdiff(&blocks);
//! assert_eq!(callable.len(), 2);
//! ```
pub mod interval_ranges;

pub use interval_ranges::IntervalRanges;
