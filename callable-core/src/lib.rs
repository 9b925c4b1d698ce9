//! # Core models for callable-region detection
//!
//! Genomic intervals ([`Region`]), ordered interval collections ([`RegionSet`])
//! and the contig layout of a reference genome ([`ReferenceSpan`]). Everything
//! uses 0-based, half-open coordinates (BED convention).
//!
//! ```no_run
//! use callable_core::models::{ReferenceSpan, RegionSet};
//!
//! let span = ReferenceSpan::from_reference("hg38.fa").unwrap();
//! let targets = RegionSet::try_from("targets.bed").unwrap();
//!
//! println!("{} contigs, {} target regions", span.len(), targets.len());
//! ```
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{RegionSetError, Result};
