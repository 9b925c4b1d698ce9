//! # Callable regions for parallel variant calling
//!
//! Finds the parts of a reference genome that aligned reads can actually
//! support, so variant calling can be split at large stretches without data
//! and run per chunk.
//!
//! The pipeline for one sample is:
//!
//! 1. classify every base of the BAM with an external coverage classifier
//!    ([classify]), optionally fanned out per contig ([split]);
//! 2. keep large no-coverage and reference-N stretches as split points
//!    ([nblocks]), plus everything outside the configured targets;
//! 3. subtract those from the reference span ([blocks]).
//!
//! Jointly analyzed samples are then merged into one project-wide split
//! ([combine]).
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use callable_loci::classify::GatkCallableLoci;
//! use callable_loci::config::PipelineConfig;
//! use callable_loci::compute_callable_blocks;
//!
//! let config = PipelineConfig::try_from(Path::new("callable.yaml")).unwrap();
//! let gatk = GatkCallableLoci::from_config(&config);
//! let blocks = compute_callable_blocks(
//!     Path::new("NA12878.bam"),
//!     Path::new("hg38.fa"),
//!     &config,
//!     &gatk,
//! )
//! .unwrap();
//! println!("{} callable blocks", blocks.len());
//! ```
pub mod blocks;
pub mod classify;
pub mod combine;
pub mod config;
pub mod errors;
pub mod nblocks;
pub mod split;
pub mod transaction;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub use blocks::{block_regions, compute_callable_blocks};
pub use combine::{RegionAssignment, SampleRegionState, combine_multi_sample};
pub use errors::{CallableError, Result};

static TRACING_INIT: Once = Once::new();

///
/// Log to stderr, filtered by `RUST_LOG` (default `info`). Safe to call more
/// than once.
///
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
