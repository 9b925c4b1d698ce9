use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use indicatif::ProgressBar;

use callable_loci::blocks::compute_callable_blocks_with_progress;
use callable_loci::classify::GatkCallableLoci;

use crate::common::{load_config, write_output};

pub fn run_blocks(matches: &ArgMatches) -> Result<()> {
    let bam = matches
        .get_one::<String>("bam")
        .expect("--bam is required");
    let reference = matches
        .get_one::<String>("reference")
        .expect("--reference is required");
    let config = load_config(matches.get_one::<String>("config"))?;

    let progress = if matches.get_flag("progress") {
        ProgressBar::new(0)
    } else {
        ProgressBar::hidden()
    };

    let classifier = GatkCallableLoci::from_config(&config);
    let blocks = compute_callable_blocks_with_progress(
        Path::new(bam),
        Path::new(reference),
        &config,
        &classifier,
        &progress,
    )
    .with_context(|| format!("Failed to compute callable blocks for {}", bam))?;

    write_output(&blocks, matches.get_one::<String>("output"))
}
