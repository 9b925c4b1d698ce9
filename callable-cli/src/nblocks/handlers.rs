use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use callable_loci::nblocks::get_nblock_regions;

use crate::common::write_output;

pub fn run_nblocks(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .expect("--input is required");
    let min_n_size = *matches
        .get_one::<u32>("min-n-size")
        .expect("--min-n-size has a default");

    let nblocks = get_nblock_regions(Path::new(input), min_n_size)
        .with_context(|| format!("Failed to read classification file {}", input))?;

    write_output(&nblocks, matches.get_one::<String>("output"))
}
