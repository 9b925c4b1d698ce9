use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde_json::json;

use callable_core::models::RegionSet;
use callable_loci::{SampleRegionState, combine_multi_sample};

use crate::common::load_config;

pub fn run_combine(matches: &ArgMatches) -> Result<()> {
    let reference = matches
        .get_one::<String>("reference")
        .expect("--reference is required");
    let work_dir = matches
        .get_one::<String>("work-dir")
        .expect("--work-dir is required");
    let config = load_config(matches.get_one::<String>("config"))?;

    let samples = matches
        .get_many::<String>("blocks")
        .expect("--blocks is required")
        .map(|path| {
            let blocks = RegionSet::try_from(path.as_str())
                .map_err(|e| anyhow::anyhow!("Failed to load BED file {}: {}", path, e))?;
            let name = Path::new(path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            Ok(
                SampleRegionState::new(name, path, reference, config.clone(), work_dir)
                    .with_callable_blocks(blocks),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let combined = combine_multi_sample(samples).context("Failed to combine sample regions")?;

    let assignment = combined
        .first()
        .and_then(|sample| sample.regions.as_ref())
        .context("Combined samples carry no region assignment")?;
    let names: Vec<&str> = combined.iter().map(|s| s.name.as_str()).collect();

    let report = json!({
        "samples": names,
        "assignment": assignment.summary(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
