use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use callable_core::models::RegionSet;
use callable_loci::config::PipelineConfig;

///
/// Read the run configuration, or fall back to the defaults.
///
pub fn load_config(path: Option<&String>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::try_from(Path::new(p))
            .with_context(|| format!("Failed to load config file {}", p)),
        None => Ok(PipelineConfig::default()),
    }
}

///
/// Write regions as BED to `output`, or to stdout when no path is given.
///
pub fn write_output(rs: &RegionSet, output: Option<&String>) -> Result<()> {
    match output {
        Some(p) => {
            rs.to_bed(Path::new(p))
                .with_context(|| format!("Failed to write output to {}", p))?;
            tracing::info!(output = %p, regions = rs.len(), "output written");
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            rs.write_bed(&mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}
