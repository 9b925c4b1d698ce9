use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use callable_core::models::RegionSet;

use crate::errors::{CallableError, Result};

pub const DEFAULT_NUM_CORES: usize = 1;
pub const DEFAULT_NOMAP_SPLIT_SIZE: u32 = 2000;

///
/// Run configuration, read from a YAML or TOML file.
///
/// ```yaml
/// algorithm:
///   num_cores: 4
///   variant_regions: targets.bed
///   nomap_split_size: 2000
/// programs:
///   gatk: gatk
///   samtools: samtools
/// ```
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub algorithm: AlgorithmConfig,
    #[serde(default)]
    pub programs: ProgramsConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AlgorithmConfig {
    /// Worker count for the per-contig classification fan-out.
    pub num_cores: usize,
    /// Target regions; everything outside them is treated as not callable.
    pub variant_regions: Option<PathBuf>,
    /// Minimum no-coverage block size used as a split point, and the gap
    /// closed when combining samples.
    pub nomap_split_size: u32,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        AlgorithmConfig {
            num_cores: DEFAULT_NUM_CORES,
            variant_regions: None,
            nomap_split_size: DEFAULT_NOMAP_SPLIT_SIZE,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProgramsConfig {
    pub gatk: String,
    pub samtools: String,
}

impl Default for ProgramsConfig {
    fn default() -> Self {
        ProgramsConfig {
            gatk: "gatk".to_string(),
            samtools: "samtools".to_string(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ConfigFileType {
    Yaml,
    Toml,
}

impl ConfigFileType {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("yaml") | Some("yml") => Ok(ConfigFileType::Yaml),
            Some("toml") => Ok(ConfigFileType::Toml),
            _ => Err(CallableError::Config(format!(
                "config file must end in .yaml, .yml or .toml: {}",
                path.display()
            ))),
        }
    }
}

impl PipelineConfig {
    ///
    /// Check value ranges that serde can't express.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.algorithm.num_cores == 0 {
            return Err(CallableError::Config(
                "algorithm.num_cores must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn variant_regions(&self) -> Option<&Path> {
        self.algorithm.variant_regions.as_deref()
    }

    ///
    /// Read the configured target regions, if any.
    ///
    pub fn load_variant_regions(&self) -> Result<Option<RegionSet>> {
        match self.variant_regions() {
            Some(path) => Ok(Some(RegionSet::try_from(path)?)),
            None => Ok(None),
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(regions) = self.algorithm.variant_regions.as_mut() {
            if regions.is_relative() {
                *regions = base.join(&*regions);
            }
        }
    }
}

impl TryFrom<&Path> for PipelineConfig {
    type Error = CallableError;

    ///
    /// Load a config file. Relative `variant_regions` paths are resolved
    /// against the directory holding the config file.
    ///
    fn try_from(path: &Path) -> Result<Self> {
        let file_type = ConfigFileType::from_path(path)?;
        let raw = read_to_string(path)?;

        let mut config: PipelineConfig = match file_type {
            ConfigFileType::Yaml => serde_yaml::from_str(&raw)?,
            ConfigFileType::Toml => toml::from_str(&raw)?,
        };

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;

        Ok(config)
    }
}
