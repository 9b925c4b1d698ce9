//! Blocks without usable reads ("nblocks"), the candidate split points.

use std::fmt::{self, Display};
use std::io::BufRead;
use std::path::Path;

use tracing::{debug, info};

use callable_core::models::{Region, RegionSet};
use callable_core::utils::get_dynamic_reader;
use callable_core::RegionSetError;
use callable_ranges::IntervalRanges;

use crate::config::PipelineConfig;
use crate::errors::Result;

/// CallableLoci state of a stretch of bases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    RefN,
    Callable,
    NoCoverage,
    LowCoverage,
    ExcessiveCoverage,
    PoorMappingQuality,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::RefN => "REF_N",
            Category::Callable => "CALLABLE",
            Category::NoCoverage => "NO_COVERAGE",
            Category::LowCoverage => "LOW_COVERAGE",
            Category::ExcessiveCoverage => "EXCESSIVE_COVERAGE",
            Category::PoorMappingQuality => "POOR_MAPPING_QUALITY",
            Category::Other(name) => name,
        }
    }

    /// No reads, or no reference sequence, at all.
    pub fn is_nblock(&self) -> bool {
        matches!(self, Category::RefN | Category::NoCoverage)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match value {
            "REF_N" => Category::RefN,
            "CALLABLE" => Category::Callable,
            "NO_COVERAGE" => Category::NoCoverage,
            "LOW_COVERAGE" => Category::LowCoverage,
            "EXCESSIVE_COVERAGE" => Category::ExcessiveCoverage,
            "POOR_MAPPING_QUALITY" => Category::PoorMappingQuality,
            other => Category::Other(other.to_string()),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of classifier output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRecord {
    pub region: Region,
    pub category: Category,
}

impl ClassificationRecord {
    ///
    /// Parse `contig start end category`, whitespace separated.
    ///
    pub fn parse(line: &str, source: &str, line_number: usize) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [chr, start, end, category] = fields[..] else {
            return Err(RegionSetError::RegionParseError(format!(
                "{}:{}: expected 4 columns (contig, start, end, category), found {}",
                source,
                line_number,
                fields.len()
            ))
            .into());
        };

        let parse_coordinate = |raw: &str| {
            raw.parse::<u32>().map_err(|_| {
                RegionSetError::RegionParseError(format!(
                    "{}:{}: invalid position: {:?}",
                    source, line_number, raw
                ))
            })
        };

        Ok(ClassificationRecord {
            region: Region::new(chr, parse_coordinate(start)?, parse_coordinate(end)?)?,
            category: Category::from(category),
        })
    }

    pub fn width(&self) -> u32 {
        self.region.width()
    }
}

///
/// Read every record of a classification file. Blank lines are skipped; any
/// other line that does not parse aborts the read.
///
pub fn read_classification<R: BufRead>(reader: R, source: &str) -> Result<Vec<ClassificationRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(ClassificationRecord::parse(&line, source, index + 1)?);
    }
    Ok(records)
}

///
/// Regions of the reference with no mapping, strictly longer than
/// `min_n_size`. These are potential breakpoints for parallelizing analysis.
///
pub fn get_nblock_regions(in_file: &Path, min_n_size: u32) -> Result<RegionSet> {
    let source = in_file.display().to_string();
    let reader = get_dynamic_reader(in_file)?;

    let records = read_classification(reader, &source)?;
    let total = records.len();
    let regions: Vec<Region> = records
        .into_iter()
        .filter(|record| record.category.is_nblock() && record.width() > min_n_size)
        .map(|record| record.region)
        .collect();

    debug!(
        input = %source,
        records = total,
        nblocks = regions.len(),
        min_n_size,
        "extracted nblocks"
    );
    Ok(RegionSet::from(regions))
}

///
/// Treat everything outside the configured target regions as an nblock too.
///
/// Without `variant_regions` the nblocks are returned as they are.
///
pub fn add_config_regions(
    nblock_regions: &RegionSet,
    ref_regions: &RegionSet,
    config: &PipelineConfig,
) -> Result<RegionSet> {
    let Some(targets) = config.load_variant_regions()? else {
        return Ok(nblock_regions.clone());
    };

    let outside_targets = ref_regions.setdiff(&targets);
    info!(
        targets = targets.len(),
        outside_bases = outside_targets.nucleotides_length(),
        "restricting callable regions to targets"
    );
    Ok(nblock_regions.merge(&outside_targets, 0))
}
