//! Project-wide callable regions shared by jointly analyzed samples.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use callable_core::models::{ReferenceSpan, RegionSet};
use callable_ranges::IntervalRanges;

use crate::blocks::compute_callable_blocks;
use crate::classify::CoverageClassifier;
use crate::config::PipelineConfig;
use crate::errors::{CallableError, Result};
use crate::transaction::write_regions_if_changed;

pub const ANALYSIS_BLOCKS_FILE: &str = "analysis_blocks.bed";
pub const NOANALYSIS_BLOCKS_FILE: &str = "noanalysis_blocks.bed";

///
/// The single split of the genome every sample of a run is analyzed with.
///
#[derive(Debug, Clone)]
pub struct RegionAssignment {
    /// Callable regions, merged across samples.
    pub analysis: RegionSet,
    /// BED file of the reference not covered by `analysis`.
    pub noanalysis: PathBuf,
    /// BED file holding `analysis`.
    pub analysis_file: PathBuf,
}

/// Serializable overview of a [RegionAssignment].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentSummary {
    pub identifier: String,
    pub analysis_file: PathBuf,
    pub noanalysis_file: PathBuf,
    pub analysis_regions: usize,
    pub analysis_bases: u64,
}

impl RegionAssignment {
    pub fn summary(&self) -> AssignmentSummary {
        AssignmentSummary {
            identifier: self.analysis.identifier(),
            analysis_file: self.analysis_file.clone(),
            noanalysis_file: self.noanalysis.clone(),
            analysis_regions: self.analysis.len(),
            analysis_bases: self.analysis.nucleotides_length(),
        }
    }
}

///
/// A sample going through callable-region analysis.
///
#[derive(Debug, Clone)]
pub struct SampleRegionState {
    pub name: String,
    pub work_bam: PathBuf,
    pub reference: PathBuf,
    pub config: PipelineConfig,
    pub work_dir: PathBuf,
    pub callable_blocks: RegionSet,
    /// Set once samples have been combined; identical for every sample of
    /// the combination.
    pub regions: Option<Arc<RegionAssignment>>,
}

impl SampleRegionState {
    pub fn new(
        name: impl Into<String>,
        work_bam: impl Into<PathBuf>,
        reference: impl Into<PathBuf>,
        config: PipelineConfig,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        SampleRegionState {
            name: name.into(),
            work_bam: work_bam.into(),
            reference: reference.into(),
            config,
            work_dir: work_dir.into(),
            callable_blocks: RegionSet::default(),
            regions: None,
        }
    }

    pub fn with_callable_blocks(mut self, callable_blocks: RegionSet) -> Self {
        self.callable_blocks = callable_blocks;
        self
    }

    ///
    /// Run coverage classification for this sample and keep the blocks.
    ///
    pub fn compute_callable_blocks(&mut self, classifier: &dyn CoverageClassifier) -> Result<()> {
        self.callable_blocks =
            compute_callable_blocks(&self.work_bam, &self.reference, &self.config, classifier)?;
        Ok(())
    }
}

///
/// Write `analysis` and its complement in the reference to `work_dir`.
///
fn write_bed_regions(
    work_dir: &Path,
    reference: &ReferenceSpan,
    analysis: RegionSet,
) -> Result<RegionAssignment> {
    let noanalysis = reference.to_region_set().setdiff(&analysis);

    let analysis_file = work_dir.join(ANALYSIS_BLOCKS_FILE);
    let noanalysis_file = work_dir.join(NOANALYSIS_BLOCKS_FILE);
    write_regions_if_changed(&analysis, &analysis_file)?;
    write_regions_if_changed(&noanalysis, &noanalysis_file)?;

    let mut analysis = analysis;
    analysis.path = Some(analysis_file.clone());

    Ok(RegionAssignment {
        analysis,
        noanalysis: noanalysis_file,
        analysis_file,
    })
}

///
/// Combine islands of callable regions from multiple samples into one set
/// usable across a project with multi-sample calling.
///
/// Blocks are merged left to right, closing gaps of up to the first sample's
/// `nomap_split_size`, and reported in reference contig order, so the result
/// does not depend on sample order. The result and its complement are written
/// to the first sample's work directory and every sample receives the same
/// assignment.
///
pub fn combine_sample_regions(samples: Vec<SampleRegionState>) -> Result<Vec<SampleRegionState>> {
    let Some(first) = samples.first() else {
        return Err(CallableError::MissingInput(
            "no samples to combine".to_string(),
        ));
    };

    let gap = first.config.algorithm.nomap_split_size;
    let merged = samples.iter().fold(RegionSet::default(), |acc, sample| {
        acc.merge(&sample.callable_blocks, gap)
    });

    let reference = ReferenceSpan::from_reference(&first.reference)?;
    let analysis = reference.in_reference_order(&merged);
    let assignment = Arc::new(write_bed_regions(&first.work_dir, &reference, analysis)?);

    info!(
        samples = samples.len(),
        gap,
        regions = assignment.analysis.len(),
        identifier = %assignment.analysis.identifier(),
        output = %assignment.analysis_file.display(),
        "combined sample regions"
    );

    Ok(samples
        .into_iter()
        .map(|mut sample| {
            sample.regions = Some(Arc::clone(&assignment));
            sample
        })
        .collect())
}

///
/// Entry point for downstream stages: assign one project-wide callable
/// region split to every sample.
///
pub fn combine_multi_sample(samples: Vec<SampleRegionState>) -> Result<Vec<SampleRegionState>> {
    combine_sample_regions(samples)
}
