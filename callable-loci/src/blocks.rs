use std::path::Path;

use indicatif::ProgressBar;
use tracing::info;

use callable_core::models::{ReferenceSpan, RegionSet};
use callable_ranges::IntervalRanges;

use crate::classify::{CallableInput, CoverageClassifier};
use crate::config::PipelineConfig;
use crate::errors::{CallableError, Result};
use crate::nblocks::{add_config_regions, get_nblock_regions};
use crate::split::parallel_callable_loci;

///
/// Callable regions from a finished classification file: the reference minus
/// the nblocks, widened by everything outside the configured targets.
///
/// The result follows the reference contig order, ascending within a contig.
///
pub fn block_regions(
    callable_bed: &Path,
    reference: &ReferenceSpan,
    config: &PipelineConfig,
) -> Result<RegionSet> {
    let min_n_size = config.algorithm.nomap_split_size;
    let ref_regions = reference.to_region_set();

    let nblock_regions = get_nblock_regions(callable_bed, min_n_size)?;
    let nblock_regions = add_config_regions(&nblock_regions, &ref_regions, config)?;

    Ok(ref_regions.setdiff(&nblock_regions))
}

///
/// Find islands of callable regions, surrounded by regions without read
/// support, that can be analyzed independently.
///
/// # Arguments
/// - bam: aligned reads of one sample
/// - reference: reference fasta; its `.dict` or `.fai` provides the contigs
/// - config: run configuration
/// - classifier: coverage classifier to run, once or once per contig
///
pub fn compute_callable_blocks(
    bam: &Path,
    reference: &Path,
    config: &PipelineConfig,
    classifier: &dyn CoverageClassifier,
) -> Result<RegionSet> {
    compute_callable_blocks_with_progress(bam, reference, config, classifier, &ProgressBar::hidden())
}

///
/// [compute_callable_blocks], reporting per-contig progress on `progress`.
///
pub fn compute_callable_blocks_with_progress(
    bam: &Path,
    reference: &Path,
    config: &PipelineConfig,
    classifier: &dyn CoverageClassifier,
    progress: &ProgressBar,
) -> Result<RegionSet> {
    if !bam.is_file() {
        return Err(CallableError::MissingInput(format!(
            "BAM file not found: {}",
            bam.display()
        )));
    }

    classifier.prepare_reference(reference)?;
    let span = ReferenceSpan::from_reference(reference)?;
    let input = CallableInput {
        work_bam: bam,
        reference,
        config,
    };

    let callable_bed = parallel_callable_loci(input, &span, classifier, progress)?;
    let blocks = block_regions(&callable_bed, &span, config)?;

    info!(
        bam = %bam.display(),
        blocks = blocks.len(),
        callable_bases = blocks.nucleotides_length(),
        "computed callable blocks"
    );
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use callable_core::models::Contig;

    use crate::config::AlgorithmConfig;

    fn get_test_path(file_name: &str) -> PathBuf {
        PathBuf::from("../tests/data/callable").join(file_name)
    }

    fn config(nomap_split_size: u32, variant_regions: Option<PathBuf>) -> PipelineConfig {
        PipelineConfig {
            algorithm: AlgorithmConfig {
                nomap_split_size,
                variant_regions,
                ..AlgorithmConfig::default()
            },
            ..PipelineConfig::default()
        }
    }

    fn chr1_span() -> ReferenceSpan {
        ReferenceSpan::new(vec![Contig {
            name: "chr1".to_string(),
            length: 1000,
        }])
    }

    #[rstest]
    fn test_no_coverage_block_splits_contig() {
        let tempdir = tempfile::tempdir().unwrap();
        let classified = tempdir.path().join("sample-callable.bed");
        std::fs::write(
            &classified,
            "chr1\t0\t400\tCALLABLE\nchr1\t400\t700\tNO_COVERAGE\nchr1\t700\t1000\tCALLABLE\n",
        )
        .unwrap();

        let blocks = block_regions(&classified, &chr1_span(), &config(100, None)).unwrap();
        assert_eq!(
            blocks.as_tuples(),
            vec![("chr1".to_string(), 0, 400), ("chr1".to_string(), 700, 1000)]
        );
    }

    #[rstest]
    fn test_targets_make_the_rest_uncallable() {
        let tempdir = tempfile::tempdir().unwrap();
        let classified = tempdir.path().join("sample-callable.bed");
        std::fs::write(&classified, "chr1\t400\t700\tNO_COVERAGE\n").unwrap();
        let targets = tempdir.path().join("targets.bed");
        std::fs::write(&targets, "chr1\t0\t500\n").unwrap();

        let blocks =
            block_regions(&classified, &chr1_span(), &config(100, Some(targets))).unwrap();
        assert_eq!(blocks.as_tuples(), vec![("chr1".to_string(), 0, 400)]);
    }

    #[rstest]
    fn test_small_gaps_do_not_split() {
        let tempdir = tempfile::tempdir().unwrap();
        let classified = tempdir.path().join("sample-callable.bed");
        std::fs::write(&classified, "chr1\t400\t450\tNO_COVERAGE\n").unwrap();

        let blocks = block_regions(&classified, &chr1_span(), &config(100, None)).unwrap();
        assert_eq!(blocks.as_tuples(), vec![("chr1".to_string(), 0, 1000)]);
    }

    #[rstest]
    fn test_fixture_follows_reference_order() {
        let span = ReferenceSpan::from_reference(get_test_path("ref.fa")).unwrap();
        let blocks =
            block_regions(&get_test_path("sample.callable.bed"), &span, &config(20, None)).unwrap();

        assert_eq!(
            blocks.as_tuples(),
            vec![
                ("chr1".to_string(), 0, 400),
                ("chr1".to_string(), 700, 950),
                ("chr2".to_string(), 0, 50),
                ("chr2".to_string(), 120, 600),
                ("chrM".to_string(), 0, 160),
            ]
        );
    }

    #[rstest]
    fn test_missing_bam_is_reported() {
        let result = compute_callable_blocks(
            Path::new("/nonexistent/sample.bam"),
            &get_test_path("ref.fa"),
            &PipelineConfig::default(),
            &crate::classify::GatkCallableLoci::new(&Default::default()),
        );
        assert!(matches!(result, Err(CallableError::MissingInput(_))));
    }
}
