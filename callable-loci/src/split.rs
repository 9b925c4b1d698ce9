//! Fan coverage classification out over reference contigs and stitch the
//! per-contig outputs back together.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::info;

use callable_core::models::{ReferenceSpan, Region};

use crate::classify::{
    CallableInput, CoverageClassifier, calc_callable_loci, classify_region, default_callable_path,
};
use crate::errors::{CallableError, Result};
use crate::transaction::{OutputStatus, cached_output, file_exists};

/// One contig's share of the classification work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub region: Region,
    pub out_file: PathBuf,
}

///
/// One partition per non-empty reference contig, in reference order.
///
/// Outputs go to `<stem>-callable-parts/<name>-<contig>-callable.bed` next to
/// the BAM, where `stem` is the BAM path without extension and `name` its
/// file stem.
///
pub fn partition_by_contig(work_bam: &Path, reference: &ReferenceSpan) -> Vec<Partition> {
    let mut parts_dir = work_bam.with_extension("").into_os_string();
    parts_dir.push("-callable-parts");
    let parts_dir = PathBuf::from(parts_dir);

    let name = work_bam
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    reference
        .contigs()
        .iter()
        .filter_map(|contig| reference.contig_region(&contig.name))
        .map(|region| {
            let out_file = parts_dir.join(format!("{}-{}-callable.bed", name, region.chr()));
            Partition { region, out_file }
        })
        .collect()
}

///
/// Concatenate `in_files`, in order, into `out_file`.
///
/// Nothing happens when `out_file` already exists.
///
pub fn combine_bed(in_files: &[PathBuf], out_file: &Path) -> Result<PathBuf> {
    let status = cached_output(out_file, |tx_out_file| {
        let mut writer = BufWriter::new(File::create(tx_out_file)?);
        for in_file in in_files {
            let mut reader = File::open(in_file)?;
            io::copy(&mut reader, &mut writer)?;
        }
        writer.flush()?;
        Ok(())
    })?;

    if status == OutputStatus::Written {
        info!(parts = in_files.len(), output = %out_file.display(), "combined partition outputs");
    }
    Ok(out_file.to_owned())
}

///
/// Classify coverage for a whole BAM, in parallel over contigs when
/// `algorithm.num_cores > 1`.
///
/// Partitions run on a dedicated pool of `num_cores` threads. The combined
/// file is only assembled after every partition succeeded, and in reference
/// contig order, so it stays sorted. The BAM is prepared once, before any
/// partition runs. With a single core the classifier runs once over the whole
/// genome instead.
///
pub fn parallel_callable_loci(
    input: CallableInput,
    reference: &ReferenceSpan,
    classifier: &dyn CoverageClassifier,
    progress: &ProgressBar,
) -> Result<PathBuf> {
    let num_cores = input.config.algorithm.num_cores;
    if num_cores <= 1 {
        return calc_callable_loci(input, classifier, None, None);
    }

    let out_file = default_callable_path(input.work_bam);
    if file_exists(&out_file) {
        return Ok(out_file);
    }

    classifier.prepare_bam(input.work_bam)?;

    let partitions = partition_by_contig(input.work_bam, reference);
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_cores)
        .build()
        .map_err(|err| CallableError::WorkerPool(err.to_string()))?;

    info!(
        bam = %input.work_bam.display(),
        partitions = partitions.len(),
        num_cores,
        "classifying coverage by contig"
    );
    progress.set_length(partitions.len() as u64);

    let parts = pool.install(|| {
        partitions
            .par_iter()
            .map(|partition| {
                let part =
                    classify_region(input, classifier, Some(&partition.region), &partition.out_file)?;
                progress.inc(1);
                Ok(part)
            })
            .collect::<Result<Vec<PathBuf>>>()
    });
    progress.finish_and_clear();

    combine_bed(&parts?, &out_file)
}
