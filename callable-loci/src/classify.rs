//! Per-base coverage classification of aligned reads.
//!
//! The classifier itself is an external program; this module decides where
//! its outputs go, which region it is restricted to, and makes the call
//! idempotent and atomic. [CoverageClassifier] is the seam: the production
//! implementation shells out to GATK `CallableLoci`, tests swap in a fake.

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use callable_core::models::{Region, RegionSet};
use callable_ranges::IntervalRanges;

use crate::config::{PipelineConfig, ProgramsConfig};
use crate::errors::{CallableError, Result};
use crate::transaction::{OutputStatus, cached_output, file_exists, file_transaction};

/// Region restriction handed to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierScope {
    /// The whole reference.
    Genome,
    /// A single locus.
    Locus(Region),
    /// The intervals of a BED file. The file may be empty.
    Intervals(PathBuf),
}

impl ClassifierScope {
    ///
    /// Value for the classifier's region option, `None` for the whole genome.
    ///
    pub fn as_argument(&self) -> Option<String> {
        match self {
            ClassifierScope::Genome => None,
            ClassifierScope::Locus(region) => Some(region.to_locus()),
            ClassifierScope::Intervals(path) => Some(path.display().to_string()),
        }
    }
}

impl Display for ClassifierScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_argument() {
            Some(arg) => write!(f, "{}", arg),
            None => write!(f, "genome"),
        }
    }
}

/// One classifier run.
#[derive(Debug, Clone)]
pub struct ClassifierRequest {
    pub bam: PathBuf,
    pub reference: PathBuf,
    pub scope: ClassifierScope,
    /// Where the `contig\tstart\tend\tcategory` records must be written.
    pub out_file: PathBuf,
    pub summary_file: PathBuf,
}

/// Files written by a classifier run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationOutput {
    pub records: PathBuf,
    pub summary: PathBuf,
}

///
/// Capability to classify every base of a BAM into coverage categories.
///
pub trait CoverageClassifier: Send + Sync {
    /// Make sure the contig layout of `reference` can be read, e.g. by
    /// building its sequence dictionary.
    fn prepare_reference(&self, _reference: &Path) -> Result<()> {
        Ok(())
    }

    /// Make sure `bam` can be read by region, e.g. by building its index.
    fn prepare_bam(&self, _bam: &Path) -> Result<()> {
        Ok(())
    }

    /// Classify the requested scope, writing `request.out_file` and
    /// `request.summary_file`.
    fn invoke(&self, request: &ClassifierRequest) -> Result<ClassificationOutput>;
}

/// The per-sample inputs of a classification run.
#[derive(Debug, Clone, Copy)]
pub struct CallableInput<'a> {
    pub work_bam: &'a Path,
    pub reference: &'a Path,
    pub config: &'a PipelineConfig,
}

///
/// GATK `CallableLoci` run as a subprocess, with `samtools index` for BAMs
/// lacking an index and `samtools dict` for references lacking a sequence
/// dictionary.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatkCallableLoci {
    pub gatk: String,
    pub samtools: String,
}

impl GatkCallableLoci {
    pub fn new(programs: &ProgramsConfig) -> Self {
        GatkCallableLoci {
            gatk: programs.gatk.clone(),
            samtools: programs.samtools.clone(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        GatkCallableLoci::new(&config.programs)
    }

    pub fn command_args(&self, request: &ClassifierRequest) -> Vec<String> {
        let mut args = vec![
            "-T".to_string(),
            "CallableLoci".to_string(),
            "-R".to_string(),
            request.reference.display().to_string(),
            "-I".to_string(),
            request.bam.display().to_string(),
            "--out".to_string(),
            request.out_file.display().to_string(),
            "--summary".to_string(),
            request.summary_file.display().to_string(),
        ];
        if let Some(region) = request.scope.as_argument() {
            args.push("-L".to_string());
            args.push(region);
        }
        args
    }
}

impl CoverageClassifier for GatkCallableLoci {
    fn prepare_reference(&self, reference: &Path) -> Result<()> {
        let is_table = reference
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "dict" | "fai" | "sizes"));
        let dict = reference.with_extension("dict");
        if is_table || dict.is_file() || appended(reference, ".dict").is_file() {
            return Ok(());
        }

        info!(reference = %reference.display(), dict = %dict.display(), "creating sequence dictionary");
        file_transaction(&dict, |tx_dict| {
            let mut command = Command::new(&self.samtools);
            command.arg("dict").arg(reference).arg("-o").arg(tx_dict);
            run_command(command, &self.samtools, &format!("{} dict", self.samtools))
        })
    }

    fn prepare_bam(&self, bam: &Path) -> Result<()> {
        if bam_index_exists(bam) {
            return Ok(());
        }

        let index = bam_index_path(bam);
        info!(bam = %bam.display(), index = %index.display(), "indexing BAM");
        file_transaction(&index, |tx_index| {
            let mut command = Command::new(&self.samtools);
            command.arg("index").arg(bam).arg(tx_index);
            run_command(command, &self.samtools, &format!("{} index", self.samtools))
        })
    }

    fn invoke(&self, request: &ClassifierRequest) -> Result<ClassificationOutput> {
        let args = self.command_args(request);
        let command_line = format!("{} {}", self.gatk, args.join(" "));
        debug!(command = %command_line, "running CallableLoci");

        let mut command = Command::new(&self.gatk);
        command.args(&args);
        run_command(command, &self.gatk, &command_line)?;

        Ok(ClassificationOutput {
            records: request.out_file.clone(),
            summary: request.summary_file.clone(),
        })
    }
}

fn run_command(mut command: Command, program: &str, command_line: &str) -> Result<()> {
    let output = command.output().map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            CallableError::CommandNotFound {
                command: program.to_string(),
            }
        } else {
            CallableError::Io(err)
        }
    })?;

    if !output.status.success() {
        return Err(CallableError::ClassifierInvocation {
            command: command_line.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(())
}

fn appended(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// `<bam>.bai`, where `samtools index` puts the index by default.
pub fn bam_index_path(bam: &Path) -> PathBuf {
    appended(bam, ".bai")
}

fn bam_index_exists(bam: &Path) -> bool {
    bam_index_path(bam).is_file() || bam.with_extension("bai").is_file()
}

///
/// `<path without extension><suffix>`, e.g. `sample.bam` -> `sample-callable.bed`.
///
pub fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.with_extension("").into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Default classification output for a BAM.
pub fn default_callable_path(work_bam: &Path) -> PathBuf {
    with_stem_suffix(work_bam, "-callable.bed")
}

/// Summary file that accompanies a classification output.
pub fn summary_path(out_file: &Path) -> PathBuf {
    with_stem_suffix(out_file, "-summary.txt")
}

///
/// Work out which part of the genome the classifier should look at.
///
/// - nothing configured: the whole genome
/// - only target regions: the target file
/// - only a region: that locus
/// - both: the targets inside the region, written to `<out stem>-regions.bed`.
///   An empty overlap still yields a (blank) file, and the classifier still runs.
///
pub fn subset_variant_regions(
    variant_regions: Option<&Path>,
    region: Option<&Region>,
    out_file: &Path,
) -> Result<ClassifierScope> {
    match (variant_regions, region) {
        (None, None) => Ok(ClassifierScope::Genome),
        (Some(targets), None) => Ok(ClassifierScope::Intervals(targets.to_owned())),
        (None, Some(region)) => Ok(ClassifierScope::Locus(region.clone())),
        (Some(targets), Some(region)) => {
            let targets = RegionSet::try_from(targets)?;
            let locus = RegionSet::from(vec![region.clone()]);
            let subset = locus.intersect(&targets);

            if subset.is_empty() {
                warn!(region = %region.to_locus(), "no target regions overlap this region");
            }

            let subset_file = with_stem_suffix(out_file, "-regions.bed");
            subset.to_bed(&subset_file)?;
            Ok(ClassifierScope::Intervals(subset_file))
        }
    }
}

///
/// Classify coverage for one BAM, optionally restricted to `region`.
///
/// Returns the path of the classification file. An existing file is trusted
/// and returned without running anything; otherwise the BAM is prepared and
/// the classifier writes into a transaction that is renamed into place.
///
pub fn calc_callable_loci(
    input: CallableInput,
    classifier: &dyn CoverageClassifier,
    region: Option<&Region>,
    out_file: Option<&Path>,
) -> Result<PathBuf> {
    let out_file = out_file
        .map(Path::to_owned)
        .unwrap_or_else(|| default_callable_path(input.work_bam));

    if !file_exists(&out_file) {
        classifier.prepare_bam(input.work_bam)?;
    }
    classify_region(input, classifier, region, &out_file)
}

///
/// [calc_callable_loci] for a BAM that was already prepared.
///
pub(crate) fn classify_region(
    input: CallableInput,
    classifier: &dyn CoverageClassifier,
    region: Option<&Region>,
    out_file: &Path,
) -> Result<PathBuf> {
    let out_file = out_file.to_owned();
    let status = cached_output(&out_file, |tx_out_file| {
        let scope = subset_variant_regions(input.config.variant_regions(), region, tx_out_file)?;
        let request = ClassifierRequest {
            bam: input.work_bam.to_owned(),
            reference: input.reference.to_owned(),
            scope,
            out_file: tx_out_file.to_owned(),
            summary_file: summary_path(&out_file),
        };

        info!(
            bam = %input.work_bam.display(),
            scope = %request.scope,
            "classifying coverage"
        );
        let output = classifier.invoke(&request)?;
        if !output.records.is_file() {
            return Err(CallableError::MissingOutput(out_file.clone()));
        }
        Ok(())
    })?;

    if status == OutputStatus::Cached {
        debug!(output = %out_file.display(), "reusing coverage classification");
    }
    Ok(out_file)
}
