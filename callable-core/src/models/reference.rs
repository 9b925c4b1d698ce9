//! Contig layout of a reference genome.
//!
//! The reference span is read from the sequence dictionary or fasta index
//! that sits next to the fasta file; the sequence itself is never loaded.
//! Contigs keep their declared order, which is the order every downstream
//! region set is reported in.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use noodles::fasta::fai;

use crate::errors::{RegionSetError, Result};
use crate::models::{Region, RegionSet};
use crate::utils::get_dynamic_reader;

/// A single named sequence of the reference and its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    pub length: u32,
}

/// Ordered contigs of a reference genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSpan {
    contigs: Vec<Contig>,
    index: HashMap<String, usize>,
    pub path: Option<PathBuf>,
}

impl ReferenceSpan {
    pub fn new(contigs: Vec<Contig>) -> Self {
        let index = contigs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        ReferenceSpan {
            contigs,
            index,
            path: None,
        }
    }

    ///
    /// Locate and parse the contig table for a reference.
    ///
    /// `ref_file` may point at a `.dict`, `.fai` or chrom sizes file directly.
    /// For a fasta file the candidates are tried in order: `<stem>.dict`,
    /// `<ref>.dict`, `<ref>.fai`.
    ///
    pub fn from_reference<P: AsRef<Path>>(ref_file: P) -> Result<Self> {
        let ref_file = ref_file.as_ref();
        let path = locate_contig_table(ref_file)
            .ok_or_else(|| RegionSetError::ReferenceNotFound(ref_file.to_owned()))?;

        let reader = get_dynamic_reader(&path)?;
        let contigs = match path.extension().and_then(|ext| ext.to_str()) {
            Some("dict") => parse_dict_reader(reader, &path)?,
            Some("fai") => parse_fai_reader(reader, &path)?,
            _ => parse_sizes_reader(reader, &path)?,
        };

        if contigs.is_empty() {
            return Err(RegionSetError::EmptyReference(path));
        }

        let mut span = ReferenceSpan::new(contigs);
        span.path = Some(path);
        Ok(span)
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn contig_length(&self, name: &str) -> Option<u32> {
        self.index.get(name).map(|&i| self.contigs[i].length)
    }

    /// Position of a contig in declaration order.
    pub fn contig_rank(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    ///
    /// The regions of `rs` regrouped by contig declaration order. Order within
    /// a contig is kept; contigs the reference does not declare go last.
    ///
    pub fn in_reference_order(&self, rs: &RegionSet) -> RegionSet {
        let mut regions = rs.regions().to_vec();
        regions.sort_by_key(|r| self.contig_rank(r.chr()).unwrap_or(usize::MAX));
        RegionSet::from(regions)
    }

    ///
    /// Whole-contig region for `name`, if the contig is declared and not empty.
    ///
    pub fn contig_region(&self, name: &str) -> Option<Region> {
        let length = self.contig_length(name)?;
        Region::non_empty(name, 0, length)
    }

    ///
    /// One `(name, 0, length)` region per contig, in declaration order.
    /// Zero-length contigs are skipped.
    ///
    pub fn to_region_set(&self) -> RegionSet {
        let regions: Vec<Region> = self
            .contigs
            .iter()
            .filter_map(|c| Region::non_empty(&c.name, 0, c.length))
            .collect();
        RegionSet::from(regions)
    }
}

fn locate_contig_table(ref_file: &Path) -> Option<PathBuf> {
    let is_table = ref_file
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "dict" | "fai" | "sizes"));
    if is_table {
        return ref_file.is_file().then(|| ref_file.to_owned());
    }

    let with_suffix = |suffix: &str| {
        let mut name = ref_file.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };

    let candidates = [
        ref_file.with_extension("dict"),
        with_suffix(".dict"),
        with_suffix(".fai"),
    ];
    candidates.into_iter().find(|p| p.is_file())
}

///
/// Parse the `@SQ` lines of a Picard sequence dictionary (a SAM header).
///
fn parse_dict_reader<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Contig>> {
    let mut contigs = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if !line.starts_with("@SQ") {
            continue;
        }

        let mut name: Option<&str> = None;
        let mut length: Option<&str> = None;
        for field in line.split('\t').skip(1) {
            if let Some(value) = field.strip_prefix("SN:") {
                name = Some(value);
            } else if let Some(value) = field.strip_prefix("LN:") {
                length = Some(value);
            }
        }

        let (Some(name), Some(length)) = (name, length) else {
            return Err(RegionSetError::RegionParseError(format!(
                "{}: @SQ line without SN or LN: {}",
                path.display(),
                line
            )));
        };

        contigs.push(Contig {
            name: name.to_string(),
            length: parse_length(length, name, path)?,
        });
    }

    Ok(contigs)
}

///
/// Read the contigs of a fasta index.
///
fn parse_fai_reader<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Contig>> {
    let index = fai::io::Reader::new(reader).read_index().map_err(|err| {
        RegionSetError::RegionParseError(format!("{}: invalid fasta index: {}", path.display(), err))
    })?;

    let mut contigs = Vec::new();
    for record in index.as_ref() {
        let name = String::from_utf8_lossy(record.name()).to_string();
        let length = u32::try_from(record.length()).map_err(|_| {
            RegionSetError::RegionParseError(format!(
                "{}: contig '{}' is too long: {}",
                path.display(),
                name,
                record.length()
            ))
        })?;
        contigs.push(Contig { name, length });
    }

    Ok(contigs)
}

///
/// Parse a chrom sizes table: name and length in the first two
/// whitespace-separated columns.
///
fn parse_sizes_reader<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Contig>> {
    let mut contigs = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(name), Some(length)) = (fields.next(), fields.next()) else {
            return Err(RegionSetError::RegionParseError(format!(
                "{}: expected contig name and length: {}",
                path.display(),
                line
            )));
        };

        contigs.push(Contig {
            name: name.to_string(),
            length: parse_length(length, name, path)?,
        });
    }

    Ok(contigs)
}

fn parse_length(raw: &str, name: &str, path: &Path) -> Result<u32> {
    raw.trim().parse::<u32>().map_err(|_| {
        RegionSetError::RegionParseError(format!(
            "{}: invalid length for contig '{}': {}",
            path.display(),
            name,
            raw
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data/callable")
            .join(file_name)
    }

    #[rstest]
    fn test_from_fasta_prefers_dict() {
        let span = ReferenceSpan::from_reference(get_test_path("ref.fa")).unwrap();
        assert_eq!(span.path.as_ref().unwrap(), &get_test_path("ref.dict"));
        assert_eq!(
            span.contigs(),
            &[
                Contig {
                    name: "chr1".to_string(),
                    length: 1000
                },
                Contig {
                    name: "chr2".to_string(),
                    length: 600
                },
                Contig {
                    name: "chrM".to_string(),
                    length: 160
                },
            ]
        );
    }

    #[rstest]
    fn test_from_fai_directly() {
        let span = ReferenceSpan::from_reference(get_test_path("ref.fa.fai")).unwrap();
        assert_eq!(span.len(), 3);
        assert_eq!(span.contig_length("chr2"), Some(600));
        assert_eq!(span.contig_rank("chrM"), Some(2));
    }

    #[rstest]
    fn test_falls_back_to_fai() {
        let tempdir = tempfile::tempdir().unwrap();
        let fasta = tempdir.path().join("genome.fa");
        std::fs::write(&fasta, ">chr1\nACGT\n").unwrap();
        std::fs::write(tempdir.path().join("genome.fa.fai"), "chr1\t4\t6\t4\t5\n").unwrap();

        let span = ReferenceSpan::from_reference(&fasta).unwrap();
        assert_eq!(span.to_region_set().as_tuples(), vec![("chr1".to_string(), 0, 4)]);
    }

    #[rstest]
    fn test_malformed_fai_is_an_error() {
        let tempdir = tempfile::tempdir().unwrap();
        let fai = tempdir.path().join("genome.fa.fai");
        std::fs::write(&fai, "chr1\tnot-a-length\t6\t60\t61\n").unwrap();

        let result = ReferenceSpan::from_reference(&fai);
        assert!(matches!(result, Err(RegionSetError::RegionParseError(_))));
    }

    #[rstest]
    fn test_from_chrom_sizes() {
        let tempdir = tempfile::tempdir().unwrap();
        let sizes = tempdir.path().join("genome.chrom.sizes");
        std::fs::write(&sizes, "chr1\t1000\nchr2\t600\n").unwrap();

        let span = ReferenceSpan::from_reference(&sizes).unwrap();
        assert_eq!(span.contig_length("chr2"), Some(600));
    }

    #[rstest]
    fn test_missing_reference_table() {
        let tempdir = tempfile::tempdir().unwrap();
        let fasta = tempdir.path().join("genome.fa");
        let result = ReferenceSpan::from_reference(&fasta);
        assert!(matches!(result, Err(RegionSetError::ReferenceNotFound(_))));
    }

    #[rstest]
    fn test_region_set_keeps_declared_order() {
        let span = ReferenceSpan::from_reference(get_test_path("ref.fa")).unwrap();
        let chroms: Vec<String> = span
            .to_region_set()
            .as_tuples()
            .into_iter()
            .map(|(chr, _, _)| chr)
            .collect();
        assert_eq!(chroms, vec!["chr1", "chr2", "chrM"]);
    }

    #[rstest]
    fn test_dict_line_without_length_is_an_error() {
        let text = "@HD\tVN:1.6\n@SQ\tSN:chr1\n";
        let result = parse_dict_reader(text.as_bytes(), Path::new("bad.dict"));
        assert!(result.is_err());
    }

    #[rstest]
    fn test_in_reference_order_regroups_contigs() {
        let span = ReferenceSpan::from_reference(get_test_path("ref.fa")).unwrap();
        let rs = RegionSet::from_bed_str(
            "chrM\t0\t10\nchrUn\t5\t9\nchr2\t0\t600\nchr1\t0\t400\nchr1\t700\t1000\n",
        )
        .unwrap();

        assert_eq!(
            span.in_reference_order(&rs).as_tuples(),
            vec![
                ("chr1".to_string(), 0, 400),
                ("chr1".to_string(), 700, 1000),
                ("chr2".to_string(), 0, 600),
                ("chrM".to_string(), 0, 10),
                ("chrUn".to_string(), 5, 9),
            ]
        );
    }

    #[rstest]
    fn test_contig_region_unknown_contig() {
        let span = ReferenceSpan::new(vec![Contig {
            name: "chr1".to_string(),
            length: 10,
        }]);
        assert!(span.contig_region("chr9").is_none());
        assert_eq!(span.contig_region("chr1").unwrap().to_locus(), "chr1:1-10");
    }
}
