use std::collections::HashSet;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::errors::{RegionSetError, Result};
use crate::models::Region;
use crate::utils::get_dynamic_reader;

///
/// RegionSet struct, an ordered collection of [Region]s such as the content
/// of a bed file.
///
/// Order is significant: sets read from disk keep the file order, and sets
/// produced by interval algebra keep the contig order of their left-hand
/// operand.
///
#[derive(Clone, Debug, Default)]
pub struct RegionSet {
    regions: Vec<Region>,
    pub header: Option<String>,
    pub path: Option<PathBuf>,
}

pub struct RegionSetIterator<'a> {
    region_set: &'a RegionSet,
    index: usize,
}

impl RegionSet {
    ///
    /// Parse bed-like text from any buffered reader.
    ///
    /// Only the first three columns are used. `browser`, `track` and `#` lines,
    /// as well as a column-name line at the top of the file, are collected
    /// into the header. A line that does not parse aborts the whole read.
    ///
    /// # Arguments
    /// - reader: source of bed lines
    /// - source: name used in error messages
    pub fn from_bed_reader<R: BufRead>(reader: R, source: &str) -> Result<Self> {
        let mut regions: Vec<Region> = Vec::new();
        let mut header = String::new();
        let mut first_line = true;

        for (line_number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }

            if line.starts_with("browser") || line.starts_with("track") || line.starts_with('#') {
                if !header.is_empty() {
                    header.push('\n');
                }
                header.push_str(line);
                first_line = false;
                continue;
            }

            let parts: Vec<&str> = line.split('\t').collect();

            // Handling column headers like `chr start end etc` without #
            if first_line {
                first_line = false;
                if parts.len() >= 3 && parts[1].parse::<u32>().is_err() {
                    header.push_str(line);
                    continue;
                }
            }

            regions.push(parse_bed_fields(&parts, source, line_number + 1)?);
        }

        Ok(RegionSet {
            regions,
            header: (!header.is_empty()).then_some(header),
            path: None,
        })
    }

    ///
    /// Parse bed-like text held in memory.
    ///
    pub fn from_bed_str(text: &str) -> Result<Self> {
        RegionSet::from_bed_reader(text.as_bytes(), "<memory>")
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    ///
    /// Save a regionset to disk as bed file
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    pub fn to_bed<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        self.write_bed(&mut writer)?;
        writer.flush()
    }

    ///
    /// Write `chr\tstart\tend` lines, no header.
    ///
    pub fn write_bed<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        for region in &self.regions {
            writeln!(writer, "{}", region.as_string())?;
        }
        Ok(())
    }

    ///
    /// Calculate identifier for RegionSet
    ///
    /// This function doesn't sort regions, so two sets with the same content
    /// in a different order get different identifiers.
    ///
    /// # Returns
    /// String containing RegionSet identifier
    pub fn identifier(&self) -> String {
        let mut chrs = String::new();
        let mut starts = String::new();
        let mut ends = String::new();

        let mut first = true;
        for region in &self.regions {
            if !first {
                chrs.push(',');
                starts.push(',');
                ends.push(',');
            }
            chrs.push_str(region.chr());
            starts.push_str(&region.start().to_string());
            ends.push_str(&region.end().to_string());

            first = false;
        }

        let combined = format!(
            "{:x},{:x},{:x}",
            Md5::digest(chrs),
            Md5::digest(starts),
            Md5::digest(ends)
        );

        format!("{:x}", Md5::digest(combined))
    }

    ///
    /// Iterate unique chromosomes in order of first appearance
    ///
    pub fn iter_chroms(&self) -> impl Iterator<Item = &str> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.regions
            .iter()
            .map(|r| r.chr())
            .filter(move |chr| seen.insert(*chr))
    }

    ///
    /// Is regionSet empty?
    ///
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    ///
    /// Get number of regions in RegionSet
    ///
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    ///
    /// Get total nucleotide count
    ///
    pub fn nucleotides_length(&self) -> u64 {
        self.regions.iter().map(|r| u64::from(r.width())).sum()
    }

    ///
    /// Plain `(chr, start, end)` tuples, in set order.
    ///
    pub fn as_tuples(&self) -> Vec<(String, u32, u32)> {
        self.regions.iter().map(Region::as_tuple).collect()
    }
}

fn parse_bed_fields(parts: &[&str], source: &str, line_number: usize) -> Result<Region> {
    if parts.len() < 3 {
        return Err(RegionSetError::RegionParseError(format!(
            "{}:{}: expected at least 3 tab-separated columns, found {}",
            source,
            line_number,
            parts.len()
        )));
    }

    let parse_coordinate = |raw: &str, name: &str| -> Result<u32> {
        raw.trim().parse::<u32>().map_err(|_| {
            RegionSetError::RegionParseError(format!(
                "{}:{}: invalid {} position: {:?}",
                source, line_number, name, raw
            ))
        })
    };

    let start = parse_coordinate(parts[1], "start")?;
    let end = parse_coordinate(parts[2], "end")?;

    Region::new(parts[0].trim(), start, end)
}

impl TryFrom<&Path> for RegionSet {
    type Error = RegionSetError;

    ///
    /// Create a new [RegionSet] from a bed file (plain or gzipped).
    ///
    /// # Arguments:
    /// - value: path to bed file on disk.
    fn try_from(value: &Path) -> Result<Self> {
        if !value.is_file() {
            return Err(RegionSetError::FileReadError(value.display().to_string()));
        }

        let reader = get_dynamic_reader(value)?;
        let mut rs = RegionSet::from_bed_reader(reader, &value.display().to_string())?;
        rs.path = Some(value.to_owned());

        Ok(rs)
    }
}

impl TryFrom<&str> for RegionSet {
    type Error = RegionSetError;

    fn try_from(value: &str) -> Result<Self> {
        RegionSet::try_from(Path::new(value))
    }
}

impl TryFrom<PathBuf> for RegionSet {
    type Error = RegionSetError;

    fn try_from(value: PathBuf) -> Result<Self> {
        RegionSet::try_from(value.as_path())
    }
}

impl From<Vec<Region>> for RegionSet {
    fn from(regions: Vec<Region>) -> Self {
        RegionSet {
            regions,
            header: None,
            path: None,
        }
    }
}

impl<'a> Iterator for RegionSetIterator<'a> {
    type Item = &'a Region;

    fn next(&mut self) -> Option<Self::Item> {
        let region = self.region_set.regions.get(self.index)?;
        self.index += 1;
        Some(region)
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = RegionSetIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        RegionSetIterator {
            region_set: self,
            index: 0,
        }
    }
}

impl Display for RegionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionSet with {} regions.", self.len())
    }
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
    fn test_open_from_path() {
        let file_path = get_test_path("targets.bed");
        let rs = RegionSet::try_from(file_path.as_path()).unwrap();
        assert_eq!(rs.len(), 3);
        assert_eq!(rs.path.unwrap(), file_path);
    }

    #[rstest]
    fn test_open_from_string() {
        let file_path = get_test_path("targets.bed");
        assert!(RegionSet::try_from(file_path.to_str().unwrap()).is_ok());
    }

    #[rstest]
    fn test_open_missing_file() {
        let result = RegionSet::try_from(get_test_path("does_not_exist.bed"));
        assert!(matches!(result, Err(RegionSetError::FileReadError(_))));
    }

    #[rstest]
    fn test_keeps_file_order() {
        let rs = RegionSet::from_bed_str("chr2\t0\t10\nchr1\t5\t8\nchr1\t0\t3\n").unwrap();
        assert_eq!(
            rs.as_tuples(),
            vec![
                ("chr2".to_string(), 0, 10),
                ("chr1".to_string(), 5, 8),
                ("chr1".to_string(), 0, 3)
            ]
        );
        assert_eq!(rs.iter_chroms().collect::<Vec<_>>(), vec!["chr2", "chr1"]);
    }

    #[rstest]
    fn test_read_headers() {
        let rs = RegionSet::from_bed_str("track name=targets\nchr1\t0\t10\n").unwrap();
        assert_eq!(rs.header.as_deref(), Some("track name=targets"));
        assert_eq!(rs.len(), 1);
    }

    #[rstest]
    fn test_column_name_header() {
        let rs = RegionSet::from_bed_str("chrom\tstart\tend\nchr1\t0\t10\n").unwrap();
        assert_eq!(rs.header.as_deref(), Some("chrom\tstart\tend"));
        assert_eq!(rs.len(), 1);
    }

    #[rstest]
    fn test_extra_columns_ignored() {
        let rs = RegionSet::from_bed_str("chr1\t0\t10\tname\t0\t+\n").unwrap();
        assert_eq!(rs.as_tuples(), vec![("chr1".to_string(), 0, 10)]);
    }

    #[rstest]
    #[case("chr1\t10\t5\n")]
    #[case("chr1\t10\t10\n")]
    #[case("chr1\t0\t10\nchr1\tabc\t20\n")]
    #[case("chr1\t0\n")]
    fn test_malformed_lines_abort(#[case] text: &str) {
        assert!(RegionSet::from_bed_str(text).is_err());
    }

    #[rstest]
    fn test_empty_text_is_empty_set() {
        let rs = RegionSet::from_bed_str("\n\n").unwrap();
        assert!(rs.is_empty());
        assert_eq!(rs.nucleotides_length(), 0);
    }

    #[rstest]
    fn test_save_bed_roundtrip_keeps_identifier() {
        let rs = RegionSet::from_bed_str("chr1\t0\t400\nchr1\t700\t1000\n").unwrap();

        let tempdir = tempfile::tempdir().unwrap();
        let new_file_path = tempdir.path().join("nested").join("out.bed");

        rs.to_bed(&new_file_path).unwrap();

        let content = std::fs::read_to_string(&new_file_path).unwrap();
        assert_eq!(content, "chr1\t0\t400\nchr1\t700\t1000\n");

        let reread = RegionSet::try_from(new_file_path.as_path()).unwrap();
        assert_eq!(reread.identifier(), rs.identifier());
    }

    #[rstest]
    fn test_identifier_depends_on_order() {
        let a = RegionSet::from_bed_str("chr1\t0\t10\nchr1\t20\t30\n").unwrap();
        let b = RegionSet::from_bed_str("chr1\t20\t30\nchr1\t0\t10\n").unwrap();
        assert_ne!(a.identifier(), b.identifier());
    }

    #[rstest]
    fn test_total_nucleotides() {
        let rs = RegionSet::from_bed_str("chr1\t0\t400\nchr1\t700\t1000\n").unwrap();
        assert_eq!(rs.nucleotides_length(), 700);
        assert_eq!(rs.into_iter().count(), 2);
    }
}
