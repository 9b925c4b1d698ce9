use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::errors::{RegionSetError, Result};

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).map_err(|e| {
        RegionSetError::FileReadError(format!("{}: {}", path.display(), e))
    })?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{BufRead, Write};

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use rstest::*;

    #[rstest]
    fn test_reads_gzipped_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("regions.bed.gz");

        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"chr1\t0\t10\n").unwrap();
        encoder.finish().unwrap();

        let lines: Vec<String> = get_dynamic_reader(&path)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["chr1\t0\t10".to_string()]);
    }

    #[rstest]
    fn test_missing_file_is_read_error() {
        let result = get_dynamic_reader(Path::new("/definitely/not/here.bed"));
        assert!(matches!(result, Err(RegionSetError::FileReadError(_))));
    }
}
