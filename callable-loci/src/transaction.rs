//! Atomic output writes and the existence-keyed output cache.
//!
//! Every file this crate produces is written under a private temporary
//! directory next to its final path and renamed into place only once the
//! producer succeeded. A final path therefore either holds a complete result
//! or does not exist, which is what makes "skip if the output exists" safe.

use std::fs;
use std::path::Path;

use tracing::debug;

use callable_core::models::RegionSet;

use crate::errors::{CallableError, Result};

/// How a cached output was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    /// The final file already existed; nothing was run.
    Cached,
    /// The producer ran and its output was renamed into place.
    Written,
}

///
/// A completed output exists at `path`.
///
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

///
/// Run `produce` against a temporary path and move its result to `out_file`.
///
/// The temporary path lives in a fresh directory beside `out_file` and keeps
/// its file name, so tools that look at extensions behave the same. If
/// `produce` fails, or returns without creating the file, the temporary
/// directory is removed and `out_file` is left untouched.
///
pub fn file_transaction<T, F>(out_file: &Path, produce: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let file_name = out_file.file_name().ok_or_else(|| {
        CallableError::MissingInput(format!("output path has no file name: {}", out_file.display()))
    })?;
    let parent = match out_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let tx_dir = tempfile::Builder::new()
        .prefix(".tx-")
        .tempdir_in(parent)?;
    let tx_file = tx_dir.path().join(file_name);

    let value = produce(&tx_file)?;

    if !tx_file.is_file() {
        return Err(CallableError::MissingOutput(out_file.to_owned()));
    }
    fs::rename(&tx_file, out_file)?;

    Ok(value)
}

///
/// Return immediately when `out_file` exists, otherwise produce it inside a
/// [file_transaction].
///
pub fn cached_output<F>(out_file: &Path, produce: F) -> Result<OutputStatus>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if file_exists(out_file) {
        debug!(output = %out_file.display(), "output exists, skipping");
        return Ok(OutputStatus::Cached);
    }

    file_transaction(out_file, produce)?;
    Ok(OutputStatus::Written)
}

///
/// Write a region set as BED unless `out_file` already holds exactly that
/// content. Returns `true` when the file was (re)written.
///
pub fn write_regions_if_changed(regions: &RegionSet, out_file: &Path) -> Result<bool> {
    let mut content: Vec<u8> = Vec::new();
    regions.write_bed(&mut content)?;

    if file_exists(out_file) && fs::read(out_file)? == content {
        debug!(output = %out_file.display(), "regions unchanged, keeping file");
        return Ok(false);
    }

    file_transaction(out_file, |tx_file| Ok(fs::write(tx_file, &content)?))?;
    Ok(true)
}
