use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegionSetError {
    #[error("Invalid interval {chr}:{start}-{end}: end must be greater than start")]
    InvalidInterval { chr: String, start: u32, end: u32 },

    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Error parsing region: {0}")]
    RegionParseError(String),

    #[error("No sequence dictionary or fasta index found for reference: {0}")]
    ReferenceNotFound(PathBuf),

    #[error("Reference declares no contigs: {0}")]
    EmptyReference(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RegionSetError>;
