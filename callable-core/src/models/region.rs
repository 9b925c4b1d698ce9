use std::fmt::{self, Display};

use crate::errors::{RegionSetError, Result};

///
/// Region struct, one half-open `[start, end)` interval on a contig.
///
/// Coordinates are validated on construction and can't be changed afterwards.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, PartialOrd, Ord)]
pub struct Region {
    chr: String,
    start: u32,
    end: u32,
}

impl Region {
    ///
    /// Create a new region, rejecting zero-length and inverted coordinates.
    ///
    pub fn new(chr: impl Into<String>, start: u32, end: u32) -> Result<Self> {
        let chr = chr.into();
        if end <= start {
            return Err(RegionSetError::InvalidInterval { chr, start, end });
        }
        Ok(Region { chr, start, end })
    }

    ///
    /// Create a region when `[start, end)` is non-empty, `None` otherwise.
    ///
    /// Interval algebra produces candidate pieces that may collapse to nothing;
    /// this drops them without treating them as malformed input.
    ///
    pub fn non_empty(chr: &str, start: u32, end: u32) -> Option<Self> {
        (start < end).then(|| Region {
            chr: chr.to_string(),
            start,
            end,
        })
    }

    pub fn chr(&self) -> &str {
        &self.chr
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    ///
    /// Get length of the region
    ///
    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    ///
    /// Get BED line of Region
    ///
    pub fn as_string(&self) -> String {
        format!("{}\t{}\t{}", self.chr, self.start, self.end)
    }

    ///
    /// 1-based, inclusive `chr:start-end` locus string, as expected by
    /// command line tools taking a region restriction.
    ///
    pub fn to_locus(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start + 1, self.end)
    }

    pub fn as_tuple(&self) -> (String, u32, u32) {
        (self.chr.clone(), self.start, self.end)
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}
