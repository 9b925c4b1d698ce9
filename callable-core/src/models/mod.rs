pub mod reference;
pub mod region;
pub mod region_set;

// re-export for cleaner imports
pub use self::reference::{Contig, ReferenceSpan};
pub use self::region::Region;
pub use self::region_set::RegionSet;
