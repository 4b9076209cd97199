pub mod bed_record;
pub mod chrom_sizes;
pub mod region;
pub mod region_set;

// re-export for cleaner imports
pub use self::bed_record::BedRecord;
pub use self::chrom_sizes::ChromSizes;
pub use self::region::{Orientation, Region};
pub use self::region_set::RegionSet;
