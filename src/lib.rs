pub mod codes;
pub mod config;
pub mod dataset;
pub mod error;
pub mod table;
pub mod volume;
pub mod zipcode;

pub use codes::{Fips, Zip};
pub use config::Config;
pub use dataset::Dataset;
pub use error::{LookupError, Result};
pub use table::{Record, Table, TableKind};
pub use volume::{CountyVolume, CountyVolumes, VolumeTable, ZipVolume, rollup_by_county};
pub use zipcode::{Place, describe_county, place_for_zip};
