use std::env;
use std::path::PathBuf;

use crate::table::TableKind;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PORT: u16 = 3000;

/// Where the tables live and where the server listens.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub primary_file: String,
    pub all_file: String,
    pub port: u16,
}

impl Config {
    /// Read `ZIP_FIPS_DATA_DIR`, `ZIP_FIPS_PRIMARY_FILE`, `ZIP_FIPS_ALL_FILE`
    /// and `PORT`. Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `get`.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        Self {
            data_dir: non_empty("ZIP_FIPS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            primary_file: non_empty("ZIP_FIPS_PRIMARY_FILE")
                .unwrap_or_else(|| TableKind::Primary.default_file_name().to_string()),
            all_file: non_empty("ZIP_FIPS_ALL_FILE")
                .unwrap_or_else(|| TableKind::All.default_file_name().to_string()),
            port: get("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }

    /// Configuration reading both tables from `data_dir` under their
    /// default names.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn path_for(&self, kind: TableKind) -> PathBuf {
        match kind {
            TableKind::Primary => self.data_dir.join(&self.primary_file),
            TableKind::All => self.data_dir.join(&self.all_file),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
