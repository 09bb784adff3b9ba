//! Both tables loaded side by side, with string-level lookups.

use crate::codes::{Fips, Zip};
use crate::config::Config;
use crate::error::{LookupError, Result};
use crate::table::{Table, TableKind};

/// The primary and complete tables, loaded from one data directory.
#[derive(Debug, Clone)]
pub struct Dataset {
    primary: Table,
    all: Table,
}

impl Dataset {
    /// Load both tables from the paths named by `config`.
    pub fn load(config: &Config) -> Result<Self> {
        let primary = Table::load(TableKind::Primary, config.path_for(TableKind::Primary))?;
        let all = Table::load(TableKind::All, config.path_for(TableKind::All))?;
        Self::new(primary, all)
    }

    /// Pair two loaded tables. Fails if either table has the wrong kind.
    pub fn new(primary: Table, all: Table) -> Result<Self> {
        if primary.kind() != TableKind::Primary || all.kind() != TableKind::All {
            return Err(LookupError::format(format!(
                "expected primary and all tables, got {} and {}",
                primary.kind(),
                all.kind()
            )));
        }

        let orphans = primary
            .records()
            .iter()
            .filter(|r| !all.contains_zip(&r.zip))
            .count();
        if orphans > 0 {
            tracing::warn!(
                "{} primary ZIPs have no row in the complete table",
                orphans
            );
        }

        Ok(Self { primary, all })
    }

    pub fn primary(&self) -> &Table {
        &self.primary
    }

    pub fn all(&self) -> &Table {
        &self.all
    }

    pub fn table(&self, kind: TableKind) -> &Table {
        match kind {
            TableKind::Primary => &self.primary,
            TableKind::All => &self.all,
        }
    }

    /// Majority county for a 5-digit ZIP.
    pub fn lookup_primary(&self, zip: &str) -> Result<Fips> {
        let zip: Zip = zip.parse()?;
        self.primary.fips_for_zip(&zip)
    }

    /// Every county a 5-digit ZIP intersects, from the complete table.
    pub fn lookup_all_fips(&self, zip: &str) -> Result<Vec<Fips>> {
        let zip: Zip = zip.parse()?;
        self.all.all_fips_for_zip(&zip)
    }

    /// ZIPs mapped to a 5-digit county code in the chosen table.
    pub fn lookup_zips_by_fips(&self, fips: &str, kind: TableKind) -> Result<Vec<Zip>> {
        let fips: Fips = fips.parse()?;
        Ok(self.table(kind).zips_for_fips(&fips))
    }
}
