//! Roll ZIP-level volumes up to counties through the primary table.
//!
//! Input is loosely formatted `zip,volume` data: ZIPs may have lost their
//! leading zeros and volumes may be blank or non-numeric. Short ZIPs are
//! zero-padded and unusable rows are dropped and counted.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::codes::{Fips, Zip};
use crate::error::{LookupError, Result};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZipVolume {
    pub zip: Zip,
    pub volume: f64,
}

/// Cleaned `zip,volume` rows.
#[derive(Debug, Clone, Default)]
pub struct VolumeTable {
    rows: Vec<ZipVolume>,
    dropped: usize,
}

impl VolumeTable {
    /// Clean raw `(zip, volume)` pairs, dropping rows whose ZIP cannot be
    /// padded to 5 digits or whose volume is not a finite number.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut table = Self::default();
        for (zip, volume) in pairs {
            match Zip::zero_padded(zip) {
                Ok(zip) if volume.is_finite() => table.rows.push(ZipVolume { zip, volume }),
                _ => table.dropped += 1,
            }
        }
        if table.dropped > 0 {
            tracing::warn!("Dropped {} volume rows with an invalid ZIP or volume", table.dropped);
        }
        table
    }

    /// Parse CSV text with `zip` and `volume` columns (any order, other
    /// columns ignored).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?;
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let (zip_col, volume_col) = match (column("zip"), column("volume")) {
            (Some(z), Some(v)) => (z, v),
            _ => {
                return Err(LookupError::format_at(
                    Some(1),
                    "data must contain 'zip' and 'volume' columns",
                ));
            }
        };

        let mut raw = Vec::new();
        for row in reader.records() {
            let row = row?;
            // Blank or non-numeric volumes become NaN and are dropped below.
            let volume = row
                .get(volume_col)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN);
            raw.push((row.get(zip_col).unwrap_or_default().to_string(), volume));
        }

        Ok(Self::from_pairs(raw.iter().map(|(z, v)| (z.as_str(), *v))))
    }

    pub fn rows(&self) -> &[ZipVolume] {
        &self.rows
    }

    /// Rows rejected while cleaning.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.volume).sum()
    }
}

impl FromIterator<ZipVolume> for VolumeTable {
    fn from_iter<T: IntoIterator<Item = ZipVolume>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
            dropped: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountyVolume {
    pub fips: Fips,
    pub volume: f64,
    /// Share of the mapped total, rounded to 2 decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountyVolumes {
    /// Ordered by volume descending, then FIPS ascending.
    pub counties: Vec<CountyVolume>,
    /// ZIPs absent from the primary table, in first-seen order.
    pub unmapped: Vec<Zip>,
    /// Sum of the county volumes.
    pub total_volume: f64,
    pub unmapped_volume: f64,
}

impl CountyVolumes {
    pub fn top(&self, n: usize) -> &[CountyVolume] {
        &self.counties[..n.min(self.counties.len())]
    }
}

/// Sum volumes per majority county.
pub fn rollup_by_county(volumes: &VolumeTable, primary: &Table) -> CountyVolumes {
    let mut by_county: BTreeMap<Fips, f64> = BTreeMap::new();
    let mut unmapped = Vec::new();
    let mut seen_unmapped = HashSet::new();
    let mut unmapped_volume = 0.0;

    for row in volumes.rows() {
        match primary.fips_for_zip(&row.zip) {
            Ok(fips) => *by_county.entry(fips).or_default() += row.volume,
            Err(_) => {
                unmapped_volume += row.volume;
                if seen_unmapped.insert(row.zip) {
                    unmapped.push(row.zip);
                }
            }
        }
    }

    if !unmapped.is_empty() {
        tracing::warn!(
            "{} ZIPs not in the {} table, {} volume left unassigned",
            unmapped.len(),
            primary.kind(),
            unmapped_volume
        );
    }

    let total_volume: f64 = by_county.values().sum();
    let mut counties: Vec<CountyVolume> = by_county
        .into_iter()
        .map(|(fips, volume)| CountyVolume {
            fips,
            volume,
            percentage: percentage(volume, total_volume),
        })
        .collect();
    counties.sort_by(|a, b| b.volume.total_cmp(&a.volume).then(a.fips.cmp(&b.fips)));

    CountyVolumes {
        counties,
        unmapped,
        total_volume,
        unmapped_volume,
    }
}

fn percentage(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        (part / total * 100.0 * 100.0).round() / 100.0
    } else {
        0.0
    }
}
