//! In-memory ZIP/FIPS tables loaded from the `ZIP,FIPS` CSV files.
//!
//! A table keeps the rows in file order and indexes them by ZIP and by FIPS.
//! Tables are immutable once loaded and can be shared freely across threads.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codes::{Fips, Zip};
use crate::error::{LookupError, Result};

const HEADER: [&str; 2] = ["ZIP", "FIPS"];

/// Which of the two published tables a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// One row per ZIP: the county holding the majority of its population.
    Primary,
    /// One row per (ZIP, county) pair with any population overlap.
    #[serde(alias = "complete")]
    All,
}

impl TableKind {
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Primary => "zip_to_fips_mapping.csv",
            Self::All => "zip_to_fips_mapping_all.csv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Some(Self::Primary),
            "all" | "complete" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::All => write!(f, "all"),
        }
    }
}

/// One table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub zip: Zip,
    pub fips: Fips,
}

#[derive(Debug, Clone)]
pub struct Table {
    kind: TableKind,
    records: Vec<Record>,
    by_zip: HashMap<Zip, Vec<usize>>,
    by_fips: HashMap<Fips, Vec<usize>>,
}

impl Table {
    /// Load a table from a CSV file.
    pub fn load(kind: TableKind, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LookupError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::from_reader(kind, file)?;
        tracing::info!(
            "Loaded {} table from {} ({} rows)",
            kind,
            path.display(),
            table.len()
        );
        Ok(table)
    }

    /// Parse a table from CSV text with a `ZIP,FIPS` header.
    ///
    /// Quotes are not special and blank lines between rows are rejected, so
    /// every accepted file re-serializes to itself. Either the whole input
    /// parses or an error is returned; there is no partially loaded table.
    pub fn from_reader<R: Read>(kind: TableKind, reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let headers = reader.headers()?;
        if headers.iter().ne(HEADER) {
            return Err(LookupError::format_at(
                Some(1),
                format!(
                    "expected header ZIP,FIPS, found {:?}",
                    headers.iter().collect::<Vec<_>>()
                ),
            ));
        }

        let mut rows = Vec::new();
        let mut last_line = 1;
        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line());
            if let Some(at) = line {
                // The reader skips empty lines; the file format has none.
                if at != last_line + 1 {
                    return Err(LookupError::format_at(
                        Some(last_line + 1),
                        "expected 2 fields, found an empty line",
                    ));
                }
                last_line = at;
            }
            if row.len() != 2 {
                return Err(LookupError::format_at(
                    line,
                    format!("expected 2 fields, found {}", row.len()),
                ));
            }
            let zip: Zip = row[0].parse().map_err(|e: LookupError| e.at_line(line))?;
            let fips: Fips = row[1].parse().map_err(|e: LookupError| e.at_line(line))?;
            rows.push((line, Record { zip, fips }));
        }

        Self::index(kind, rows)
    }

    /// Build a table from rows already in memory, enforcing the invariants
    /// of `kind`. Errors count lines as if the rows followed a header.
    pub fn from_records(kind: TableKind, records: Vec<Record>) -> Result<Self> {
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| (Some(idx as u64 + 2), record))
            .collect();
        Self::index(kind, rows)
    }

    fn index(kind: TableKind, rows: Vec<(Option<u64>, Record)>) -> Result<Self> {
        let mut by_zip: HashMap<Zip, Vec<usize>> = HashMap::new();
        let mut by_fips: HashMap<Fips, Vec<usize>> = HashMap::new();
        let mut records = Vec::with_capacity(rows.len());

        for (idx, (line, record)) in rows.into_iter().enumerate() {
            let zip_rows = by_zip.entry(record.zip).or_default();
            if kind == TableKind::Primary && !zip_rows.is_empty() {
                return Err(LookupError::format_at(
                    line,
                    format!("duplicate ZIP {} in primary table", record.zip),
                ));
            }
            zip_rows.push(idx);
            by_fips.entry(record.fips).or_default().push(idx);
            records.push(record);
        }

        tracing::debug!(
            "Indexed {} table: {} ZIPs, {} counties",
            kind,
            by_zip.len(),
            by_fips.len()
        );

        Ok(Self {
            kind,
            records,
            by_zip,
            by_fips,
        })
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// All rows in file order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_zip(&self, zip: &Zip) -> bool {
        self.by_zip.contains_key(zip)
    }

    /// Number of distinct ZIP codes.
    pub fn zip_count(&self) -> usize {
        self.by_zip.len()
    }

    /// Distinct ZIP codes, in order of first appearance.
    pub fn zips(&self) -> Vec<Zip> {
        let mut zips: Vec<(usize, Zip)> = self
            .by_zip
            .iter()
            .map(|(zip, rows)| (rows[0], *zip))
            .collect();
        zips.sort_unstable();
        zips.into_iter().map(|(_, zip)| zip).collect()
    }

    /// The county a ZIP maps to.
    ///
    /// On a primary table this is the majority-population county. On an
    /// `All` table it is the first related county in file order, which is
    /// not necessarily the majority one.
    pub fn fips_for_zip(&self, zip: &Zip) -> Result<Fips> {
        self.rows_for_zip(zip)
            .map(|rows| self.records[rows[0]].fips)
    }

    /// Every county a ZIP intersects, in file order. Never empty on success.
    pub fn all_fips_for_zip(&self, zip: &Zip) -> Result<Vec<Fips>> {
        self.rows_for_zip(zip)
            .map(|rows| rows.iter().map(|&idx| self.records[idx].fips).collect())
    }

    /// Every ZIP mapped to a county, in file order. An unknown county yields
    /// an empty list.
    pub fn zips_for_fips(&self, fips: &Fips) -> Vec<Zip> {
        self.by_fips
            .get(fips)
            .map(|rows| rows.iter().map(|&idx| self.records[idx].zip).collect())
            .unwrap_or_default()
    }

    /// Write the header and all rows back out as CSV, in file order.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(HEADER)?;
        for record in &self.records {
            writer.write_record([record.zip.as_str(), record.fips.as_str()])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    fn rows_for_zip(&self, zip: &Zip) -> Result<&[usize]> {
        self.by_zip
            .get(zip)
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::NotFound {
                what: "ZIP",
                key: zip.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY: &str = "ZIP,FIPS\n00601,72001\n10001,36061\n10002,36061\n57717,46019\n";
    const ALL: &str =
        "ZIP,FIPS\n00601,72001\n00601,72141\n10001,36061\n10002,36061\n57717,30011\n57717,46019\n57717,56011\n";

    fn zip(s: &str) -> Zip {
        s.parse().unwrap()
    }

    fn fips(s: &str) -> Fips {
        s.parse().unwrap()
    }

    #[test]
    fn test_primary_lookup() {
        let table = Table::from_reader(TableKind::Primary, PRIMARY.as_bytes()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.fips_for_zip(&zip("10001")).unwrap(), fips("36061"));
        assert_eq!(table.fips_for_zip(&zip("00601")).unwrap(), fips("72001"));
    }

    #[test]
    fn test_missing_zip_is_not_found() {
        let table = Table::from_reader(TableKind::Primary, PRIMARY.as_bytes()).unwrap();
        let err = table.fips_for_zip(&zip("00000")).unwrap_err();
        assert!(err.is_not_found());
        let err = table.all_fips_for_zip(&zip("00000")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_all_fips_in_file_order() {
        let table = Table::from_reader(TableKind::All, ALL.as_bytes()).unwrap();
        assert_eq!(
            table.all_fips_for_zip(&zip("57717")).unwrap(),
            vec![fips("30011"), fips("46019"), fips("56011")]
        );
        assert_eq!(table.all_fips_for_zip(&zip("10001")).unwrap(), vec![fips("36061")]);
        assert_eq!(table.zip_count(), 4);
        assert_eq!(
            table.zips(),
            vec![zip("00601"), zip("10001"), zip("10002"), zip("57717")]
        );
    }

    #[test]
    fn test_zips_for_fips() {
        let table = Table::from_reader(TableKind::Primary, PRIMARY.as_bytes()).unwrap();
        assert_eq!(
            table.zips_for_fips(&fips("36061")),
            vec![zip("10001"), zip("10002")]
        );
        assert!(table.zips_for_fips(&fips("99999")).is_empty());
    }

    #[test]
    fn test_duplicate_zip_rejected_in_primary() {
        let data = "ZIP,FIPS\n10001,36061\n00601,72001\n10001,36047\n";
        let err = Table::from_reader(TableKind::Primary, data.as_bytes()).unwrap_err();
        assert!(matches!(err, LookupError::Format { line: Some(4), .. }), "{}", err);

        // The same rows are a valid complete table.
        assert!(Table::from_reader(TableKind::All, data.as_bytes()).is_ok());
    }

    #[test]
    fn test_wrong_field_count() {
        let data = "ZIP,FIPS\n10001,36061\n10002,36061,extra\n";
        let err = Table::from_reader(TableKind::All, data.as_bytes()).unwrap_err();
        assert!(matches!(err, LookupError::Format { line: Some(3), .. }), "{}", err);

        let data = "ZIP,FIPS\n10001\n";
        let err = Table::from_reader(TableKind::All, data.as_bytes()).unwrap_err();
        assert!(matches!(err, LookupError::Format { line: Some(2), .. }), "{}", err);
    }

    #[test]
    fn test_blank_line_rejected() {
        let data = "ZIP,FIPS\n10001,36061\n\n10002,36061\n";
        let err = Table::from_reader(TableKind::All, data.as_bytes()).unwrap_err();
        assert!(matches!(err, LookupError::Format { line: Some(3), .. }), "{}", err);

        let data = "ZIP,FIPS\n\n10001,36061\n";
        let err = Table::from_reader(TableKind::All, data.as_bytes()).unwrap_err();
        assert!(matches!(err, LookupError::Format { line: Some(2), .. }), "{}", err);
    }

    #[test]
    fn test_quoted_field_rejected() {
        let data = "ZIP,FIPS\n\"10001\",36061\n";
        let err = Table::from_reader(TableKind::Primary, data.as_bytes()).unwrap_err();
        assert!(matches!(err, LookupError::Format { line: Some(2), .. }), "{}", err);
    }

    #[test]
    fn test_duplicate_reported_on_its_own_line() {
        let data = "ZIP,FIPS\n10001,36061\n00601,72001\n10002,36061\n10001,36047\n";
        let err = Table::from_reader(TableKind::Primary, data.as_bytes()).unwrap_err();
        assert!(matches!(err, LookupError::Format { line: Some(5), .. }), "{}", err);

        let records = vec![
            Record { zip: zip("10001"), fips: fips("36061") },
            Record { zip: zip("10001"), fips: fips("36047") },
        ];
        let err = Table::from_records(TableKind::Primary, records).unwrap_err();
        assert!(matches!(err, LookupError::Format { line: Some(3), .. }), "{}", err);
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let data: &[u8] = b"ZIP,FIPS\n\xff\xfe,36061\n";
        let err = Table::from_reader(TableKind::Primary, data).unwrap_err();
        assert!(matches!(err, LookupError::Csv(_)), "{}", err);
        assert!(err.is_format());
    }

    #[test]
    fn test_malformed_code() {
        // Leading zero dropped, as a spreadsheet would.
        let data = "ZIP,FIPS\n601,72001\n";
        let err = Table::from_reader(TableKind::Primary, data.as_bytes()).unwrap_err();
        assert!(matches!(err, LookupError::Format { line: Some(2), .. }), "{}", err);

        let data = "ZIP,FIPS\n00601,7200X\n";
        let err = Table::from_reader(TableKind::Primary, data.as_bytes()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_bad_header() {
        for data in ["zip,fips\n10001,36061\n", "ZIP,COUNTY\n", ""] {
            let err = Table::from_reader(TableKind::Primary, data.as_bytes()).unwrap_err();
            assert!(matches!(err, LookupError::Format { line: Some(1), .. }), "{:?}", data);
        }
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = Table::from_reader(TableKind::All, "ZIP,FIPS\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert!(table.zips().is_empty());
    }

    #[test]
    fn test_write_reproduces_input() {
        let table = Table::from_reader(TableKind::All, ALL.as_bytes()).unwrap();
        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ALL);
    }

    #[test]
    fn test_missing_file() {
        let err = Table::load(TableKind::Primary, "/nonexistent/zip_to_fips_mapping.csv").unwrap_err();
        assert!(matches!(err, LookupError::FileAccess { .. }));
    }

    #[test]
    fn test_table_kind_parse() {
        assert_eq!(TableKind::parse("Primary"), Some(TableKind::Primary));
        assert_eq!(TableKind::parse("all"), Some(TableKind::All));
        assert_eq!(TableKind::parse("complete"), Some(TableKind::All));
        assert_eq!(TableKind::parse("other"), None);
    }

    #[test]
    fn test_table_kind_serde() {
        let kind: TableKind = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(kind, TableKind::All);
        assert_eq!(serde_json::to_string(&TableKind::All).unwrap(), "\"all\"");
    }
}
