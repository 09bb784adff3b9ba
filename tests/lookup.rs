use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use zip_fips::{Config, Dataset, Fips, LookupError, Table, TableKind, Zip};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn dataset() -> Dataset {
    Dataset::load(&Config::with_data_dir(fixtures())).unwrap()
}

#[test]
fn test_known_scenarios() {
    let data = dataset();

    assert_eq!(data.lookup_primary("10001").unwrap().as_str(), "36061");
    assert_eq!(
        data.lookup_all_fips("10001").unwrap(),
        vec!["36061".parse::<Fips>().unwrap()]
    );

    let zips = data.lookup_zips_by_fips("36061", TableKind::Primary).unwrap();
    assert!(zips.contains(&"10001".parse::<Zip>().unwrap()));
}

#[test]
fn test_unknown_zip_is_not_found_in_both_tables() {
    let data = dataset();
    assert!(matches!(
        data.lookup_primary("00000"),
        Err(LookupError::NotFound { .. })
    ));
    assert!(matches!(
        data.lookup_all_fips("00000"),
        Err(LookupError::NotFound { .. })
    ));
}

#[test]
fn test_every_primary_zip_has_one_county() {
    let data = dataset();
    for record in data.primary().records() {
        assert_eq!(data.primary().fips_for_zip(&record.zip).unwrap(), record.fips);
        assert_eq!(data.primary().all_fips_for_zip(&record.zip).unwrap().len(), 1);
    }
}

#[test]
fn test_primary_county_is_among_related_counties() {
    let data = dataset();
    for zip in data.all().zips() {
        let all = data.all().all_fips_for_zip(&zip).unwrap();
        assert!(!all.is_empty());
        if let Ok(primary) = data.primary().fips_for_zip(&zip) {
            assert!(all.contains(&primary), "{} -> {} not in {:?}", zip, primary, all);
        }
    }
}

#[test]
fn test_primary_zips_match_complete_zips() {
    let data = dataset();
    let primary: HashSet<Zip> = data.primary().zips().into_iter().collect();
    let all: HashSet<Zip> = data.all().zips().into_iter().collect();
    assert!(primary.is_subset(&all));
    assert_eq!(primary, all);
}

#[test]
fn test_complete_county_zips_are_superset() {
    let data = dataset();
    let counties: HashSet<Fips> = data.all().records().iter().map(|r| r.fips).collect();
    for fips in counties {
        let primary: HashSet<Zip> = data.primary().zips_for_fips(&fips).into_iter().collect();
        let all: HashSet<Zip> = data.all().zips_for_fips(&fips).into_iter().collect();
        assert!(primary.is_subset(&all), "{}", fips);
    }
}

#[test]
fn test_multi_county_zip() {
    let data = dataset();
    let all: Vec<String> = data
        .lookup_all_fips("57717")
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(all, ["30011", "46019", "56011"]);
    assert_eq!(data.lookup_primary("57717").unwrap().as_str(), "46019");
}

#[test]
fn test_leading_zeros_preserved() {
    let data = dataset();
    assert_eq!(data.lookup_primary("00601").unwrap().as_str(), "72001");
    assert_eq!(data.lookup_primary("90210").unwrap().as_str(), "06037");
    assert!(data.lookup_primary("601").unwrap_err().is_format());
}

#[test]
fn test_reserialize_matches_files() {
    for kind in [TableKind::Primary, TableKind::All] {
        let path = fixtures().join(kind.default_file_name());
        let original = fs::read_to_string(&path).unwrap();
        let table = Table::load(kind, &path).unwrap();

        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.trim_end_matches('\n'), original.trim_end_matches('\n'));
    }
}

#[test]
fn test_missing_data_dir() {
    let err = Dataset::load(&Config::with_data_dir(fixtures().join("missing"))).unwrap_err();
    match err {
        LookupError::FileAccess { path, .. } => {
            assert!(path.ends_with(TableKind::Primary.default_file_name()));
        }
        other => panic!("expected FileAccess, got {:?}", other),
    }
}
