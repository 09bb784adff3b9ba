/// Example showing library lookups against the bundled test tables
///
/// ```bash
/// cargo run --example lookup -- 10001
/// ```
use anyhow::Result;
use zip_fips::{Config, Dataset, TableKind, describe_county};

fn main() -> Result<()> {
    let zip = std::env::args().nth(1).unwrap_or_else(|| "10001".to_string());
    let config = Config::with_data_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures"));
    let dataset = Dataset::load(&config)?;

    let primary = dataset.lookup_primary(&zip)?;
    println!("{} -> {}", zip, describe_county(&primary, None));

    let all = dataset.lookup_all_fips(&zip)?;
    if all.len() > 1 {
        println!("  spans {} counties:", all.len());
        for fips in &all {
            println!("    {}", describe_county(fips, None));
        }
    }

    let neighbors = dataset.lookup_zips_by_fips(primary.as_str(), TableKind::All)?;
    println!("  {} ZIP codes overlap county {}", neighbors.len(), primary);

    Ok(())
}
