use std::env;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zip_fips::{Config, Dataset, TableKind, Zip, describe_county};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zip_fips=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        usage(&args[0]);
    }
    // Codes are passed through as typed; lookups reject anything malformed.
    let (command, code) = (args[1].as_str(), args[2].as_str());
    if !matches!(command, "zip" | "all" | "fips" | "fips-all") {
        eprintln!("Unknown command: {}", command);
        usage(&args[0]);
    }

    let config = Config::from_env();
    let dataset = Dataset::load(&config).with_context(|| {
        format!(
            "Failed to load tables from {} (set ZIP_FIPS_DATA_DIR)",
            config.data_dir.display()
        )
    })?;

    for line in run(&dataset, command, code)? {
        println!("{}", line);
    }

    Ok(())
}

/// Run one lookup command and return the lines to print.
fn run(dataset: &Dataset, command: &str, code: &str) -> Result<Vec<String>> {
    let lines = match command {
        "zip" => {
            let fips = dataset
                .lookup_primary(code)
                .with_context(|| format!("Primary lookup failed for {}", code))?;
            let zip: Zip = code.parse()?;
            vec![describe_county(&fips, Some(&zip))]
        }
        "all" => dataset
            .lookup_all_fips(code)
            .with_context(|| format!("Complete lookup failed for {}", code))?
            .iter()
            .map(|fips| describe_county(fips, None))
            .collect(),
        "fips" | "fips-all" => {
            let kind = if command == "fips" {
                TableKind::Primary
            } else {
                TableKind::All
            };
            let zips = dataset
                .lookup_zips_by_fips(code, kind)
                .with_context(|| format!("County lookup failed for {}", code))?;
            if zips.is_empty() {
                eprintln!("No ZIP codes map to {} in the {} table", code, kind);
            }
            zips.iter().map(Zip::to_string).collect()
        }
        _ => anyhow::bail!("Unknown command: {}", command),
    };
    Ok(lines)
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <command> <code>", program);
    eprintln!("  zip <ZIP>        majority county for a ZIP code");
    eprintln!("  all <ZIP>        every county a ZIP code intersects");
    eprintln!("  fips <FIPS>      ZIP codes whose majority county is FIPS");
    eprintln!("  fips-all <FIPS>  ZIP codes overlapping county FIPS");
    eprintln!("Tables are read from $ZIP_FIPS_DATA_DIR (default: data)");
    std::process::exit(1);
}
