/// Example HTTP client demonstrating how to call the lookup server API
///
/// Run the server first:
/// ```bash
/// ZIP_FIPS_DATA_DIR=tests/fixtures cargo run --bin server
/// ```
///
/// Then run this example:
/// ```bash
/// cargo run --example api_client
/// ```
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

#[derive(Deserialize, Debug)]
struct ZipData {
    zip: String,
    fips: String,
    state: Option<String>,
    county: String,
}

#[derive(Deserialize, Debug)]
struct ZipCountiesData {
    zip: String,
    fips: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct FipsZipsData {
    fips: String,
    table: String,
    zips: Vec<String>,
}

#[derive(Serialize)]
struct RollupRequest {
    records: Vec<RollupRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top: Option<usize>,
}

#[derive(Serialize)]
struct RollupRecord {
    zip: String,
    volume: f64,
}

#[derive(Deserialize, Debug)]
struct RollupData {
    counties: Vec<CountyVolume>,
    unmapped: Vec<String>,
    total_volume: f64,
}

#[derive(Deserialize, Debug)]
struct CountyVolume {
    fips: String,
    volume: f64,
    percentage: f64,
}

#[derive(Deserialize, Debug)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Deserialize, Debug)]
struct MetricsResponse {
    total_requests: u64,
    not_found: u64,
    uptime_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = reqwest::Client::new();

    println!("=== ZIP/FIPS HTTP API Client Demo ===\n");

    // 1. Health Check
    println!("1. Checking server health...");
    let health: HealthResponse = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("   Status: {} (version {})\n", health.status, health.version);

    // 2. Primary lookup
    println!("2. Majority county for 10001...");
    let zip: ApiResponse<ZipData> = client
        .get(format!("{}/api/zip/10001", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!(
        "   {} -> {} (state {}, county {})\n",
        zip.data.zip,
        zip.data.fips,
        zip.data.state.as_deref().unwrap_or("?"),
        zip.data.county
    );

    // 3. All counties for a ZIP spanning state lines
    println!("3. Every county for 57717...");
    let all: ApiResponse<ZipCountiesData> = client
        .get(format!("{}/api/zip/57717/all", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("   {} -> {:?}\n", all.data.zip, all.data.fips);

    // 4. ZIPs in a county
    println!("4. ZIP codes overlapping 36061...");
    let zips: ApiResponse<FipsZipsData> = client
        .get(format!("{}/api/fips/36061/zips?table=all", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!(
        "   {} ({} table): {:?}\n",
        zips.data.fips, zips.data.table, zips.data.zips
    );

    // 5. Volume roll-up
    println!("5. Rolling up ZIP volumes to counties...");
    let request = RollupRequest {
        records: vec![
            RollupRecord { zip: "10001".to_string(), volume: 1500.0 },
            RollupRecord { zip: "10002".to_string(), volume: 2300.0 },
            RollupRecord { zip: "90210".to_string(), volume: 3200.0 },
            RollupRecord { zip: "601".to_string(), volume: 400.0 },
        ],
        top: Some(3),
    };
    let rollup: ApiResponse<RollupData> = client
        .post(format!("{}/api/rollup", base_url))
        .json(&request)
        .send()
        .await?
        .json()
        .await?;
    println!("   success: {}, total {}", rollup.success, rollup.data.total_volume);
    for county in &rollup.data.counties {
        println!("   {} {:>8} {:>6.2}%", county.fips, county.volume, county.percentage);
    }
    if !rollup.data.unmapped.is_empty() {
        println!("   unmapped: {:?}", rollup.data.unmapped);
    }
    println!();

    // 6. Unknown ZIP
    println!("6. Looking up a ZIP that does not exist...");
    let response = client.get(format!("{}/api/zip/00000", base_url)).send().await?;
    println!("   HTTP {}\n", response.status());

    // 7. Metrics
    println!("7. Fetching server metrics...");
    let metrics: MetricsResponse = client
        .get(format!("{}/api/metrics", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!(
        "   {} requests, {} not found, up {}s",
        metrics.total_requests, metrics.not_found, metrics.uptime_seconds
    );

    Ok(())
}
