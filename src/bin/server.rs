use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zip_fips::{
    Config, CountyVolume, Dataset, Fips, LookupError, Place, TableKind, VolumeTable, Zip,
    place_for_zip, rollup_by_county,
};

/// Application state shared across all requests
#[derive(Clone)]
struct AppState {
    dataset: Arc<Dataset>,
    metrics: Arc<Metrics>,
}

/// Server metrics
struct Metrics {
    total_requests: AtomicU64,
    requests_in_flight: AtomicU64,
    not_found: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    /// Count a request and keep it in flight until the guard drops.
    fn begin(&self) -> RequestGuard<'_> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.requests_in_flight.fetch_add(1, Ordering::Relaxed);
        RequestGuard(&self.requests_in_flight)
    }
}

/// RAII guard for tracking in-flight requests
struct RequestGuard<'a>(&'a AtomicU64);

impl<'a> Drop for RequestGuard<'a> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,zip_fips=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Loading tables from {}...", config.data_dir.display());
    let dataset = Arc::new(
        Dataset::load(&config)
            .with_context(|| format!("Failed to load tables from {}", config.data_dir.display()))?,
    );
    tracing::info!(
        "Loaded {} primary and {} complete rows",
        dataset.primary().len(),
        dataset.all().len()
    );

    let app = build_app(dataset);

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Build the Axum application with routes and middleware
fn build_app(dataset: Arc<Dataset>) -> Router {
    let metrics = Arc::new(Metrics {
        total_requests: AtomicU64::new(0),
        requests_in_flight: AtomicU64::new(0),
        not_found: AtomicU64::new(0),
        start_time: Instant::now(),
    });

    let state = AppState { dataset, metrics };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/zip/:zip", get(zip_primary))
        .route("/api/zip/:zip/all", get(zip_all))
        .route("/api/fips/:fips/zips", get(fips_zips))
        .route("/api/rollup", post(rollup))
        .route("/api/metrics", get(get_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Majority county for a ZIP code
async fn zip_primary(
    State(state): State<AppState>,
    Path(zip): Path<String>,
) -> Result<Json<ApiResponse<ZipData>>, ApiError> {
    let _guard = state.metrics.begin();

    let zip: Zip = zip.parse()?;
    let fips = state
        .dataset
        .primary()
        .fips_for_zip(&zip)
        .map_err(|e| state.count_error(e))?;

    tracing::debug!("Resolved {} to {}", zip, fips);

    Ok(ApiResponse::ok(ZipData {
        zip,
        state: fips.state_abbr(),
        county: fips.county().to_string(),
        place: place_for_zip(&zip),
        fips,
    }))
}

#[derive(Serialize)]
struct ZipData {
    zip: Zip,
    fips: Fips,
    state: Option<&'static str>,
    county: String,
    place: Option<Place>,
}

/// Every county a ZIP code intersects
async fn zip_all(
    State(state): State<AppState>,
    Path(zip): Path<String>,
) -> Result<Json<ApiResponse<ZipCountiesData>>, ApiError> {
    let _guard = state.metrics.begin();

    let zip: Zip = zip.parse()?;
    let fips = state
        .dataset
        .all()
        .all_fips_for_zip(&zip)
        .map_err(|e| state.count_error(e))?;

    Ok(ApiResponse::ok(ZipCountiesData { zip, fips }))
}

#[derive(Serialize)]
struct ZipCountiesData {
    zip: Zip,
    fips: Vec<Fips>,
}

#[derive(Deserialize)]
struct FipsQuery {
    #[serde(default)]
    table: Option<TableKind>,
}

/// ZIP codes mapped to a county
async fn fips_zips(
    State(state): State<AppState>,
    Path(fips): Path<String>,
    query: Result<Query<FipsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<FipsZipsData>>, ApiError> {
    let _guard = state.metrics.begin();

    let Query(query) = query?;
    let fips: Fips = fips.parse()?;
    let table = query.table.unwrap_or(TableKind::Primary);
    let zips = state.dataset.table(table).zips_for_fips(&fips);

    Ok(ApiResponse::ok(FipsZipsData { fips, table, zips }))
}

#[derive(Serialize)]
struct FipsZipsData {
    fips: Fips,
    table: TableKind,
    zips: Vec<Zip>,
}

#[derive(Deserialize)]
struct RollupRequest {
    records: Vec<RollupRecord>,
    #[serde(default)]
    top: Option<usize>,
}

#[derive(Deserialize)]
struct RollupRecord {
    zip: String,
    volume: f64,
}

#[derive(Serialize)]
struct RollupData {
    counties: Vec<CountyVolume>,
    unmapped: Vec<Zip>,
    total_volume: f64,
    unmapped_volume: f64,
    dropped: usize,
}

/// Aggregate ZIP volumes to majority counties
async fn rollup(
    State(state): State<AppState>,
    request: Result<Json<RollupRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RollupData>>, ApiError> {
    let _guard = state.metrics.begin();

    let Json(request) = request?;
    if request.records.is_empty() {
        return Err(ApiError::BadRequest("records cannot be empty".to_string()));
    }

    tracing::info!("Rolling up {} ZIP volumes", request.records.len());

    let volumes = VolumeTable::from_pairs(
        request
            .records
            .iter()
            .map(|r| (r.zip.as_str(), r.volume)),
    );
    let result = rollup_by_county(&volumes, state.dataset.primary());

    let counties = match request.top {
        Some(n) => result.top(n).to_vec(),
        None => result.counties,
    };

    Ok(ApiResponse::ok(RollupData {
        counties,
        unmapped: result.unmapped,
        total_volume: result.total_volume,
        unmapped_volume: result.unmapped_volume,
        dropped: volumes.dropped(),
    }))
}

/// Get server metrics
async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_requests: state.metrics.total_requests.load(Ordering::Relaxed),
        requests_in_flight: state.metrics.requests_in_flight.load(Ordering::Relaxed),
        not_found: state.metrics.not_found.load(Ordering::Relaxed),
        uptime_seconds: state.metrics.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    not_found: u64,
    uptime_seconds: u64,
}

impl AppState {
    fn count_error(&self, err: LookupError) -> LookupError {
        if err.is_not_found() {
            self.metrics.not_found.fetch_add(1, Ordering::Relaxed);
        }
        err
    }
}

/// API error types
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalError(String),
    /// An extractor rejected the request; keeps axum's status code.
    Rejected(StatusCode, String),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_format() {
            ApiError::BadRequest(err.to_string())
        } else {
            tracing::error!("Lookup error: {}", err);
            ApiError::InternalError(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Rejected(status, msg) => (status, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
