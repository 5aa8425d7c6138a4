use crate::additives::KnowledgeBase;
use crate::camera::FrameStore;
use crate::config::Config;
use crate::engines::EngineRegistry;
use crate::error::ScanError;
use crate::live::{self, LiveText};
use crate::preprocessing::buffer::decode_frame;
use crate::preprocessing::{CropRegion, Pipeline};
use crate::scan::{run_blocking, CaptureReport, Scanner};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<Scanner>,
    pub frames: Arc<FrameStore>,
    pub live: watch::Receiver<LiveText>,
    pub config: Arc<Config>,
}

/// Capture / scan response
#[derive(Serialize)]
pub struct ScanResponse {
    #[serde(flatten)]
    pub report: CaptureReport,
    pub processing_time_ms: u64,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: String,
    pub language: String,
    pub preset: String,
    pub additive_count: usize,
    pub live_interval_ms: u64,
    pub max_file_size_bytes: usize,
}

/// Frame upload response
#[derive(Serialize)]
pub struct FrameResponse {
    pub width: u32,
    pub height: u32,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let registry = EngineRegistry::new(&config)?;
    let engine = registry.select(config.engine.as_deref(), &config.language)?;
    tracing::info!(
        "Using OCR engine {} ({}) for language {}",
        engine.name(),
        engine.description(),
        config.language
    );

    let knowledge = match KnowledgeBase::load(&config.additives_path) {
        Ok(knowledge) => {
            tracing::info!("Loaded {} additives", knowledge.len());
            knowledge
        }
        Err(e) => {
            tracing::warn!("{}; continuing with an empty additive list", e);
            KnowledgeBase::default()
        }
    };

    let pipeline = Pipeline::new(
        config.preset,
        config
            .preset
            .config(config.threshold, config.contrast_factor),
    );
    tracing::info!("Preprocessing preset: {}", config.preset);

    let scanner = Arc::new(Scanner::new(
        pipeline,
        engine,
        knowledge,
        config.language.clone(),
    ));
    let frames = Arc::new(FrameStore::new());
    let (live, _live_task) = live::spawn(scanner.clone(), frames.clone(), config.live_interval);

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        scanner,
        frames,
        live,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Routes over an assembled state
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/frame", post(handle_frame))
        .route("/region", put(handle_region))
        .route("/live", get(handle_live))
        .route("/capture", post(handle_capture))
        .route("/scan", post(handle_scan))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fields of a multipart image upload
struct Upload {
    file: Bytes,
    region: Option<CropRegion>,
}

async fn read_upload(mut multipart: Multipart, max_file_size: usize) -> Result<Upload, ScanError> {
    let mut file_data: Option<Bytes> = None;
    let mut region: Option<CropRegion> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ScanError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                file_data = Some(field.bytes().await.map_err(|e| {
                    ScanError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "region" => {
                let text = field.text().await.map_err(|e| {
                    ScanError::InvalidRequest(format!("Invalid region: {}", e))
                })?;
                region = Some(serde_json::from_str(&text).map_err(|e| {
                    ScanError::InvalidRequest(format!("Invalid region: {}", e))
                })?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let file = file_data.ok_or(ScanError::MissingFile)?;
    if file.len() > max_file_size {
        return Err(ScanError::ImageTooLarge {
            size: file.len(),
            max: max_file_size,
        });
    }

    Ok(Upload { file, region })
}

/// Store a camera frame
async fn handle_frame(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FrameResponse>, ScanError> {
    let Upload { file, region } = read_upload(multipart, state.config.max_file_size).await?;
    let frame = run_blocking(move || decode_frame(&file)).await?;
    let (width, height) = frame.dimensions();

    state.frames.set_frame(frame).await;
    if let Some(region) = region {
        state.frames.set_region(region).await;
    }

    Ok(Json(FrameResponse { width, height }))
}

/// Move or resize the crop region
async fn handle_region(
    State(state): State<AppState>,
    Json(region): Json<CropRegion>,
) -> Json<CropRegion> {
    Json(state.frames.set_region(region).await)
}

/// Latest live-preview text
async fn handle_live(State(state): State<AppState>) -> Json<LiveText> {
    Json(state.live.borrow().clone())
}

/// Authoritative read of the stored frame
async fn handle_capture(State(state): State<AppState>) -> Result<Json<ScanResponse>, ScanError> {
    let start = Instant::now();
    let snapshot = state.frames.snapshot().await?;
    let scanner = state.scanner.clone();

    let report = run_blocking(move || scanner.capture(&snapshot.frame, &snapshot.region))
        .await
        .inspect_err(|e| tracing::warn!("Capture failed: {}", e))?;

    Ok(Json(ScanResponse {
        report,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Capture on an uploaded still, leaving the stored frame alone
async fn handle_scan(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScanResponse>, ScanError> {
    let start = Instant::now();
    let upload = read_upload(multipart, state.config.max_file_size).await?;
    let scanner = state.scanner.clone();

    let report = run_blocking(move || {
        let frame = decode_frame(&upload.file)?;
        let region = upload
            .region
            .map(|r| r.clamped())
            .unwrap_or_else(|| CropRegion::full(frame.width(), frame.height()));
        scanner.capture(&frame, &region)
    })
    .await?;

    tracing::info!(
        "Scan completed in {}ms, text length: {}",
        start.elapsed().as_millis(),
        report.text.len()
    );

    Ok(Json(ScanResponse {
        report,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.scanner.engine_name().to_string(),
        language: state.scanner.language().to_string(),
        preset: state.scanner.pipeline().preset().as_str().to_string(),
        additive_count: state.scanner.knowledge().len(),
        live_interval_ms: state.config.live_interval.as_millis() as u64,
        max_file_size_bytes: state.config.max_file_size,
    })
}
