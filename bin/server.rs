// OpenAuthCert Badge Registry - Query Server
// Read-only REST API over the current registry snapshot

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use badge_registry::{
    Badge, Facets, RegistryConfig, RegistryHandle, SearchParams, ValidationError,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    registry: RegistryHandle,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn failed(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

/// Reload response
#[derive(Serialize)]
struct ReloadResponse {
    badges: usize,
    fingerprint: String,
}

/// Validation summary for the current snapshot
#[derive(Serialize)]
struct ValidationResponse {
    checked: usize,
    fingerprint: String,
    errors: Vec<ValidationError>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/badges - Full corpus, newest first
async fn get_badges(State(state): State<AppState>) -> Json<ApiResponse<Vec<Badge>>> {
    let snapshot = state.registry.snapshot();
    Json(ApiResponse::ok(snapshot.all_badges()))
}

/// GET /api/search?q=&vendor=&app=&type=&status=&sort=
async fn search_badges(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<ApiResponse<Vec<Badge>>> {
    let snapshot = state.registry.snapshot();
    Json(ApiResponse::ok(snapshot.search(&params)))
}

/// GET /api/facets - Filter options present in the corpus
async fn get_facets(State(state): State<AppState>) -> Json<ApiResponse<Facets>> {
    let snapshot = state.registry.snapshot();
    Json(ApiResponse::ok(snapshot.facets()))
}

/// GET /api/badges/:vendor/:application/:version - One badge by slug parts
async fn get_badge(
    State(state): State<AppState>,
    Path((vendor, application, version)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let snapshot = state.registry.snapshot();
    let slug = badge_registry::make_slug(&vendor, &application, &version);

    match snapshot.get(&slug) {
        Some(badge) => (StatusCode::OK, Json(ApiResponse::ok(Some(badge.clone())))),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::failed(None, format!("No badge found for {}", slug))),
        ),
    }
}

/// GET /api/validation - Violations in the current snapshot
async fn get_validation(State(state): State<AppState>) -> Json<ApiResponse<ValidationResponse>> {
    let snapshot = state.registry.snapshot();
    Json(ApiResponse::ok(ValidationResponse {
        checked: snapshot.len(),
        fingerprint: snapshot.fingerprint(),
        errors: snapshot.validate(),
    }))
}

/// POST /api/reload - Rebuild from the store and swap atomically
async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    let handle = state.registry.clone();
    let result = tokio::task::spawn_blocking(move || handle.reload()).await;

    match result {
        Ok(Ok(snapshot)) => {
            info!(badges = snapshot.len(), "registry reloaded");
            (
                StatusCode::OK,
                Json(ApiResponse::ok(Some(ReloadResponse {
                    badges: snapshot.len(),
                    fingerprint: snapshot.fingerprint(),
                }))),
            )
        }
        Ok(Err(e)) => {
            warn!(error = %e, "reload rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::failed(None, e.to_string())),
            )
        }
        Err(e) => {
            error!(error = %e, "reload task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failed(None, "reload task failed")),
            )
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RegistryConfig::from_env();
    info!(registry = %config.registry_dir.display(), "starting badge registry server");

    let registry = RegistryHandle::open(&config.registry_dir).with_context(|| {
        format!(
            "failed to load badge registry from {}",
            config.registry_dir.display()
        )
    })?;

    let violations = registry.snapshot().validate();
    if !violations.is_empty() {
        warn!(count = violations.len(), "registry loaded with validation errors");
    }

    let state = AppState { registry };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/badges", get(get_badges))
        .route("/badges/:vendor/:application/:version", get(get_badge))
        .route("/search", get(search_badges))
        .route("/facets", get(get_facets))
        .route("/validation", get(get_validation))
        .route("/reload", post(reload))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
