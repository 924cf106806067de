//! HTTP server for resolver endpoints

use crate::error::Result;
use crate::sources::Sources;
use crate::types::{CleanedName, HealthResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use bis_core::clean_scientific_name;
use chrono::{DateTime, Utc};
use sciencebase_client::{BrowseCategory, SystemType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state for the HTTP server
pub struct ServerState {
    pub sources: Sources,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(sources: Sources) -> Self {
        Self {
            sources,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

/// Scientific name with an optional label for where it came from
#[derive(Deserialize)]
pub struct NameQuery {
    name: String,
    #[serde(default)]
    source: Option<String>,
}

/// ITIS TSN or scientific name
#[derive(Deserialize)]
pub struct TessQuery {
    q: String,
}

#[derive(Deserialize)]
pub struct EcosQuery {
    url: String,
}

#[derive(Deserialize)]
pub struct XddQuery {
    term: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQuery {
    #[serde(default)]
    system_type: Option<String>,
    #[serde(default)]
    browse_category: Option<String>,
    #[serde(default)]
    q: Option<String>,
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/clean-name", get(clean_name))
        .route("/itis", get(itis))
        .route("/worms", get(worms))
        .route("/gbif", get(gbif))
        .route("/natureserve", get(natureserve))
        .route("/tess", get(tess))
        .route("/ecos", get(ecos))
        .route("/iucn", get(iucn))
        .route("/sgcn", get(sgcn))
        .route("/xdd", get(xdd))
        .route("/gap", get(gap))
        .route("/sciencebase/snapshot", get(snapshot))
        .route("/species", get(species))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Turn a source lookup into a JSON response
fn envelope_response<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Lookup failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed")
        }
    }
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: state.sources.cache_stats(),
    })
}

async fn clean_name(Query(params): Query<NameQuery>) -> Json<CleanedName> {
    Json(CleanedName {
        cleaned_name: clean_scientific_name(&params.name),
        name: params.name,
    })
}

async fn itis(State(state): State<SharedState>, Query(params): Query<NameQuery>) -> Response {
    envelope_response(state.sources.itis(&params.name).await)
}

async fn worms(State(state): State<SharedState>, Query(params): Query<NameQuery>) -> Response {
    envelope_response(state.sources.worms(&params.name).await)
}

async fn gbif(State(state): State<SharedState>, Query(params): Query<NameQuery>) -> Response {
    envelope_response(
        state
            .sources
            .gbif(&params.name, params.source.as_deref())
            .await,
    )
}

async fn natureserve(
    State(state): State<SharedState>,
    Query(params): Query<NameQuery>,
) -> Response {
    envelope_response(state.sources.natureserve(&params.name).await)
}

async fn tess(State(state): State<SharedState>, Query(params): Query<TessQuery>) -> Response {
    envelope_response(state.sources.tess(&params.q).await)
}

async fn ecos(State(state): State<SharedState>, Query(params): Query<EcosQuery>) -> Response {
    if let Err(e) = state.sources.check_ecos_url(&params.url) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    envelope_response(state.sources.ecos(&params.url).await)
}

async fn iucn(State(state): State<SharedState>, Query(params): Query<NameQuery>) -> Response {
    envelope_response(state.sources.iucn(&params.name).await)
}

async fn sgcn(State(state): State<SharedState>, Query(params): Query<NameQuery>) -> Response {
    envelope_response(
        state
            .sources
            .sgcn(&params.name, params.source.as_deref())
            .await,
    )
}

async fn xdd(State(state): State<SharedState>, Query(params): Query<XddQuery>) -> Response {
    envelope_response(state.sources.xdd(&params.term).await)
}

async fn gap(State(state): State<SharedState>, Query(params): Query<NameQuery>) -> Response {
    envelope_response(
        state
            .sources
            .gap(&params.name, params.source.as_deref())
            .await,
    )
}

async fn snapshot(
    State(state): State<SharedState>,
    Query(params): Query<SnapshotQuery>,
) -> Response {
    let system_type = match params.system_type.as_deref().map(str::parse::<SystemType>) {
        Some(Err(e)) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        parsed => parsed.and_then(|r| r.ok()),
    };
    let browse_category = match params
        .browse_category
        .as_deref()
        .map(str::parse::<BrowseCategory>)
    {
        Some(Err(e)) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        parsed => parsed.and_then(|r| r.ok()),
    };

    envelope_response(
        state
            .sources
            .snapshot(system_type, browse_category, params.q.as_deref())
            .await,
    )
}

/// Clean a name and look it up in every name-based source
async fn species(State(state): State<SharedState>, Query(params): Query<NameQuery>) -> Response {
    let Some(cleaned_name) = clean_scientific_name(&params.name) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("No usable scientific name in \"{}\"", params.name),
        );
    };
    envelope_response(state.sources.species(&params.name, &cleaned_name).await)
}
