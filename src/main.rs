//! # clogue
//!
//! A local viewer for Claude conversation transcripts.
//!
//! The server exposes the JSONL transcript store (`~/.claude/projects/`) as a
//! small JSON API and serves the static page that renders it. Project
//! directories carry encoded names (`-home-dev-my-app`); listing them runs
//! the path decoder in [`decode`] to recover the real paths for display.
//!
//! ## API Endpoints
//!
//! - `GET /health` - Server health check
//! - `GET /api/projects` - List projects with reconstructed paths
//! - `GET /api/projects/{project}/conversations` - List conversations
//!   (`?includeWarmup=true` to include warmup noise)
//! - `GET /api/projects/{project}/conversations/{id}` - Messages of one
//!   conversation

mod decode;
mod transcripts;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::{fs, net::SocketAddr, path::PathBuf, sync::Arc, time::Instant};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::decode::{reconstruct, FsOracle};
use crate::transcripts::{ConversationSummary, MessageRecord};

// ============================================================================
// App State
// ============================================================================

/// Shared across all HTTP handlers. The transcript store is read-only and
/// nothing is cached: every request reads the filesystem fresh.
struct AppState {
    start_time: Instant,
    /// Root of the transcript store (one encoded directory per project).
    projects_dir: PathBuf,
    /// The process owner's home directory, for the decoder's dotted-username
    /// special case.
    home_dir: String,
}

// ============================================================================
// Error Responses
// ============================================================================

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn internal_error(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("{} not found", what),
        }),
    )
}

/// Project and conversation identifiers name entries inside the store, never
/// paths. Reject anything that could climb out of it.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

// ============================================================================
// Health Endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    version: &'static str,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Project Endpoints
// ============================================================================

/// A project directory in the transcript store, with its decoded path.
#[derive(Serialize)]
struct Project {
    /// Encoded directory name, used as the API identifier.
    name: String,
    #[serde(rename = "fullPath")]
    full_path: String,
    components: Vec<String>,
    /// Last path component, for the sidebar heading.
    #[serde(rename = "projectName")]
    project_name: String,
    /// Everything before the last component, for the dimmed subline.
    #[serde(rename = "parentPath")]
    parent_path: String,
}

async fn list_projects(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Project>>, ApiError> {
    let entries = fs::read_dir(&state.projects_dir).map_err(|e| {
        tracing::warn!(
            "Cannot read transcript store {}: {}",
            state.projects_dir.display(),
            e
        );
        internal_error(e)
    })?;

    let mut projects = Vec::new();
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };

        // Fresh reconstruction per request; the store changes rarely and
        // listings are infrequent, so the probes stay cheap.
        let rec = reconstruct(&name, &state.home_dir, &FsOracle);
        let (parent_path, project_name) = split_display_path(&rec.components);
        projects.push(Project {
            name,
            full_path: rec.full_path,
            components: rec.components,
            project_name,
            parent_path,
        });
    }

    projects.sort_by(|a, b| a.full_path.cmp(&b.full_path));

    Ok(Json(projects))
}

/// Split decoded components into (parent path, leaf name) for display.
fn split_display_path(components: &[String]) -> (String, String) {
    match components {
        [] => (String::new(), "/".to_string()),
        [only] if only == "/" => (String::new(), "/".to_string()),
        [only] => ("/".to_string(), only.clone()),
        [parents @ .., leaf] => (format!("/{}", parents.join("/")), leaf.clone()),
    }
}

// ============================================================================
// Conversation Endpoints
// ============================================================================

#[derive(Deserialize, Default)]
struct ConversationsQuery {
    #[serde(rename = "includeWarmup", default)]
    include_warmup: bool,
}

async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
    Query(query): Query<ConversationsQuery>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    if !is_safe_name(&project) {
        return Err(not_found("project"));
    }
    let project_dir = state.projects_dir.join(&project);
    if !project_dir.is_dir() {
        return Err(not_found("project"));
    }

    let conversations = transcripts::list_conversations(&project_dir, query.include_warmup)
        .map_err(internal_error)?;
    Ok(Json(conversations))
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path((project, conversation_id)): Path<(String, String)>,
) -> Result<Json<Vec<MessageRecord>>, ApiError> {
    if !is_safe_name(&project) || !is_safe_name(&conversation_id) {
        return Err(not_found("conversation"));
    }
    let path = state
        .projects_dir
        .join(&project)
        .join(format!("{}.jsonl", conversation_id));
    if !path.is_file() {
        return Err(not_found("conversation"));
    }

    let messages = transcripts::read_conversation(&path).map_err(internal_error)?;
    Ok(Json(messages))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clogue=info".parse().unwrap())
                .add_directive("tower_http=info".parse().unwrap()),
        )
        .init();

    let home = std::env::var("HOME").unwrap_or_else(|_| "/home/user".to_string());
    let projects_dir = std::env::var("CLOGUE_PROJECTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(&home).join(".claude").join("projects"));

    let state = Arc::new(AppState {
        start_time: Instant::now(),
        projects_dir: projects_dir.clone(),
        home_dir: home,
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/projects", get(list_projects))
        .route(
            "/api/projects/{project}/conversations",
            get(list_conversations),
        )
        .route(
            "/api/projects/{project}/conversations/{conversation_id}",
            get(get_conversation),
        )
        .layer(CorsLayer::permissive())
        .fallback_service(ServeDir::new("static").append_index_html_on_directories(true))
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("clogue v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);
    tracing::info!("Exploring transcripts from {}", projects_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
