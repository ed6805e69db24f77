//! Encyclopedia service routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use common::{
    http::{ApiError, ApiResult, JsonBody, WithRejection},
    validation::required_text,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    search::{SearchOutcome, search},
    state::AppState,
    storage::{StorageError, validate_title},
};

const TITLE_MAX_CHARS: usize = 200;

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidTitle(msg) => ApiError::BadRequest(msg),
            StorageError::Io(e) => {
                error!("Entry storage failed: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct NewEntryRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct EditEntryRequest {
    #[serde(default)]
    pub content: String,
}

/// Create the router for the encyclopedia service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/wiki", get(index))
        .route("/wiki/search", get(search_entries))
        .route("/wiki/new", post(new_entry))
        .route("/wiki/random", get(random_entry))
        .route("/wiki/:title", get(entry))
        .route("/wiki/:title/edit", get(edit_form).post(edit_entry))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "encyclopedia-service"
    }))
}

/// Percent-encode a title for use as a single path segment
fn encode_segment(title: &str) -> String {
    let mut encoded = String::with_capacity(title.len());
    for byte in title.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

fn entry_redirect(title: &str) -> Redirect {
    Redirect::to(&format!("/wiki/{}", encode_segment(title)))
}

/// All entry titles
pub async fn index(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let entries = state.entries.list_entries().await?;
    Ok(Json(json!({ "entries": entries })))
}

/// Raw markdown of one entry
pub async fn entry(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    let content = state
        .entries
        .get_entry(&title)
        .await?
        .ok_or_else(|| ApiError::NotFound("requested page was not found.".to_string()))?;

    Ok(Json(EntryResponse { title, content }))
}

/// Redirect on an exact title match, otherwise list titles containing the query
pub async fn search_entries(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    let titles = state.entries.list_entries().await?;

    match search(titles, &query.q) {
        SearchOutcome::Exact(title) => Ok(entry_redirect(&title).into_response()),
        SearchOutcome::Matches(results) => Ok(Json(json!({
            "query": query.q,
            "results": results,
        }))
        .into_response()),
    }
}

/// Create a new entry; the stored markdown starts with the title as a heading
pub async fn new_entry(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<NewEntryRequest>,
) -> ApiResult<Redirect> {
    let title =
        required_text("Title", &payload.title, TITLE_MAX_CHARS).map_err(ApiError::BadRequest)?;
    validate_title(&title).map_err(ApiError::BadRequest)?;
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content cannot be empty.".to_string()));
    }

    if state.entries.find_title(&title).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "An entry with the title '{}' already exists.",
            title
        )));
    }

    let content = format!("# {}\n\n{}", title, payload.content);
    state.entries.save_entry(&title, &content).await?;

    info!("Created entry: {}", title);
    Ok(entry_redirect(&title))
}

/// Stored markdown of an entry, for editing
pub async fn edit_form(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    let content = state
        .entries
        .get_entry(&title)
        .await?
        .ok_or_else(|| ApiError::NotFound("Page not found.".to_string()))?;

    Ok(Json(EntryResponse { title, content }))
}

/// Replace the stored markdown of an existing entry
pub async fn edit_entry(
    State(state): State<AppState>,
    Path(title): Path<String>,
    WithRejection(Json(payload), _): JsonBody<EditEntryRequest>,
) -> ApiResult<Redirect> {
    if state.entries.get_entry(&title).await?.is_none() {
        return Err(ApiError::NotFound("Page not found.".to_string()));
    }

    state.entries.save_entry(&title, &payload.content).await?;

    info!("Edited entry: {}", title);
    Ok(entry_redirect(&title))
}

/// Redirect to a uniformly chosen entry
pub async fn random_entry(State(state): State<AppState>) -> ApiResult<Redirect> {
    let titles = state.entries.list_entries().await?;
    let title = titles
        .choose(&mut rand::thread_rng())
        .ok_or_else(|| ApiError::NotFound("There are no entries yet.".to_string()))?;

    Ok(entry_redirect(title))
}
