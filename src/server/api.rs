//! JSON CRUD API for entries.
//!
//! Status codes: 200 on reads/updates/deletes, 201 on create, 400 with
//! `{"errors": [..]}` on validation failure, 404 with `{"error": ".."}` on
//! unknown ids, 500 opaque on upstream failure. The mapping itself lives in
//! [`crate::error::Error`]'s `IntoResponse`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use super::SharedState;
use crate::error::Result;
use crate::store::{NewSubmission, Submission, SubmissionPatch};
use crate::validation::{self, sanitize_message};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/{id}", put(update_entry).delete(delete_entry))
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CreateEntryRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct UpdateEntryRequest {
    name: Option<String>,
    email: Option<String>,
    message: Option<String>,
}

async fn list_entries(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Submission>>> {
    Ok(Json(state.store.list(query.limit).await?))
}

async fn create_entry(
    State(state): State<SharedState>,
    Json(request): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<Submission>)> {
    let errors = validation::validate_submission(&request.name, &request.email);
    if !errors.is_empty() {
        return Err(errors.into());
    }
    let entry = state
        .store
        .create(NewSubmission {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            message: sanitize_message(&request.message),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEntryRequest>,
) -> Result<Json<Submission>> {
    let errors = validation::validate_patch(request.name.as_deref(), request.email.as_deref());
    if !errors.is_empty() {
        return Err(errors.into());
    }
    let patch = SubmissionPatch {
        name: request.name.map(|n| n.trim().to_string()),
        email: request.email.map(|e| e.trim().to_string()),
        message: request.message.as_deref().map(sanitize_message),
    };
    Ok(Json(state.store.update(id, patch).await?))
}

async fn delete_entry(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let removed = state.store.delete(id).await?;
    Ok(Json(json!({ "removed": removed })))
}
