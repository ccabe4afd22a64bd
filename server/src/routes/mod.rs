use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRepository {
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /repositories`: clone or refresh the repository, then announce it
/// in the background.
pub async fn register_repository(
    State(state): State<AppState>,
    Json(request): Json<RegisterRepository>
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_remote_url(&request.url)?;

    let id = state
        .tracker
        .register_or_refresh(&request.url, request.branch.as_deref())
        .await?;

    let notifier = state.notifier.clone();
    let url = request.url;
    state.queue.submit("notify_registered", async move {
        notifier.repository_registered(&url).await;
        Ok(())
    });

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// `POST /repositories/{id}/scan`: queue the scan pipeline for a known id.
pub async fn schedule_scan(
    State(state): State<AppState>,
    Path(id): Path<String>
) -> ApiResult<Json<Value>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::NotFound(format!("repository {id}")))?;

    if state.tracker.store().get_repository(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("repository {id}")));
    }

    let pipeline = state.pipeline.clone();
    state.queue.submit("scan", async move {
        pipeline.run(id).await.map(|_| ())
    });

    info!(repo_id = %id, "Scan scheduled");
    Ok(Json(json!({ "msg": "Scan scheduled" })))
}

fn validate_remote_url(raw: &str) -> ApiResult<()> {
    let url = Url::parse(raw)
        .map_err(|e| ApiError::InvalidRequest(format!("url {raw:?} is not valid: {e}")))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(()),
        _ => Err(ApiError::InvalidRequest(format!(
            "url {raw:?} must be an http or https address"
        )))
    }
}
