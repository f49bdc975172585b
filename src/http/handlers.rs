use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::store::{HistoryRecord, StoreError, UserId};

use super::{errors::HttpError, state::AppState};

/// Page size for the history listing
const HISTORY_PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, HttpError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| HttpError::from(StoreError::MissingCredential))?;

    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() {
        return Err(HttpError::from(StoreError::MissingCredential));
    }
    Ok(token)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserId, HttpError> {
    let token = bearer_token(headers)?;
    Ok(state.identity.verify(token).await?)
}

pub async fn optimize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OptimizeRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let user = authenticate(&state, &headers).await?;
    let optimized = state.optimizer.optimize(&req.prompt).await?;

    // Persistence is decoupled from the response path: the caller gets the
    // result as soon as it is parsed, and a failed write is logged, never
    // surfaced or retried.
    let record = HistoryRecord::new(&user, &optimized.result, &optimized.savings);
    let store = state.store.clone();
    tokio::spawn(async move {
        if let Err(err) = store.insert(record).await {
            warn!("failed to persist optimization history: {err}");
        }
    });

    Ok(Json(optimized))
}

pub async fn history_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let user = authenticate(&state, &headers).await?;
    let records = state.store.list(&user, Some(HISTORY_PAGE_SIZE)).await?;
    Ok(Json(records))
}

pub async fn history_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, HttpError> {
    let user = authenticate(&state, &headers).await?;
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| HttpError::new(StatusCode::BAD_REQUEST, "missing id"))?;

    if state.store.delete(&user, &id).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(HttpError::new(StatusCode::NOT_FOUND, "record not found"))
    }
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    let user = authenticate(&state, &headers).await?;
    let records = state.store.list(&user, None).await?;
    Ok(Json(crate::stats::aggregate(&records)))
}
