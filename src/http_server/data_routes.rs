//! Data HTTP Routes
//!
//! Generic record CRUD for any table owned by a page, plus search and
//! statistics.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};

use super::errors::{ApiError, ApiResult};
use super::response::{deleted, DataResponse, PaginatedResponse};
use super::server::AppState;
use crate::data::{PageRequest, TableStats};

// ==================
// Data Routes
// ==================

/// Create data routes
pub fn data_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/data/:table",
            get(list_records_handler).post(create_record_handler),
        )
        .route(
            "/data/:table/:id",
            get(get_record_handler)
                .put(update_record_handler)
                .delete(delete_record_handler),
        )
        .route("/stats/:table", get(stats_handler))
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

fn into_object(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Map<String, Value>> {
    match payload? {
        Json(Value::Object(obj)) => Ok(obj),
        _ => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

// ==================
// Handlers
// ==================

async fn list_records_handler(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<PaginatedResponse>> {
    let request = PageRequest::from_params(
        params.get("page").map(String::as_str),
        params.get("limit").map(String::as_str),
    );
    let page = match params.get("search") {
        Some(term) => state.service.search(&table, term, request)?,
        None => state.service.list(&table, request)?,
    };
    Ok(Json(PaginatedResponse::from(page)))
}

async fn get_record_handler(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, String)>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let doc = state.service.get(&table, &id)?;
    Ok(Json(DataResponse::new(doc.to_json())))
}

async fn create_record_handler(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DataResponse<Value>>)> {
    let input = into_object(payload)?;
    let doc = state.service.create(&table, input)?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(doc.to_json()))))
}

async fn update_record_handler(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let input = into_object(payload)?;
    let doc = state.service.update(&table, &id, input)?;
    Ok(Json(DataResponse::new(doc.to_json())))
}

async fn delete_record_handler(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, String)>,
) -> ApiResult<Json<DataResponse<Value>>> {
    state.service.delete(&table, &id)?;
    Ok(Json(deleted()))
}

async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
) -> ApiResult<Json<DataResponse<TableStats>>> {
    let stats = state.service.stats(&table)?;
    Ok(Json(DataResponse::new(stats)))
}
