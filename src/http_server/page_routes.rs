//! Page HTTP Routes
//!
//! Page definition management consumed by the admin UI.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use super::errors::ApiResult;
use super::response::{deleted, DataResponse, ListResponse};
use super::server::AppState;
use crate::schema::{PageInput, PageSchema, PageUpdate};

// ==================
// Page Routes
// ==================

/// Create page routes
pub fn page_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/pages", get(list_pages_handler).post(create_page_handler))
        .route(
            "/pages/:id",
            get(get_page_handler)
                .put(update_page_handler)
                .delete(delete_page_handler),
        )
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn list_pages_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ListResponse<PageSchema>>> {
    let pages = state.service.registry().list()?;
    Ok(Json(ListResponse::new(pages)))
}

async fn get_page_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<PageSchema>>> {
    let page = state.service.registry().get(&id)?;
    Ok(Json(DataResponse::new(page)))
}

async fn create_page_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PageInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DataResponse<PageSchema>>)> {
    let Json(input) = payload?;
    let page = state.service.registry().create(input)?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(page))))
}

async fn update_page_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<PageUpdate>, JsonRejection>,
) -> ApiResult<Json<DataResponse<PageSchema>>> {
    let Json(changes) = payload?;
    let page = state.service.registry().update(&id, changes)?;
    Ok(Json(DataResponse::new(page)))
}

async fn delete_page_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Value>>> {
    state.service.registry().delete(&id)?;
    Ok(Json(deleted()))
}
