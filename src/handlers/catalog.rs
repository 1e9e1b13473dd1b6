use super::common::{map_service_error, success_response};
use crate::{
    dto::catalog::{ItemResponse, ParentItemResponse},
    errors::ApiError,
    handlers::AppState,
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

/// List parent items with their items
#[utoipa::path(
    get,
    path = "/api/parent-items",
    responses(
        (status = 200, description = "Catalog grouped by parent item", body = [ParentItemResponse])
    ),
    tag = "catalog"
)]
pub async fn list_parent_items(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = state
        .services
        .catalog
        .list_parent_items()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(groups))
}

/// List all catalog items
#[utoipa::path(
    get,
    path = "/api/items",
    responses(
        (status = 200, description = "Catalog items", body = [ItemResponse])
    ),
    tag = "catalog"
)]
pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .catalog
        .list_items()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(items))
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/parent-items", get(list_parent_items))
        .route("/items", get(list_items))
}
