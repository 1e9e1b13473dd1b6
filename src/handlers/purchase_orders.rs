use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    ApiJson,
};
use crate::{
    dto::{
        conversion::ConvertedPurchaseOrder,
        purchase_orders::{
            CreatePurchaseOrderRequest, ListPurchaseOrdersParams, PurchaseOrderPage,
            PurchaseOrderResponse, UpdatePurchaseOrderRequest,
        },
    },
    errors::ApiError,
    handlers::AppState,
    services::document_conversion::UploadedDocument,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tracing::{info, warn};
use utoipa::ToSchema;

/// Multipart body of the conversion endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ConvertFileUpload {
    /// Purchase order document in any format the assistant can read
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// List purchase orders with line item totals
#[utoipa::path(
    get,
    path = "/api/purchase-orders",
    params(ListPurchaseOrdersParams),
    responses(
        (status = 200, description = "Page of purchase orders", body = PurchaseOrderPage),
        (status = 400, description = "Invalid page or limit", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(params): Query<ListPurchaseOrdersParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .services
        .purchase_orders
        .list_purchase_orders(params)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(page))
}

/// Create a new purchase order
#[utoipa::path(
    post,
    path = "/api/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order created", body = PurchaseOrderResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .purchase_orders
        .create_purchase_order(payload)
        .await
        .map_err(map_service_error)?;

    info!(purchase_order_id = created.id, "Purchase order created via API");
    Ok(created_response(created))
}

/// Get a purchase order with its line items
#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}",
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order", body = PurchaseOrderResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .get_purchase_order(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Update the header and reconcile line items by their `action` tag
#[utoipa::path(
    put,
    path = "/api/purchase-orders/{id}",
    params(("id" = i32, Path, description = "Purchase order ID")),
    request_body = UpdatePurchaseOrderRequest,
    responses(
        (status = 200, description = "Purchase order updated", body = PurchaseOrderResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order or line item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<UpdatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let result = state
        .services
        .purchase_orders
        .update_purchase_order(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(result.purchase_order))
}

/// Delete a purchase order and its line items
#[utoipa::path(
    delete,
    path = "/api/purchase-orders/{id}",
    params(("id" = i32, Path, description = "Purchase order ID")),
    responses(
        (status = 204, description = "Purchase order deleted"),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .purchase_orders
        .delete_purchase_order(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Convert an uploaded purchase order document into order JSON
#[utoipa::path(
    post,
    path = "/api/purchase-orders/convert-file",
    request_body(content = ConvertFileUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted purchase order", body = ConvertedPurchaseOrder),
        (status = 400, description = "Missing or empty file", body = crate::errors::ErrorResponse),
        (status = 502, description = "Error processing file", body = crate::errors::ErrorResponse),
        (status = 503, description = "Conversion not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn convert_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut document = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            warn!(field = ?field.name(), "Ignoring unexpected multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or("purchase-order").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read uploaded file: {}", e)))?;

        document = Some(UploadedDocument {
            file_name,
            content_type,
            bytes,
        });
        break;
    }

    let document =
        document.ok_or_else(|| ApiError::BadRequest("Multipart field 'file' is required".to_string()))?;

    let converted = state
        .services
        .document_conversion
        .convert(document)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(converted))
}

/// Creates the router for purchase order endpoints
pub fn purchase_order_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/purchase-orders",
            get(list_purchase_orders).post(create_purchase_order),
        )
        .route(
            "/purchase-orders/convert-file",
            post(convert_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/purchase-orders/:id",
            get(get_purchase_order)
                .put(update_purchase_order)
                .delete(delete_purchase_order),
        )
}
