use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{dto, errors, handlers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Procurement API",
        version = "0.1.0",
        description = r#"
# Procurement API

Purchase order management against a vendor item catalog.

## Features

- **Purchase orders**: create, read, list with per-order totals, delete
- **Line item reconciliation**: updates carry an `action` per line item (`new`, `update`, `delete`) applied in one transaction
- **Document conversion**: upload a purchase order file and receive structured order JSON
- **WMS hand-off**: orders created with `createInWMS` are forwarded to the warehouse system

## Error Handling

Errors share one body shape:

```json
{
  "error": "Not Found",
  "message": "Not found: Purchase Order with ID 42 not found",
  "request_id": "6f1c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

`GET /api/purchase-orders` accepts `page` (default 1) and `limit` (default 10).
        "#
    ),
    servers(
        (url = "http://localhost:3100", description = "Local development")
    ),
    tags(
        (name = "purchase-orders", description = "Purchase order endpoints"),
        (name = "catalog", description = "Item catalog endpoints"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        handlers::purchase_orders::list_purchase_orders,
        handlers::purchase_orders::create_purchase_order,
        handlers::purchase_orders::get_purchase_order,
        handlers::purchase_orders::update_purchase_order,
        handlers::purchase_orders::delete_purchase_order,
        handlers::purchase_orders::convert_file,
        handlers::catalog::list_parent_items,
        handlers::catalog::list_items,
        handlers::health::health_check,
    ),
    components(
        schemas(
            // Purchase orders
            dto::purchase_orders::CreatePurchaseOrderRequest,
            dto::purchase_orders::CreateLineItemRequest,
            dto::purchase_orders::UpdatePurchaseOrderRequest,
            dto::purchase_orders::UpdateLineItemRequest,
            dto::purchase_orders::PurchaseOrderResponse,
            dto::purchase_orders::LineItemResponse,
            dto::purchase_orders::PurchaseOrderSummary,
            dto::purchase_orders::PurchaseOrderPage,

            // Conversion
            handlers::purchase_orders::ConvertFileUpload,
            dto::conversion::ConvertedPurchaseOrder,
            dto::conversion::ConvertedLineItem,

            // Catalog
            dto::catalog::ParentItemResponse,
            dto::catalog::ItemResponse,

            // Health
            handlers::health::HealthResponse,
            handlers::health::ComponentHealth,
            handlers::health::ComponentStatus,

            // Error types
            errors::ErrorResponse,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Procurement API"));
        for path in [
            "/api/purchase-orders",
            "/api/purchase-orders/{id}",
            "/api/purchase-orders/convert-file",
            "/api/parent-items",
            "/api/items",
            "/health",
        ] {
            assert!(json.contains(&format!("\"{}\"", path)), "missing {}", path);
        }
        assert!(json.contains("createInWMS"));
    }
}
