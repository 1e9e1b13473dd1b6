use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::entities::{purchase_order, purchase_order_line_item};

fn validate_unit_cost(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("unit_cost");
        err.message = Some("unit_cost must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Line item submitted together with a new purchase order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLineItemRequest {
    #[schema(example = 12)]
    pub item_id: i32,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    #[schema(example = 40)]
    pub quantity: i32,
    #[validate(custom = "validate_unit_cost")]
    #[schema(value_type = f64, example = 3.25)]
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    #[validate(length(min = 1, message = "vendor_name is required"))]
    #[schema(example = "Acme Packaging")]
    pub vendor_name: String,
    #[serde(with = "date_io")]
    #[schema(value_type = String, format = Date, example = "2024-06-01")]
    pub order_date: NaiveDate,
    #[serde(with = "date_io")]
    #[schema(value_type = String, format = Date, example = "2024-06-15")]
    pub expected_delivery_date: NaiveDate,
    /// Hand the order to the warehouse system once it is stored
    #[serde(rename = "createInWMS", default)]
    pub create_in_wms: bool,
    #[serde(default)]
    #[validate]
    pub purchase_order_line_items: Vec<CreateLineItemRequest>,
}

/// Line item inside an update request.
///
/// `action` picks the persistence operation: `new` inserts, `update` rewrites the row
/// named by `id`, `delete` removes it. Anything else leaves the row alone.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateLineItemRequest {
    #[serde(default)]
    pub id: Option<i32>,
    /// Echoed back by clients; the path id is authoritative
    #[serde(default)]
    pub purchase_order_id: Option<i32>,
    pub item_id: i32,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom = "validate_unit_cost")]
    #[schema(value_type = f64)]
    pub unit_cost: Decimal,
    #[serde(default)]
    #[schema(example = "update")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderRequest {
    #[validate(length(min = 1, message = "vendor_name is required"))]
    pub vendor_name: String,
    #[serde(with = "date_io")]
    #[schema(value_type = String, format = Date)]
    pub order_date: NaiveDate,
    #[serde(with = "date_io")]
    #[schema(value_type = String, format = Date)]
    pub expected_delivery_date: NaiveDate,
    #[serde(default)]
    #[validate]
    pub purchase_order_line_items: Vec<UpdateLineItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LineItemResponse {
    pub id: i32,
    pub purchase_order_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub unit_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<purchase_order_line_item::Model> for LineItemResponse {
    fn from(model: purchase_order_line_item::Model) -> Self {
        Self {
            id: model.id,
            purchase_order_id: model.purchase_order_id,
            item_id: model.item_id,
            quantity: model.quantity,
            unit_cost: model.unit_cost,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Purchase order with its line items
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrderResponse {
    pub id: i32,
    pub vendor_name: String,
    #[schema(value_type = String, format = Date)]
    pub order_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub expected_delivery_date: NaiveDate,
    #[serde(rename = "createInWMS")]
    pub create_in_wms: bool,
    pub wms_purchase_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub purchase_order_line_items: Vec<LineItemResponse>,
}

impl PurchaseOrderResponse {
    pub fn from_parts(
        order: purchase_order::Model,
        line_items: Vec<purchase_order_line_item::Model>,
    ) -> Self {
        Self {
            id: order.id,
            vendor_name: order.vendor_name,
            order_date: order.order_date,
            expected_delivery_date: order.expected_delivery_date,
            create_in_wms: order.create_in_wms,
            wms_purchase_order_id: order.wms_purchase_order_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
            purchase_order_line_items: line_items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Listing row: order header plus line item sums
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrderSummary {
    pub id: i32,
    pub vendor_name: String,
    #[schema(value_type = String, format = Date)]
    pub order_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub expected_delivery_date: NaiveDate,
    #[serde(rename = "createInWMS")]
    pub create_in_wms: bool,
    pub wms_purchase_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "totalQuantity")]
    pub total_quantity: i64,
    /// Sum of unit costs across line items, regardless of quantity
    #[serde(rename = "totalUnitCost", with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_unit_cost: Decimal,
    /// Sum of quantity * unit_cost across line items
    #[serde(rename = "totalCost", with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrderPage {
    pub data: Vec<PurchaseOrderSummary>,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    #[serde(rename = "currentPage")]
    pub current_page: u64,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
}

/// Query string of the listing endpoint; omitted values fall back to configured defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPurchaseOrdersParams {
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Page size (default 10)
    pub limit: Option<u64>,
}

/// Serde adapter: lenient date input, plain `YYYY-MM-DD` output.
mod date_io {
    use chrono::NaiveDate;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        crate::dto::flexible_date::deserialize(deserializer)
    }
}
