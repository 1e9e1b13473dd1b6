use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{item, parent_item};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: i32,
    pub parent_item_id: i32,
    pub name: String,
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<item::Model> for ItemResponse {
    fn from(model: item::Model) -> Self {
        Self {
            id: model.id,
            parent_item_id: model.parent_item_id,
            name: model.name,
            sku: model.sku,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Catalog group with the items it contains
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParentItemResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<ItemResponse>,
}

impl ParentItemResponse {
    pub fn from_parts(parent: parent_item::Model, items: Vec<item::Model>) -> Self {
        Self {
            id: parent.id,
            name: parent.name,
            created_at: parent.created_at,
            updated_at: parent.updated_at,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}
