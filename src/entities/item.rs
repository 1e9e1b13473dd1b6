use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog entry a purchase order line item can reference.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub parent_item_id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parent_item::Entity",
        from = "Column::ParentItemId",
        to = "super::parent_item::Column::Id"
    )]
    ParentItem,
    #[sea_orm(has_many = "super::purchase_order_line_item::Entity")]
    PurchaseOrderLineItems,
}

impl Related<super::parent_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParentItem.def()
    }
}

impl Related<super::purchase_order_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderLineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
