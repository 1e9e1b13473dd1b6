use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub vendor_name: String,
    pub order_date: NaiveDate,
    pub expected_delivery_date: NaiveDate,
    pub create_in_wms: bool,
    /// Identifier assigned by the warehouse system once the order was pushed there.
    pub wms_purchase_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_order_line_item::Entity")]
    PurchaseOrderLineItems,
}

impl Related<super::purchase_order_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderLineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
