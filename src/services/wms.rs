use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    db::DbPool,
    entities::{
        item,
        purchase_order::{self, Entity as PurchaseOrderEntity},
        purchase_order_line_item::{self, Entity as LineItemEntity},
    },
    errors::{map_db_err, ServiceError},
};

/// Purchase order as handed to the warehouse system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmsPurchaseOrder {
    pub po_number: String,
    pub vendor_name: String,
    pub order_date: NaiveDate,
    pub expected_delivery_date: NaiveDate,
    pub line_items: Vec<WmsLineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmsLineItem {
    pub sku: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl WmsPurchaseOrder {
    /// Lines whose catalog item is gone are dropped.
    pub fn build(
        order: &purchase_order::Model,
        lines: Vec<(purchase_order_line_item::Model, Option<item::Model>)>,
    ) -> Self {
        let line_items = lines
            .into_iter()
            .filter_map(|(line, catalog_item)| match catalog_item {
                Some(catalog_item) => Some(WmsLineItem {
                    sku: catalog_item.sku,
                    quantity: line.quantity,
                    price: line.unit_cost,
                }),
                None => {
                    warn!(line_item_id = line.id, item_id = line.item_id, "Line item has no catalog item");
                    None
                }
            })
            .collect();

        Self {
            po_number: format!("PO-{}", order.id),
            vendor_name: order.vendor_name.clone(),
            order_date: order.order_date,
            expected_delivery_date: order.expected_delivery_date,
            line_items,
        }
    }
}

/// Transport to an external warehouse management system.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WmsGateway: Send + Sync {
    /// Returns the WMS-side identifier when the remote system assigns one.
    async fn create_purchase_order(
        &self,
        order: &WmsPurchaseOrder,
    ) -> Result<Option<String>, ServiceError>;
}

/// Gateway used until a real WMS is wired in: records the payload and assigns nothing.
#[derive(Debug, Clone, Default)]
pub struct LoggingWmsGateway;

#[async_trait]
impl WmsGateway for LoggingWmsGateway {
    async fn create_purchase_order(
        &self,
        order: &WmsPurchaseOrder,
    ) -> Result<Option<String>, ServiceError> {
        let payload = serde_json::to_string(order)?;
        info!(po_number = %order.po_number, payload = %payload, "Creating purchase order in WMS");
        Ok(None)
    }
}

#[derive(Clone)]
pub struct WmsService {
    db_pool: Arc<DbPool>,
    gateway: Arc<dyn WmsGateway>,
}

impl WmsService {
    pub fn new(db_pool: Arc<DbPool>, gateway: Arc<dyn WmsGateway>) -> Self {
        Self { db_pool, gateway }
    }

    /// Pushes a stored order to the WMS and records the external id, if any.
    #[instrument(skip(self))]
    pub async fn create_purchase_order(
        &self,
        purchase_order_id: i32,
    ) -> Result<Option<String>, ServiceError> {
        let db = self.db_pool.as_ref();

        let order = PurchaseOrderEntity::find_by_id(purchase_order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Purchase Order with ID {} not found",
                    purchase_order_id
                ))
            })?;

        let lines = LineItemEntity::find()
            .filter(purchase_order_line_item::Column::PurchaseOrderId.eq(purchase_order_id))
            .order_by_asc(purchase_order_line_item::Column::Id)
            .find_also_related(item::Entity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let payload = WmsPurchaseOrder::build(&order, lines);
        let external_id = self.gateway.create_purchase_order(&payload).await?;

        if let Some(external_id) = &external_id {
            let mut active = order.into_active_model();
            active.wms_purchase_order_id = Set(Some(external_id.clone()));
            active.updated_at = Set(Utc::now());
            active.update(db).await.map_err(map_db_err)?;
            info!(purchase_order_id, wms_purchase_order_id = %external_id, "Stored WMS purchase order id");
        }

        Ok(external_id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use crate::entities::parent_item;
    use rust_decimal_macros::dec;

    pub(crate) async fn seeded_order(create_in_wms: bool) -> (Arc<DbPool>, i32) {
        let db = establish_connection_with_config(&DbConfig::sqlite_in_memory())
            .await
            .unwrap();
        run_migrations(&db).await.unwrap();
        let now = Utc::now();

        let parent = parent_item::ActiveModel {
            name: Set("Boxes".into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let catalog_item = item::ActiveModel {
            parent_item_id: Set(parent.id),
            name: Set("Small box".into()),
            sku: Set("BOX-S".into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let order = purchase_order::ActiveModel {
            vendor_name: Set("Acme".into()),
            order_date: Set(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            expected_delivery_date: Set(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()),
            create_in_wms: Set(create_in_wms),
            wms_purchase_order_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        purchase_order_line_item::ActiveModel {
            purchase_order_id: Set(order.id),
            item_id: Set(catalog_item.id),
            quantity: Set(4),
            unit_cost: Set(dec!(2.50)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        (Arc::new(db), order.id)
    }

    #[tokio::test]
    async fn sends_payload_and_stores_external_id() {
        let (db, order_id) = seeded_order(true).await;

        let mut gateway = MockWmsGateway::new();
        gateway
            .expect_create_purchase_order()
            .withf(move |payload| {
                payload.po_number == format!("PO-{}", order_id)
                    && payload.line_items
                        == vec![WmsLineItem {
                            sku: "BOX-S".into(),
                            quantity: 4,
                            price: dec!(2.50),
                        }]
            })
            .times(1)
            .returning(|_| Ok(Some("WMS-991".into())));

        let service = WmsService::new(db.clone(), Arc::new(gateway));
        let external_id = service.create_purchase_order(order_id).await.unwrap();
        assert_eq!(external_id.as_deref(), Some("WMS-991"));

        let stored = PurchaseOrderEntity::find_by_id(order_id)
            .one(db.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.wms_purchase_order_id.as_deref(), Some("WMS-991"));
    }

    #[tokio::test]
    async fn logging_gateway_leaves_order_untouched() {
        let (db, order_id) = seeded_order(true).await;
        let service = WmsService::new(db.clone(), Arc::new(LoggingWmsGateway));

        assert_eq!(service.create_purchase_order(order_id).await.unwrap(), None);

        let stored = PurchaseOrderEntity::find_by_id(order_id)
            .one(db.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.wms_purchase_order_id.is_none());
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let (db, _) = seeded_order(true).await;
        let mut gateway = MockWmsGateway::new();
        gateway.expect_create_purchase_order().never();

        let service = WmsService::new(db, Arc::new(gateway));
        let err = service.create_purchase_order(9_999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
