use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

use super::flatten_transaction_error;
use crate::{
    commands::Command,
    db::DbPool,
    dto::purchase_orders::{CreatePurchaseOrderRequest, PurchaseOrderResponse},
    entities::{purchase_order, purchase_order_line_item},
    errors::{map_db_err, ServiceError},
    events::{Event, EventSender},
};

/// Inserts an order and its line items in one transaction, then announces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePurchaseOrderCommand {
    pub payload: CreatePurchaseOrderRequest,
}

impl From<CreatePurchaseOrderRequest> for CreatePurchaseOrderCommand {
    fn from(payload: CreatePurchaseOrderRequest) -> Self {
        Self { payload }
    }
}

#[async_trait]
impl Command for CreatePurchaseOrderCommand {
    type Result = PurchaseOrderResponse;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.payload.validate().map_err(|e| {
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        let created = self.create_purchase_order(db_pool.as_ref()).await?;

        info!(
            purchase_order_id = created.id,
            line_items = created.purchase_order_line_items.len(),
            create_in_wms = created.create_in_wms,
            "Purchase order created"
        );

        event_sender
            .send_or_log(Event::PurchaseOrderCreated {
                purchase_order_id: created.id,
                create_in_wms: created.create_in_wms,
            })
            .await;

        Ok(created)
    }
}

impl CreatePurchaseOrderCommand {
    async fn create_purchase_order(
        &self,
        db: &DatabaseConnection,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        let payload = self.payload.clone();

        db.transaction::<_, PurchaseOrderResponse, ServiceError>(move |txn| {
            Box::pin(async move {
                let now = Utc::now();

                let order = purchase_order::ActiveModel {
                    vendor_name: Set(payload.vendor_name.trim().to_string()),
                    order_date: Set(payload.order_date),
                    expected_delivery_date: Set(payload.expected_delivery_date),
                    create_in_wms: Set(payload.create_in_wms),
                    wms_purchase_order_id: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(|e| {
                    error!("Failed to insert purchase order: {}", e);
                    map_db_err(e)
                })?;

                let mut line_items = Vec::with_capacity(payload.purchase_order_line_items.len());
                for line in &payload.purchase_order_line_items {
                    let saved = purchase_order_line_item::ActiveModel {
                        purchase_order_id: Set(order.id),
                        item_id: Set(line.item_id),
                        quantity: Set(line.quantity),
                        unit_cost: Set(line.unit_cost),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| {
                        error!(
                            purchase_order_id = order.id,
                            item_id = line.item_id,
                            "Failed to insert line item: {}",
                            e
                        );
                        map_db_err(e)
                    })?;
                    line_items.push(saved);
                }

                Ok(PurchaseOrderResponse::from_parts(order, line_items))
            })
        })
        .await
        .map_err(flatten_transaction_error)
    }
}
