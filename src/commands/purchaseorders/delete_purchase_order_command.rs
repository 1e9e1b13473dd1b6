use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{flatten_transaction_error, not_found};
use crate::{
    commands::Command,
    db::DbPool,
    entities::{
        purchase_order::Entity as PurchaseOrderEntity,
        purchase_order_line_item::{self, Entity as LineItemEntity},
    },
    errors::{map_db_err, ServiceError},
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePurchaseOrderCommand {
    pub purchase_order_id: i32,
}

#[async_trait]
impl Command for DeletePurchaseOrderCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let removed_lines = self.delete_purchase_order(db_pool.as_ref()).await?;

        info!(
            purchase_order_id = self.purchase_order_id,
            removed_lines, "Purchase order deleted"
        );

        event_sender
            .send_or_log(Event::PurchaseOrderDeleted(self.purchase_order_id))
            .await;

        Ok(())
    }
}

impl DeletePurchaseOrderCommand {
    /// Removes the order and its line items; returns how many line items went with it.
    async fn delete_purchase_order(&self, db: &DatabaseConnection) -> Result<u64, ServiceError> {
        let purchase_order_id = self.purchase_order_id;

        db.transaction::<_, u64, ServiceError>(move |txn| {
            Box::pin(async move {
                // Line items first, whether or not the backend enforces the FK cascade.
                let lines = LineItemEntity::delete_many()
                    .filter(purchase_order_line_item::Column::PurchaseOrderId.eq(purchase_order_id))
                    .exec(txn)
                    .await
                    .map_err(map_db_err)?;

                let res = PurchaseOrderEntity::delete_by_id(purchase_order_id)
                    .exec(txn)
                    .await
                    .map_err(map_db_err)?;

                if res.rows_affected == 0 {
                    return Err(not_found(purchase_order_id));
                }

                Ok(lines.rows_affected)
            })
        })
        .await
        .map_err(flatten_transaction_error)
    }
}
