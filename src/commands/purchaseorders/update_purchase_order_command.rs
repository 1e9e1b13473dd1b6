use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use strum::{Display, EnumString};
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use super::{flatten_transaction_error, not_found};
use crate::{
    commands::Command,
    db::DbPool,
    dto::purchase_orders::{PurchaseOrderResponse, UpdateLineItemRequest, UpdatePurchaseOrderRequest},
    entities::{
        purchase_order::{self, Entity as PurchaseOrderEntity},
        purchase_order_line_item::{self, Entity as LineItemEntity},
    },
    errors::{map_db_err, ServiceError},
    events::{Event, EventSender},
    queries::purchase_order_queries::load_purchase_order,
};

/// What an update request wants done with one submitted line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LineItemAction {
    New,
    Update,
    Delete,
}

impl LineItemAction {
    /// `None` for a missing or unrecognized tag.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|tag| Self::from_str(tag.trim()).ok())
    }
}

/// Counts of what reconciliation did to the order's line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
}

/// Rewrites an order header and applies each submitted line item's action, all in
/// one transaction. Line items that are not submitted are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePurchaseOrderCommand {
    pub purchase_order_id: i32,
    pub payload: UpdatePurchaseOrderRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePurchaseOrderResult {
    pub purchase_order: PurchaseOrderResponse,
    pub summary: ReconciliationSummary,
}

#[async_trait]
impl Command for UpdatePurchaseOrderCommand {
    type Result = UpdatePurchaseOrderResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.payload
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let result = self.reconcile(db_pool.as_ref()).await?;

        info!(
            purchase_order_id = self.purchase_order_id,
            created = result.summary.created,
            updated = result.summary.updated,
            deleted = result.summary.deleted,
            skipped = result.summary.skipped,
            "Purchase order updated"
        );

        event_sender
            .send_or_log(Event::PurchaseOrderUpdated(self.purchase_order_id))
            .await;

        Ok(result)
    }
}

impl UpdatePurchaseOrderCommand {
    async fn reconcile(
        &self,
        db: &DatabaseConnection,
    ) -> Result<UpdatePurchaseOrderResult, ServiceError> {
        let purchase_order_id = self.purchase_order_id;
        let payload = self.payload.clone();

        db.transaction::<_, UpdatePurchaseOrderResult, ServiceError>(move |txn| {
            Box::pin(async move {
                let now = Utc::now();

                let order = PurchaseOrderEntity::find_by_id(purchase_order_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .ok_or_else(|| not_found(purchase_order_id))?;

                let mut header: purchase_order::ActiveModel = order.into();
                header.vendor_name = Set(payload.vendor_name.trim().to_string());
                header.order_date = Set(payload.order_date);
                header.expected_delivery_date = Set(payload.expected_delivery_date);
                header.updated_at = Set(now);
                header.update(txn).await.map_err(map_db_err)?;

                let mut summary = ReconciliationSummary::default();
                for (position, line) in payload.purchase_order_line_items.iter().enumerate() {
                    apply_line_item(txn, purchase_order_id, position, line, now, &mut summary)
                        .await?;
                }

                let purchase_order = load_purchase_order(txn, purchase_order_id)
                    .await?
                    .ok_or_else(|| not_found(purchase_order_id))?;

                Ok(UpdatePurchaseOrderResult {
                    purchase_order,
                    summary,
                })
            })
        })
        .await
        .map_err(|e| {
            let err = flatten_transaction_error(e);
            warn!(purchase_order_id, error = %err, "Purchase order update rolled back");
            err
        })
    }
}

async fn apply_line_item(
    txn: &DatabaseTransaction,
    purchase_order_id: i32,
    position: usize,
    line: &UpdateLineItemRequest,
    now: DateTime<Utc>,
    summary: &mut ReconciliationSummary,
) -> Result<(), ServiceError> {
    match LineItemAction::parse(line.action.as_deref()) {
        Some(LineItemAction::New) => {
            let saved = purchase_order_line_item::ActiveModel {
                purchase_order_id: Set(purchase_order_id),
                item_id: Set(line.item_id),
                quantity: Set(line.quantity),
                unit_cost: Set(line.unit_cost),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(map_db_err)?;
            debug!(purchase_order_id, line_item_id = saved.id, "Inserted line item");
            summary.created += 1;
        }
        Some(LineItemAction::Update) => {
            let line_item_id = require_line_item_id(line, position)?;
            let existing = LineItemEntity::find_by_id(line_item_id)
                .filter(purchase_order_line_item::Column::PurchaseOrderId.eq(purchase_order_id))
                .one(txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| line_item_not_found(purchase_order_id, line_item_id))?;

            let mut active: purchase_order_line_item::ActiveModel = existing.into();
            active.item_id = Set(line.item_id);
            active.quantity = Set(line.quantity);
            active.unit_cost = Set(line.unit_cost);
            active.updated_at = Set(now);
            active.update(txn).await.map_err(map_db_err)?;
            debug!(purchase_order_id, line_item_id, "Updated line item");
            summary.updated += 1;
        }
        Some(LineItemAction::Delete) => {
            let line_item_id = require_line_item_id(line, position)?;
            let result = LineItemEntity::delete_many()
                .filter(purchase_order_line_item::Column::Id.eq(line_item_id))
                .filter(purchase_order_line_item::Column::PurchaseOrderId.eq(purchase_order_id))
                .exec(txn)
                .await
                .map_err(map_db_err)?;
            if result.rows_affected == 0 {
                return Err(line_item_not_found(purchase_order_id, line_item_id));
            }
            debug!(purchase_order_id, line_item_id, "Deleted line item");
            summary.deleted += 1;
        }
        None => {
            warn!(
                purchase_order_id,
                position,
                line_item_id = ?line.id,
                action = ?line.action,
                "Ignoring line item without a recognized action"
            );
            summary.skipped += 1;
        }
    }

    Ok(())
}

fn require_line_item_id(line: &UpdateLineItemRequest, position: usize) -> Result<i32, ServiceError> {
    line.id.ok_or_else(|| {
        error!(position, "Line item action requires an id");
        ServiceError::BadRequest(format!(
            "Line item at position {} needs an id for action '{}'",
            position,
            line.action.as_deref().unwrap_or_default()
        ))
    })
}

fn line_item_not_found(purchase_order_id: i32, line_item_id: i32) -> ServiceError {
    ServiceError::NotFound(format!(
        "Line item with ID {} not found on Purchase Order {}",
        line_item_id, purchase_order_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("new"), Some(LineItemAction::New))]
    #[case(Some("update"), Some(LineItemAction::Update))]
    #[case(Some("delete"), Some(LineItemAction::Delete))]
    #[case(Some(" Delete "), Some(LineItemAction::Delete))]
    #[case(Some("archive"), None)]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn parses_action_tags(#[case] raw: Option<&str>, #[case] expected: Option<LineItemAction>) {
        assert_eq!(LineItemAction::parse(raw), expected);
    }

    #[test]
    fn action_displays_as_wire_tag() {
        assert_eq!(LineItemAction::New.to_string(), "new");
        assert_eq!(LineItemAction::Delete.to_string(), "delete");
    }
}
