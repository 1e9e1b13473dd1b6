use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

use super::Query;
use crate::{
    dto::purchase_orders::{PurchaseOrderPage, PurchaseOrderResponse, PurchaseOrderSummary},
    entities::{
        purchase_order::{self, Entity as PurchaseOrderEntity},
        purchase_order_line_item::{self, Entity as LineItemEntity},
    },
    errors::ServiceError,
};

/// Loads an order and its line items (ordered by id) on any connection,
/// including an open transaction.
pub async fn load_purchase_order<C>(
    db: &C,
    purchase_order_id: i32,
) -> Result<Option<PurchaseOrderResponse>, ServiceError>
where
    C: ConnectionTrait,
{
    let Some(order) = PurchaseOrderEntity::find_by_id(purchase_order_id)
        .one(db)
        .await
        .map_err(ServiceError::DatabaseError)?
    else {
        return Ok(None);
    };

    let line_items = LineItemEntity::find()
        .filter(purchase_order_line_item::Column::PurchaseOrderId.eq(purchase_order_id))
        .order_by_asc(purchase_order_line_item::Column::Id)
        .all(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    Ok(Some(PurchaseOrderResponse::from_parts(order, line_items)))
}

/// Query to get a specific purchase order by ID
#[derive(Debug, Serialize, Deserialize)]
pub struct GetPurchaseOrderQuery {
    pub purchase_order_id: i32,
}

#[async_trait]
impl Query for GetPurchaseOrderQuery {
    type Result = Option<PurchaseOrderResponse>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        load_purchase_order(db_pool, self.purchase_order_id).await
    }
}

/// Page of purchase orders ordered by expected delivery date, each carrying
/// the sums of its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPurchaseOrdersQuery {
    /// 1-based
    pub page: u64,
    pub limit: u64,
}

impl ListPurchaseOrdersQuery {
    /// Rows to skip; `None` when the page lies beyond what the database can address.
    pub fn offset(&self) -> Option<u64> {
        self.page
            .checked_sub(1)?
            .checked_mul(self.limit)
            .filter(|offset| i64::try_from(*offset).is_ok())
    }
}

#[derive(Debug, FromQueryResult)]
struct LineItemTotals {
    purchase_order_id: i32,
    total_quantity: Option<i64>,
    total_unit_cost: Option<Decimal>,
    total_cost: Option<Decimal>,
}

#[async_trait]
impl Query for ListPurchaseOrdersQuery {
    type Result = PurchaseOrderPage;

    #[instrument(skip(db_pool))]
    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        if self.page == 0 || self.limit == 0 {
            return Err(ServiceError::ValidationError(
                "page and limit must be at least 1".to_string(),
            ));
        }
        let offset = self.offset().ok_or_else(|| {
            ServiceError::ValidationError(format!("page {} is out of range", self.page))
        })?;

        let total = PurchaseOrderEntity::find()
            .count(db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let orders = PurchaseOrderEntity::find()
            .order_by_asc(purchase_order::Column::ExpectedDeliveryDate)
            .order_by_asc(purchase_order::Column::Id)
            .offset(offset)
            .limit(self.limit)
            .all(db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let ids: Vec<i32> = orders.iter().map(|order| order.id).collect();
        let totals = line_item_totals(db_pool, &ids).await?;

        let data = orders
            .into_iter()
            .map(|order| {
                let sums = totals.get(&order.id);
                PurchaseOrderSummary {
                    total_quantity: sums.and_then(|t| t.total_quantity).unwrap_or(0),
                    total_unit_cost: money(sums.and_then(|t| t.total_unit_cost)),
                    total_cost: money(sums.and_then(|t| t.total_cost)),
                    id: order.id,
                    vendor_name: order.vendor_name,
                    order_date: order.order_date,
                    expected_delivery_date: order.expected_delivery_date,
                    create_in_wms: order.create_in_wms,
                    wms_purchase_order_id: order.wms_purchase_order_id,
                    created_at: order.created_at,
                    updated_at: order.updated_at,
                }
            })
            .collect();

        let total_pages = total_pages(total, self.limit);
        debug!(total, total_pages, page = self.page, "Listed purchase orders");

        Ok(PurchaseOrderPage {
            data,
            total_pages,
            current_page: self.page,
            has_next_page: self.page < total_pages,
        })
    }
}

/// One grouped query over the line items of the given orders.
async fn line_item_totals(
    db: &DatabaseConnection,
    purchase_order_ids: &[i32],
) -> Result<HashMap<i32, LineItemTotals>, ServiceError> {
    if purchase_order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let line_total: SimpleExpr = Func::sum(
        Expr::col((LineItemEntity, purchase_order_line_item::Column::Quantity))
            .mul(Expr::col((LineItemEntity, purchase_order_line_item::Column::UnitCost))),
    )
    .into();

    let rows = LineItemEntity::find()
        .select_only()
        .column(purchase_order_line_item::Column::PurchaseOrderId)
        .column_as(purchase_order_line_item::Column::Quantity.sum(), "total_quantity")
        .column_as(purchase_order_line_item::Column::UnitCost.sum(), "total_unit_cost")
        .column_as(line_total, "total_cost")
        .filter(purchase_order_line_item::Column::PurchaseOrderId.is_in(purchase_order_ids.to_vec()))
        .group_by(purchase_order_line_item::Column::PurchaseOrderId)
        .into_model::<LineItemTotals>()
        .all(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    Ok(rows
        .into_iter()
        .map(|row| (row.purchase_order_id, row))
        .collect())
}

// Money columns have two decimal places; some backends hand sums back as floats.
fn money(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO).round_dp(2)
}

/// `ceil(total / limit)`; zero orders means zero pages.
pub fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn offset_skips_previous_pages() {
        let query = ListPurchaseOrdersQuery { page: 3, limit: 10 };
        assert_eq!(query.offset(), Some(20));
        assert_eq!(ListPurchaseOrdersQuery { page: 1, limit: 10 }.offset(), Some(0));
    }

    #[test]
    fn offset_beyond_i64_is_rejected() {
        let huge = ListPurchaseOrdersQuery { page: u64::MAX, limit: 10 };
        assert_eq!(huge.offset(), None);

        let past_i64 = ListPurchaseOrdersQuery {
            page: (i64::MAX as u64) / 10 + 2,
            limit: 10,
        };
        assert_eq!(past_i64.offset(), None);

        let last_addressable = ListPurchaseOrdersQuery {
            page: (i64::MAX as u64) / 10 + 1,
            limit: 10,
        };
        assert!(last_addressable.offset().is_some());
    }

    #[test]
    fn money_rounds_float_noise() {
        assert_eq!(money(Some(dec!(3.3000000000000003))), dec!(3.30));
        assert_eq!(money(None), Decimal::ZERO);
    }

    #[test]
    fn total_pages_edges() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    proptest! {
        #[test]
        fn total_pages_covers_every_order(total in 0u64..10_000, limit in 1u64..200) {
            let pages = total_pages(total, limit);
            prop_assert!(pages * limit >= total);
            if pages > 0 {
                prop_assert!((pages - 1) * limit < total);
            }
        }
    }
}
