use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    commands::{
        purchaseorders::{
            CreatePurchaseOrderCommand, DeletePurchaseOrderCommand, UpdatePurchaseOrderCommand,
            UpdatePurchaseOrderResult,
        },
        Command,
    },
    db::DbPool,
    dto::purchase_orders::{
        CreatePurchaseOrderRequest, ListPurchaseOrdersParams, PurchaseOrderPage,
        PurchaseOrderResponse, UpdatePurchaseOrderRequest,
    },
    errors::ServiceError,
    events::EventSender,
    queries::{
        purchase_order_queries::{GetPurchaseOrderQuery, ListPurchaseOrdersQuery},
        Query,
    },
};

/// Service for managing purchase orders and their line items
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    default_page_size: u64,
    max_page_size: u64,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
            default_page_size: 10,
            max_page_size: 100,
        }
    }

    /// Overrides the listing defaults (`limit` when omitted, and its upper bound).
    pub fn with_page_sizes(mut self, default_page_size: u64, max_page_size: u64) -> Self {
        self.default_page_size = default_page_size;
        self.max_page_size = max_page_size;
        self
    }

    /// Creates a purchase order with its line items
    #[instrument(skip(self, request))]
    pub async fn create_purchase_order(
        &self,
        request: CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        CreatePurchaseOrderCommand::from(request)
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Gets a purchase order with its line items
    #[instrument(skip(self))]
    pub async fn get_purchase_order(
        &self,
        purchase_order_id: i32,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        GetPurchaseOrderQuery { purchase_order_id }
            .execute(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Purchase Order with ID {} not found",
                    purchase_order_id
                ))
            })
    }

    /// Replaces the header and reconciles the submitted line items
    #[instrument(skip(self, request))]
    pub async fn update_purchase_order(
        &self,
        purchase_order_id: i32,
        request: UpdatePurchaseOrderRequest,
    ) -> Result<UpdatePurchaseOrderResult, ServiceError> {
        UpdatePurchaseOrderCommand {
            purchase_order_id,
            payload: request,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_purchase_order(&self, purchase_order_id: i32) -> Result<(), ServiceError> {
        DeletePurchaseOrderCommand { purchase_order_id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Lists a page of orders with their line item totals
    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        params: ListPurchaseOrdersParams,
    ) -> Result<PurchaseOrderPage, ServiceError> {
        let query = self.resolve_page(&params)?;
        let page = query.execute(self.db_pool.as_ref()).await?;
        info!(
            page = page.current_page,
            returned = page.data.len(),
            total_pages = page.total_pages,
            "Listed purchase orders"
        );
        Ok(page)
    }

    fn resolve_page(
        &self,
        params: &ListPurchaseOrdersParams,
    ) -> Result<ListPurchaseOrdersQuery, ServiceError> {
        let page = params.page.unwrap_or(1);
        let limit = params.limit.unwrap_or(self.default_page_size);

        if page == 0 {
            return Err(ServiceError::ValidationError(
                "page must be at least 1".to_string(),
            ));
        }
        if limit == 0 || limit > self.max_page_size {
            return Err(ServiceError::ValidationError(format!(
                "limit must be between 1 and {}",
                self.max_page_size
            )));
        }

        let query = ListPurchaseOrdersQuery { page, limit };
        if query.offset().is_none() {
            return Err(ServiceError::ValidationError(format!(
                "page {} is out of range",
                page
            )));
        }
        Ok(query)
    }
}
