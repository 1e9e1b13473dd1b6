use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::{Event, EventHandler};
use crate::services::wms::WmsService;

/// Forwards newly created orders flagged `createInWMS` to the warehouse system.
#[derive(Clone)]
pub struct WmsIntegrationHandler {
    wms: Arc<WmsService>,
}

impl WmsIntegrationHandler {
    pub fn new(wms: Arc<WmsService>) -> Self {
        Self { wms }
    }
}

#[async_trait]
impl EventHandler for WmsIntegrationHandler {
    async fn handle_event(&self, event: Event) -> Result<(), String> {
        let Event::PurchaseOrderCreated {
            purchase_order_id,
            create_in_wms,
        } = event
        else {
            return Ok(());
        };

        if !create_in_wms {
            debug!(purchase_order_id, "Order not flagged for WMS; skipping");
            return Ok(());
        }

        let external_id = self
            .wms
            .create_purchase_order(purchase_order_id)
            .await
            .map_err(|e| format!("WMS hand-off failed for purchase order {}: {}", purchase_order_id, e))?;

        info!(
            purchase_order_id,
            wms_purchase_order_id = ?external_id,
            "Purchase order handed to WMS"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::wms::{tests::seeded_order, MockWmsGateway};

    #[tokio::test]
    async fn skips_orders_not_flagged_for_wms() {
        let (db, order_id) = seeded_order(false).await;
        let mut gateway = MockWmsGateway::new();
        gateway.expect_create_purchase_order().never();

        let handler = WmsIntegrationHandler::new(Arc::new(WmsService::new(db, Arc::new(gateway))));
        let result = handler
            .handle_event(Event::PurchaseOrderCreated {
                purchase_order_id: order_id,
                create_in_wms: false,
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn forwards_flagged_orders() {
        let (db, order_id) = seeded_order(true).await;
        let mut gateway = MockWmsGateway::new();
        gateway
            .expect_create_purchase_order()
            .times(1)
            .returning(|_| Ok(None));

        let handler = WmsIntegrationHandler::new(Arc::new(WmsService::new(db, Arc::new(gateway))));
        handler
            .handle_event(Event::PurchaseOrderCreated {
                purchase_order_id: order_id,
                create_in_wms: true,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ignores_other_events_and_reports_gateway_failures() {
        let (db, order_id) = seeded_order(true).await;
        let mut gateway = MockWmsGateway::new();
        gateway
            .expect_create_purchase_order()
            .times(1)
            .returning(|_| Err(crate::errors::ServiceError::ExternalServiceError("down".into())));

        let handler = WmsIntegrationHandler::new(Arc::new(WmsService::new(db, Arc::new(gateway))));
        assert!(handler
            .handle_event(Event::PurchaseOrderUpdated(order_id))
            .await
            .is_ok());

        let err = handler
            .handle_event(Event::PurchaseOrderCreated {
                purchase_order_id: order_id,
                create_in_wms: true,
            })
            .await
            .unwrap_err();
        assert!(err.contains("WMS hand-off failed"));
    }
}
