pub mod catalog;
pub mod common;
pub mod health;
pub mod purchase_orders;

use crate::{
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::{
        catalog::CatalogService,
        document_conversion::DocumentConversionService,
        purchase_orders::PurchaseOrderService,
        wms::{WmsGateway, WmsService},
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub catalog: Arc<CatalogService>,
    pub document_conversion: Arc<DocumentConversionService>,
    pub wms: Arc<WmsService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
        wms_gateway: Arc<dyn WmsGateway>,
    ) -> Result<Self, ServiceError> {
        let purchase_orders = Arc::new(
            PurchaseOrderService::new(db_pool.clone(), event_sender).with_page_sizes(
                u64::from(config.api_default_page_size),
                u64::from(config.api_max_page_size),
            ),
        );
        let catalog = Arc::new(CatalogService::new(db_pool.clone()));
        let document_conversion = Arc::new(DocumentConversionService::new(
            config.openai.clone(),
            catalog.clone(),
        )?);
        let wms = Arc::new(WmsService::new(db_pool, wms_gateway));

        Ok(Self {
            purchase_orders,
            catalog,
            document_conversion,
            wms,
        })
    }
}
