use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub mod wms_integration;

pub use wms_integration::WmsIntegrationHandler;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event after a commit; a closed channel is logged rather than surfaced,
    /// since the change it describes is already durable.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "Event could not be published");
        }
    }
}

/// Purchase order lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    PurchaseOrderCreated {
        purchase_order_id: i32,
        create_in_wms: bool,
    },
    PurchaseOrderUpdated(i32),
    PurchaseOrderDeleted(i32),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::PurchaseOrderCreated { .. } => "purchase_order.created",
            Event::PurchaseOrderUpdated(_) => "purchase_order.updated",
            Event::PurchaseOrderDeleted(_) => "purchase_order.deleted",
        }
    }
}

// Handlers see every event and ignore the ones they do not care about.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

/// Drains the channel, fanning each event out to the registered handlers in order.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, handlers: Vec<Arc<dyn EventHandler>>) {
    info!(handlers = handlers.len(), "Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::PurchaseOrderCreated {
                purchase_order_id,
                create_in_wms,
            } => {
                info!(
                    purchase_order_id,
                    create_in_wms, "Purchase order created"
                );
            }
            Event::PurchaseOrderUpdated(id) => {
                info!(purchase_order_id = id, "Purchase order updated");
            }
            Event::PurchaseOrderDeleted(id) => {
                info!(purchase_order_id = id, "Purchase order deleted");
            }
        }

        for handler in &handlers {
            if let Err(e) = handler.handle_event(event.clone()).await {
                error!(event = event.name(), error = %e, "Event handler failed");
            }
        }
    }

    warn!("Event processing loop has ended");
}
