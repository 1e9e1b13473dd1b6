use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use std::sync::Arc;

/// A write operation on purchase orders.
///
/// Commands own their payload, run their writes in one transaction and publish an
/// [`Event`](crate::events::Event) once the change is committed.
#[async_trait]
pub trait Command: Send + Sync {
    type Result;

    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod purchaseorders;
