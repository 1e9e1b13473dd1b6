use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;

pub mod purchase_order_queries;

/// Trait representing a generic asynchronous query.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    /// Executes the query using the provided database pool.
    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}
