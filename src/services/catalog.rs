use sea_orm::{EntityTrait, QueryOrder};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    db::DbPool,
    dto::catalog::{ItemResponse, ParentItemResponse},
    entities::{item, parent_item},
    errors::ServiceError,
};

/// Read-only access to the item catalog line items reference.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Parent items by name, each with its items by name.
    #[instrument(skip(self))]
    pub async fn list_parent_items(&self) -> Result<Vec<ParentItemResponse>, ServiceError> {
        let groups = parent_item::Entity::find()
            .order_by_asc(parent_item::Column::Name)
            .order_by_asc(parent_item::Column::Id)
            .find_with_related(item::Entity)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::DatabaseError)?;

        debug!(parent_items = groups.len(), "Loaded catalog groups");

        Ok(groups
            .into_iter()
            .map(|(parent, mut items)| {
                items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
                ParentItemResponse::from_parts(parent, items)
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<ItemResponse>, ServiceError> {
        let items = self.item_models().await?;
        Ok(items.into_iter().map(ItemResponse::from).collect())
    }

    /// Raw catalog rows, ordered by id.
    pub async fn item_models(&self) -> Result<Vec<item::Model>, ServiceError> {
        item::Entity::find()
            .order_by_asc(item::Column::Id)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
