pub mod create_purchase_order_command;
pub mod delete_purchase_order_command;
pub mod update_purchase_order_command;

pub use create_purchase_order_command::CreatePurchaseOrderCommand;
pub use delete_purchase_order_command::DeletePurchaseOrderCommand;
pub use update_purchase_order_command::{
    LineItemAction, ReconciliationSummary, UpdatePurchaseOrderCommand, UpdatePurchaseOrderResult,
};

use crate::errors::ServiceError;
use sea_orm::TransactionError;

pub(crate) fn not_found(purchase_order_id: i32) -> ServiceError {
    ServiceError::NotFound(format!(
        "Purchase Order with ID {} not found",
        purchase_order_id
    ))
}

pub(crate) fn flatten_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
