// Purchase order lifecycle
pub mod purchase_orders;

// Item catalog
pub mod catalog;

// Integrations
pub mod document_conversion;
pub mod wms;
