pub mod item;
pub mod parent_item;
pub mod purchase_order;
pub mod purchase_order_line_item;

pub mod prelude {
    pub use super::item::Entity as Item;
    pub use super::parent_item::Entity as ParentItem;
    pub use super::purchase_order::Entity as PurchaseOrder;
    pub use super::purchase_order_line_item::Entity as PurchaseOrderLineItem;
}
