use sea_orm_migration::prelude::*;

use super::m20240601_000001_create_catalog_tables::Items;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::VendorName).string().not_null())
                    .col(ColumnDef::new(PurchaseOrders::OrderDate).date().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::ExpectedDeliveryDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::CreateInWms)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::WmsPurchaseOrderId)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing pages are ordered by expected delivery date.
        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_orders_expected_delivery_date")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::ExpectedDeliveryDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrderLineItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrderLineItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderLineItems::PurchaseOrderId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderLineItems::ItemId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderLineItems::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderLineItems::UnitCost)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderLineItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderLineItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_order_line_items_purchase_order_id")
                            .from(
                                PurchaseOrderLineItems::Table,
                                PurchaseOrderLineItems::PurchaseOrderId,
                            )
                            .to(PurchaseOrders::Table, PurchaseOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_order_line_items_item_id")
                            .from(PurchaseOrderLineItems::Table, PurchaseOrderLineItems::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_order_line_items_purchase_order_id")
                    .table(PurchaseOrderLineItems::Table)
                    .col(PurchaseOrderLineItems::PurchaseOrderId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseOrderLineItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PurchaseOrders {
    Table,
    Id,
    VendorName,
    OrderDate,
    ExpectedDeliveryDate,
    CreateInWms,
    WmsPurchaseOrderId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PurchaseOrderLineItems {
    Table,
    Id,
    PurchaseOrderId,
    ItemId,
    Quantity,
    UnitCost,
    CreatedAt,
    UpdatedAt,
}
