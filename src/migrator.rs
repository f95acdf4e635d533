use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_catalog_tables::Migration),
            Box::new(m20250101_000002_create_purchase_request_tables::Migration),
            Box::new(m20250101_000003_create_stocks_table::Migration),
            Box::new(m20250101_000004_seed_catalog::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Warehouses {
        Table,
        Id,
        Name,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        Sku,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000002_create_purchase_request_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_purchase_request_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseRequests::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequests::Reference)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequests::WarehouseId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequests::Status)
                                .string_len(16)
                                .not_null()
                                .default("DRAFT"),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_requests_warehouse")
                                .from(PurchaseRequests::Table, PurchaseRequests::WarehouseId)
                                .to(
                                    super::m20250101_000001_create_catalog_tables::Warehouses::Table,
                                    super::m20250101_000001_create_catalog_tables::Warehouses::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseRequestItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseRequestItems::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequestItems::PurchaseRequestId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequestItems::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequestItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequestItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseRequestItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_request_items_header")
                                .from(
                                    PurchaseRequestItems::Table,
                                    PurchaseRequestItems::PurchaseRequestId,
                                )
                                .to(PurchaseRequests::Table, PurchaseRequests::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_request_items_product")
                                .from(
                                    PurchaseRequestItems::Table,
                                    PurchaseRequestItems::ProductId,
                                )
                                .to(
                                    super::m20250101_000001_create_catalog_tables::Products::Table,
                                    super::m20250101_000001_create_catalog_tables::Products::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_request_items_header")
                        .table(PurchaseRequestItems::Table)
                        .col(PurchaseRequestItems::PurchaseRequestId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseRequestItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseRequests {
        Table,
        Id,
        Reference,
        WarehouseId,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseRequestItems {
        Table,
        Id,
        PurchaseRequestId,
        ProductId,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000003_create_stocks_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_stocks_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Stocks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Stocks::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Stocks::WarehouseId).big_integer().not_null())
                        .col(ColumnDef::new(Stocks::ProductId).big_integer().not_null())
                        .col(
                            ColumnDef::new(Stocks::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Stocks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Stocks::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stocks_warehouse")
                                .from(Stocks::Table, Stocks::WarehouseId)
                                .to(
                                    super::m20250101_000001_create_catalog_tables::Warehouses::Table,
                                    super::m20250101_000001_create_catalog_tables::Warehouses::Id,
                                ),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stocks_product")
                                .from(Stocks::Table, Stocks::ProductId)
                                .to(
                                    super::m20250101_000001_create_catalog_tables::Products::Table,
                                    super::m20250101_000001_create_catalog_tables::Products::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            // One counter per (warehouse, product) pair.
            manager
                .create_index(
                    Index::create()
                        .name("idx_stocks_warehouse_product")
                        .table(Stocks::Table)
                        .col(Stocks::WarehouseId)
                        .col(Stocks::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Stocks::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Stocks {
        Table,
        Id,
        WarehouseId,
        ProductId,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000004_seed_catalog {
    use crate::entities::{product, warehouse};
    use chrono::Utc;
    use sea_orm::{EntityTrait, PaginatorTrait, Set};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_seed_catalog"
        }
    }

    const WAREHOUSES: &[&str] = &[
        "Central Warehouse Jakarta",
        "Branch Warehouse Surabaya",
        "Branch Warehouse Bandung",
    ];

    const PRODUCTS: &[(&str, &str)] = &[
        ("Icy Mint", "ICYMINT"),
        ("Apple Berry", "APPLEBERRY"),
        ("Icy Watermelon", "ICYWATERMELON"),
        ("Grape Fusion", "GRAPEFUSION"),
        ("Mango Tango", "MANGOTANGO"),
        ("Strawberry Blast", "STRAWBERRYBLAST"),
        ("Lemon Zest", "LEMONZEST"),
        ("Peach Paradise", "PEACHPARADISE"),
        ("Blueberry Chill", "BLUEBERRYCHILL"),
        ("Tropical Mix", "TROPICALMIX"),
    ];

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let db = manager.get_connection();
            let now = Utc::now();

            // Idempotent against partially-seeded databases.
            if warehouse::Entity::find().count(db).await? == 0 {
                let rows = WAREHOUSES.iter().map(|name| warehouse::ActiveModel {
                    name: Set((*name).to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                });
                warehouse::Entity::insert_many(rows).exec(db).await?;
            }

            if product::Entity::find().count(db).await? == 0 {
                let rows = PRODUCTS.iter().map(|(name, sku)| product::ActiveModel {
                    name: Set((*name).to_string()),
                    sku: Set((*sku).to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                });
                product::Entity::insert_many(rows).exec(db).await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let db = manager.get_connection();
            product::Entity::delete_many().exec(db).await?;
            warehouse::Entity::delete_many().exec(db).await?;
            Ok(())
        }
    }
}
