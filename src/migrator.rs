use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_procurement_requests_table::Migration),
            Box::new(m20250301_000002_create_line_items_table::Migration),
            Box::new(m20250301_000003_create_documents_table::Migration),
        ]
    }
}

mod m20250301_000001_create_procurement_requests_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_procurement_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProcurementRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProcurementRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::RequestNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::FranchiseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::FranchiseName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProcurementRequests::OwnerName).string().null())
                        .col(ColumnDef::new(ProcurementRequests::VendorId).uuid().null())
                        .col(
                            ColumnDef::new(ProcurementRequests::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::TotalQuotedAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::ActualWeight)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::ReceivedValue)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::DamagedLoss)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::NetSettlement)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::DiscrepancyFlag)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::ReceiptRecordedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(ProcurementRequests::Notes).string().null())
                        .col(
                            ColumnDef::new(ProcurementRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_procurement_requests_franchise")
                        .table(ProcurementRequests::Table)
                        .col(ProcurementRequests::FranchiseId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_procurement_requests_vendor_status")
                        .table(ProcurementRequests::Table)
                        .col(ProcurementRequests::VendorId)
                        .col(ProcurementRequests::Status)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProcurementRequests::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum ProcurementRequests {
        Table,
        Id,
        RequestNumber,
        FranchiseId,
        FranchiseName,
        OwnerName,
        VendorId,
        Status,
        TotalQuotedAmount,
        ActualWeight,
        ReceivedValue,
        DamagedLoss,
        NetSettlement,
        DiscrepancyFlag,
        ReceiptRecordedAt,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_line_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_line_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(LineItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(LineItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(LineItems::RequestId).uuid().not_null())
                        .col(ColumnDef::new(LineItems::LineNumber).integer().not_null())
                        .col(ColumnDef::new(LineItems::Name).string().not_null())
                        .col(ColumnDef::new(LineItems::Unit).string().not_null())
                        .col(ColumnDef::new(LineItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(LineItems::QuotedPrice).decimal().null())
                        .col(
                            ColumnDef::new(LineItems::Packed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(LineItems::ReceivedQuantity).integer().null())
                        .col(ColumnDef::new(LineItems::DamagedQuantity).integer().null())
                        .col(
                            ColumnDef::new(LineItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LineItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_line_items_request")
                                .from(LineItems::Table, LineItems::RequestId)
                                .to(
                                    super::m20250301_000001_create_procurement_requests_table::ProcurementRequests::Table,
                                    super::m20250301_000001_create_procurement_requests_table::ProcurementRequests::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("uidx_line_items_request_line")
                        .table(LineItems::Table)
                        .col(LineItems::RequestId)
                        .col(LineItems::LineNumber)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LineItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum LineItems {
        #[iden = "procurement_line_items"]
        Table,
        Id,
        RequestId,
        LineNumber,
        Name,
        Unit,
        Quantity,
        QuotedPrice,
        Packed,
        ReceivedQuantity,
        DamagedQuantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000003_create_documents_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_documents_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Documents::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Documents::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Documents::DocumentNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Documents::RequestId).uuid().not_null())
                        .col(ColumnDef::new(Documents::DocType).string_len(16).not_null())
                        .col(ColumnDef::new(Documents::Sequence).integer().not_null())
                        .col(ColumnDef::new(Documents::Payload).json().not_null())
                        .col(
                            ColumnDef::new(Documents::GeneratedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_documents_request")
                                .from(Documents::Table, Documents::RequestId)
                                .to(
                                    super::m20250301_000001_create_procurement_requests_table::ProcurementRequests::Table,
                                    super::m20250301_000001_create_procurement_requests_table::ProcurementRequests::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            // Idempotent generation races resolve on this index: the loser's
            // insert fails and it re-reads the winner's row.
            manager
                .create_index(
                    Index::create()
                        .name("uidx_documents_request_type_seq")
                        .table(Documents::Table)
                        .col(Documents::RequestId)
                        .col(Documents::DocType)
                        .col(Documents::Sequence)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Documents::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Documents {
        Table,
        Id,
        DocumentNumber,
        RequestId,
        DocType,
        Sequence,
        Payload,
        GeneratedAt,
    }
}
