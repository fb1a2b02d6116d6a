use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_account_tables::Migration),
            Box::new(m20240601_000002_create_lots_table::Migration),
            Box::new(m20240601_000003_create_tracking_events_table::Migration),
            Box::new(m20240601_000004_create_transport_tables::Migration),
        ]
    }
}

mod m20240601_000001_create_account_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_account_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Producers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Producers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Producers::Name).string().not_null())
                        .col(
                            ColumnDef::new(Producers::NationalId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Producers::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Producers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Transporters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transporters::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Transporters::Name).string().not_null())
                        .col(
                            ColumnDef::new(Transporters::NationalId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Transporters::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Transporters::Phone).string().null())
                        .col(ColumnDef::new(Transporters::VehicleType).string().null())
                        .col(ColumnDef::new(Transporters::Plate).string().null())
                        .col(ColumnDef::new(Transporters::Capacity).string().null())
                        .col(ColumnDef::new(Transporters::ServiceCity).string().null())
                        .col(ColumnDef::new(Transporters::ServiceState).string().null())
                        .col(ColumnDef::new(Transporters::Notes).text().null())
                        .col(
                            ColumnDef::new(Transporters::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transporters_name")
                        .table(Transporters::Table)
                        .col(Transporters::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Administrators::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Administrators::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Administrators::Name).string().not_null())
                        .col(
                            ColumnDef::new(Administrators::NationalId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Administrators::PasswordHash)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Administrators::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Administrators::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Transporters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Producers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Producers {
        Table,
        Id,
        Name,
        NationalId,
        PasswordHash,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Transporters {
        Table,
        Id,
        Name,
        NationalId,
        PasswordHash,
        Phone,
        VehicleType,
        Plate,
        Capacity,
        ServiceCity,
        ServiceState,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Administrators {
        Table,
        Id,
        Name,
        NationalId,
        PasswordHash,
        CreatedAt,
    }
}

mod m20240601_000002_create_lots_table {

    use super::m20240601_000001_create_account_tables::Producers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_lots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Lots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Lots::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Lots::ProducerId).integer().not_null())
                        .col(ColumnDef::new(Lots::Product).string().not_null())
                        .col(ColumnDef::new(Lots::Quantity).double().not_null())
                        .col(ColumnDef::new(Lots::HarvestDate).date().not_null())
                        .col(ColumnDef::new(Lots::ProductionLocation).string().null())
                        .col(
                            ColumnDef::new(Lots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Lots::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_lots_producer_id")
                                .from(Lots::Table, Lots::ProducerId)
                                .to(Producers::Table, Producers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_lots_producer_harvest_date")
                        .table(Lots::Table)
                        .col(Lots::ProducerId)
                        .col(Lots::HarvestDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Lots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Lots {
        Table,
        Id,
        ProducerId,
        Product,
        Quantity,
        HarvestDate,
        ProductionLocation,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000003_create_tracking_events_table {

    use super::m20240601_000001_create_account_tables::Transporters;
    use super::m20240601_000002_create_lots_table::Lots;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_tracking_events_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TrackingEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TrackingEvents::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TrackingEvents::LotId).integer().not_null())
                        .col(ColumnDef::new(TrackingEvents::Status).string().not_null())
                        .col(ColumnDef::new(TrackingEvents::Description).text().null())
                        .col(ColumnDef::new(TrackingEvents::Location).string().not_null())
                        .col(ColumnDef::new(TrackingEvents::TransporterId).integer().null())
                        .col(
                            ColumnDef::new(TrackingEvents::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tracking_events_lot_id")
                                .from(TrackingEvents::Table, TrackingEvents::LotId)
                                .to(Lots::Table, Lots::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tracking_events_transporter_id")
                                .from(TrackingEvents::Table, TrackingEvents::TransporterId)
                                .to(Transporters::Table, Transporters::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tracking_events_lot_recorded_at")
                        .table(TrackingEvents::Table)
                        .col(TrackingEvents::LotId)
                        .col(TrackingEvents::RecordedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TrackingEvents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TrackingEvents {
        Table,
        Id,
        LotId,
        Status,
        Description,
        Location,
        TransporterId,
        RecordedAt,
    }
}

mod m20240601_000004_create_transport_tables {

    use super::m20240601_000001_create_account_tables::{Producers, Transporters};
    use super::m20240601_000002_create_lots_table::Lots;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_transport_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Transports::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transports::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Transports::ProducerId).integer().not_null())
                        .col(ColumnDef::new(Transports::TransporterId).integer().not_null())
                        .col(ColumnDef::new(Transports::Destination).string().not_null())
                        .col(ColumnDef::new(Transports::Status).string().not_null())
                        .col(
                            ColumnDef::new(Transports::DepartedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transports::ArrivedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Transports::Description).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transports_producer_id")
                                .from(Transports::Table, Transports::ProducerId)
                                .to(Producers::Table, Producers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transports_transporter_id")
                                .from(Transports::Table, Transports::TransporterId)
                                .to(Transporters::Table, Transporters::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transports_producer_id")
                        .table(Transports::Table)
                        .col(Transports::ProducerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transports_transporter_id")
                        .table(Transports::Table)
                        .col(Transports::TransporterId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TransportLots::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(TransportLots::TransportId).integer().not_null())
                        .col(ColumnDef::new(TransportLots::LotId).integer().not_null())
                        .primary_key(
                            Index::create()
                                .col(TransportLots::TransportId)
                                .col(TransportLots::LotId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transport_lots_transport_id")
                                .from(TransportLots::Table, TransportLots::TransportId)
                                .to(Transports::Table, Transports::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_transport_lots_lot_id")
                                .from(TransportLots::Table, TransportLots::LotId)
                                .to(Lots::Table, Lots::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_transport_lots_lot_id")
                        .table(TransportLots::Table)
                        .col(TransportLots::LotId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TransportLots::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Transports::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Transports {
        Table,
        Id,
        ProducerId,
        TransporterId,
        Destination,
        Status,
        DepartedAt,
        ArrivedAt,
        Description,
    }

    #[derive(DeriveIden)]
    enum TransportLots {
        Table,
        TransportId,
        LotId,
    }
}
