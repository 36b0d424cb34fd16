use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Projects::Table)
                    .col(pk_id_col(manager, Projects::Id))
                    .col(uuid_col(Projects::Uuid))
                    .col(ColumnDef::new(Projects::Code).string_len(50).not_null())
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Client).string().not_null())
                    .col(ColumnDef::new(Projects::Group).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Projects::Status)
                            .string_len(20)
                            .not_null()
                            .default(Expr::val("draft")),
                    )
                    .col(ColumnDef::new(Projects::StartDate).date().not_null())
                    .col(ColumnDef::new(Projects::EndDate).date().not_null())
                    .col(ColumnDef::new(Projects::DriveFolderUrl).text())
                    .col(timestamp_col(Projects::CreatedAt))
                    .col(timestamp_col(Projects::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_projects_uuid")
                    .table(Projects::Table)
                    .col(Projects::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_projects_code")
                    .table(Projects::Table)
                    .col(Projects::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_projects_status")
                    .table(Projects::Table)
                    .col(Projects::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Methodologies::Table)
                    .col(pk_id_col(manager, Methodologies::Id))
                    .col(ColumnDef::new(Methodologies::Code).string_len(10).not_null())
                    .col(ColumnDef::new(Methodologies::Name).string().not_null())
                    .col(ColumnDef::new(Methodologies::Category).string_len(20).not_null())
                    .col(ColumnDef::new(Methodologies::Description).text())
                    .col(ColumnDef::new(Methodologies::TypicalEffortHours).integer())
                    .col(
                        ColumnDef::new(Methodologies::RequiresDetails)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_methodologies_name")
                    .table(Methodologies::Table)
                    .col(Methodologies::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_methodologies_code")
                    .table(Methodologies::Table)
                    .col(Methodologies::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Methodologies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Uuid,
    Code,
    Name,
    Client,
    Group,
    Status,
    StartDate,
    EndDate,
    DriveFolderUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Methodologies {
    Table,
    Id,
    Code,
    Name,
    Category,
    Description,
    TypicalEffortHours,
    RequiresDetails,
}
