use sea_orm_migration::prelude::*;

/// Draw Entries (抽奖审计记录, 只追加)
#[derive(DeriveIden)]
enum DrawEntries {
    Table,
    Id,
    DrawId,
    FirstName,
    LastName,
    Email,
    PrizeId,
    PrizeName,
    IsBaseline,
    DrawnAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DrawEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrawEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DrawEntries::DrawId).uuid().not_null())
                    .col(
                        ColumnDef::new(DrawEntries::FirstName)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DrawEntries::LastName)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DrawEntries::Email)
                            .string_len(320)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DrawEntries::PrizeId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DrawEntries::PrizeName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DrawEntries::IsBaseline)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DrawEntries::DrawnAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // draw_id 唯一, 审计重试时不会重复写入
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_entries_draw_id_unique")
                    .table(DrawEntries::Table)
                    .col(DrawEntries::DrawId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_entries_drawn_at")
                    .table(DrawEntries::Table)
                    .col(DrawEntries::DrawnAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DrawEntries::Table).to_owned())
            .await
    }
}
