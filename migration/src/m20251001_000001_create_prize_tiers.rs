use sea_orm_migration::prelude::*;

/// Prize Tiers (奖品库存表)
#[derive(DeriveIden)]
enum PrizeTiers {
    Table,
    Id,
    Name,
    Total,
    Remaining,
    IsBaseline,
    Position,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// total / remaining 使用 -1 表示无限库存
/// 扣减依赖 `remaining > 0` 条件更新, 因此额外加 CHECK 约束防止出现 -1 以外的负数
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PrizeTiers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrizeTiers::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PrizeTiers::Name)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PrizeTiers::Total)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(PrizeTiers::Total).gte(-1)),
                    )
                    .col(
                        ColumnDef::new(PrizeTiers::Remaining)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(PrizeTiers::Remaining).gte(-1)),
                    )
                    .col(
                        ColumnDef::new(PrizeTiers::IsBaseline)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PrizeTiers::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PrizeTiers::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(PrizeTiers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 至多一个保底奖品
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_prize_tiers_single_baseline \
                 ON prize_tiers (is_baseline) WHERE is_baseline",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PrizeTiers::Table).to_owned())
            .await
    }
}
