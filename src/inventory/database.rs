use super::{InventoryRepository, collect_tiers};
use crate::entities::prize_tier_entity as tiers;
use crate::error::{AppError, AppResult};
use crate::models::{PrizeTier, Stock, default_tiers};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, UpdateMany,
};

/// Inventory in the `prize_tiers` table.
///
/// Decrement is one conditional `UPDATE ... WHERE remaining > 0`, so
/// concurrent draws can never take the same last unit.
#[derive(Clone)]
pub struct DatabaseInventory {
    pool: DatabaseConnection,
}

impl DatabaseInventory {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    fn to_active_model(tier: &PrizeTier, position: usize) -> tiers::ActiveModel {
        let now = Utc::now();
        tiers::ActiveModel {
            id: Set(tier.id.clone()),
            name: Set(tier.name.clone()),
            total: Set(i64::from(tier.total)),
            remaining: Set(i64::from(tier.remaining)),
            is_baseline: Set(tier.is_baseline),
            position: Set(position as i32),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
        }
    }

    async fn insert_all<C>(conn: &C, list: &[PrizeTier]) -> Result<(), DbErr>
    where
        C: sea_orm::ConnectionTrait,
    {
        for (position, tier) in list.iter().enumerate() {
            Self::to_active_model(tier, position).insert(conn).await?;
        }
        Ok(())
    }

    async fn load_tiers(&self) -> AppResult<Vec<PrizeTier>> {
        let rows = tiers::Entity::find()
            .order_by_asc(tiers::Column::Position)
            .order_by_asc(tiers::Column::Id)
            .all(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(collect_tiers(
            rows.into_iter().map(PrizeTier::try_from),
            "prize_tiers table",
        ))
    }

    async fn decrement_at(&self, id: &str, now: DateTime<Utc>) -> AppResult<Stock> {
        let result = decrement_query(id, now)
            .exec(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected > 1 {
            log::error!("Decrement of prize tier {id} touched {} rows", result.rows_affected);
        }

        let current = tiers::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| AppError::NotFound(format!("prize tier {id}")))?;

        Stock::try_from(current.remaining)
            .map_err(|e| AppError::RepositoryCorrupt(format!("prize tier {id}: {e}")))
    }
}

/// 原子扣减: 仅限量、非保底且剩余 > 0 的奖品
fn decrement_query(id: &str, now: DateTime<Utc>) -> UpdateMany<tiers::Entity> {
    tiers::Entity::update_many()
        .col_expr(
            tiers::Column::Remaining,
            Expr::col(tiers::Column::Remaining).sub(1),
        )
        .col_expr(tiers::Column::UpdatedAt, Expr::value(now))
        .filter(tiers::Column::Id.eq(id))
        .filter(tiers::Column::IsBaseline.eq(false))
        .filter(tiers::Column::Remaining.gt(0))
}

fn unavailable(e: DbErr) -> AppError {
    AppError::RepositoryUnavailable(e.to_string())
}

#[async_trait]
impl InventoryRepository for DatabaseInventory {
    async fn list_tiers(&self) -> AppResult<Vec<PrizeTier>> {
        let tiers = self.load_tiers().await?;
        if !tiers.is_empty() {
            return Ok(tiers);
        }

        let defaults = default_tiers();
        if self
            .seed(&defaults)
            .await
            .map_err(AppError::into_repository_error)?
        {
            return Ok(defaults);
        }

        // 表非空: 只有非法记录, 或其他实例刚完成初始化
        let tiers = self.load_tiers().await?;
        if !tiers.is_empty() {
            return Ok(tiers);
        }
        log::warn!("No valid rows in prize_tiers table, rewriting with default tiers");
        self.replace_tiers(&defaults)
            .await
            .map_err(AppError::into_repository_error)?;
        Ok(defaults)
    }

    async fn decrement_tier(&self, id: &str) -> AppResult<Stock> {
        self.decrement_at(id, Utc::now()).await
    }

    async fn replace_tiers(&self, list: &[PrizeTier]) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let deleted = tiers::Entity::delete_many().exec(&txn).await?;
        if deleted.rows_affected > list.len() as u64 {
            log::warn!(
                "Replacing {} prize_tiers rows with {} tiers",
                deleted.rows_affected,
                list.len()
            );
        }
        Self::insert_all(&txn, list).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn seed(&self, list: &[PrizeTier]) -> AppResult<bool> {
        let txn = self.pool.begin().await?;
        let existing = tiers::Entity::find().count(&txn).await?;
        if existing > 0 {
            txn.rollback().await?;
            return Ok(false);
        }
        Self::insert_all(&txn, list).await?;
        txn.commit().await?;
        log::info!("Seeded {} prize tiers into prize_tiers table", list.len());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, MockDatabase, MockExecResult, QueryTrait, Transaction, Value};
    use std::collections::BTreeMap;

    fn model(tier: &PrizeTier, position: i32) -> tiers::Model {
        tiers::Model {
            id: tier.id.clone(),
            name: tier.name.clone(),
            total: i64::from(tier.total),
            remaining: i64::from(tier.remaining),
            is_baseline: tier.is_baseline,
            position,
            created_at: None,
            updated_at: None,
        }
    }

    fn kit(remaining: i64) -> tiers::Model {
        tiers::Model {
            id: "kit".to_string(),
            name: "Kit".to_string(),
            total: 10,
            remaining,
            is_baseline: false,
            position: 1,
            created_at: None,
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn default_models() -> Vec<Vec<tiers::Model>> {
        default_tiers()
            .iter()
            .enumerate()
            .map(|(i, tier)| vec![model(tier, i as i32)])
            .collect()
    }

    #[test]
    fn test_decrement_query_is_conditional_update() {
        let sql = decrement_query("kit", Utc::now())
            .build(DbBackend::Postgres)
            .sql;
        assert!(sql.starts_with(r#"UPDATE "prize_tiers" SET "remaining" = "remaining" - "#));
        assert!(sql.contains(r#""id" = "#));
        assert!(sql.contains(r#""is_baseline" = "#));
        assert!(sql.contains(r#""remaining" > "#));
    }

    #[tokio::test]
    async fn test_decrement_runs_single_update() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([exec(1)])
            .append_query_results([vec![kit(9)]])
            .into_connection();
        let store = DatabaseInventory::new(db.clone());
        let now = Utc::now();

        assert_eq!(store.decrement_at("kit", now).await.unwrap(), Stock::Finite(9));

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
        assert_eq!(
            log[0],
            Transaction::one(decrement_query("kit", now).build(DbBackend::Postgres))
        );
    }

    #[tokio::test]
    async fn test_decrement_leaves_baseline_and_empty_rows() {
        let mut discount = kit(5);
        discount.id = "discount".to_string();
        discount.total = 5;
        discount.is_baseline = true;

        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([exec(0), exec(0)])
            .append_query_results([vec![discount], vec![kit(0)]])
            .into_connection();
        let store = DatabaseInventory::new(db);

        assert_eq!(store.decrement_tier("discount").await.unwrap(), Stock::Finite(5));
        assert_eq!(store.decrement_tier("kit").await.unwrap(), Stock::Finite(0));
    }

    #[tokio::test]
    async fn test_decrement_unknown_tier_is_not_found() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_exec_results([exec(0)])
            .append_query_results([Vec::<tiers::Model>::new()])
            .into_connection();
        let store = DatabaseInventory::new(db);

        assert!(matches!(
            store.decrement_tier("ghost").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_keeps_first_valid_row() {
        let mut broken = kit(50);
        broken.position = 0;
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![broken, kit(4), kit(7)]])
            .into_connection();
        let store = DatabaseInventory::new(db);

        let tiers = store.list_tiers().await.unwrap();
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].remaining, Stock::Finite(4));
    }

    #[tokio::test]
    async fn test_list_empty_table_seeds_defaults() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<tiers::Model>::new()])
            .append_query_results([vec![count_row(0)]])
            .append_query_results(default_models())
            .into_connection();
        let store = DatabaseInventory::new(db.clone());

        assert_eq!(store.list_tiers().await.unwrap(), default_tiers());

        let log = format!("{:?}", db.into_transaction_log());
        assert_eq!(log.matches("INSERT INTO").count(), default_tiers().len());
    }

    #[tokio::test]
    async fn test_list_invalid_rows_are_replaced() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![kit(50)]])
            .append_query_results([vec![count_row(1)]])
            .append_query_results([vec![kit(50)]])
            .append_exec_results([exec(1)])
            .append_query_results(default_models())
            .into_connection();
        let store = DatabaseInventory::new(db);

        assert_eq!(store.list_tiers().await.unwrap(), default_tiers());
    }
}
