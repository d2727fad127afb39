use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 抽奖审计记录实体 (只追加)
/// - prize_name 冗余存储, 奖品改名后仍可回溯
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "draw_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub draw_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub prize_id: String,
    pub prize_name: String,
    pub is_baseline: bool,
    pub drawn_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
