use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{PrizeTier, Stock};

/// 奖品库存实体
/// 说明:
/// - total / remaining: -1 表示无限库存, 不参与扣减
/// - is_baseline: 保底奖品, 永不扣减
/// - position: 展示顺序
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prize_tiers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub total: i64,
    pub remaining: i64,
    pub is_baseline: bool,
    pub position: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<Model> for PrizeTier {
    type Error = String;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let tier = PrizeTier {
            id: m.id,
            name: m.name,
            total: Stock::try_from(m.total)?,
            remaining: Stock::try_from(m.remaining)?,
            is_baseline: m.is_baseline,
        };
        tier.validate()?;
        Ok(tier)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
