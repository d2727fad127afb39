use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// 存储层约定的"无限库存"哨兵值
pub const UNLIMITED_SENTINEL: i64 = -1;

/// 库存数量: 有限 (计数) 或无限 (存储为 -1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Stock {
    Unlimited,
    Finite(u64),
}

impl Stock {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Stock::Unlimited)
    }

    pub fn finite(&self) -> Option<u64> {
        match self {
            Stock::Unlimited => None,
            Stock::Finite(n) => Some(*n),
        }
    }

    /// Any negative input collapses to unlimited; used for admin patches.
    pub fn from_lenient(raw: i64) -> Self {
        if raw < 0 {
            Stock::Unlimited
        } else {
            Stock::Finite(raw as u64)
        }
    }
}

impl TryFrom<i64> for Stock {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            UNLIMITED_SENTINEL => Ok(Stock::Unlimited),
            n if n >= 0 => Ok(Stock::Finite(n as u64)),
            n => Err(format!("invalid stock count {n}")),
        }
    }
}

impl From<Stock> for i64 {
    fn from(stock: Stock) -> Self {
        match stock {
            Stock::Unlimited => UNLIMITED_SENTINEL,
            Stock::Finite(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}

/// 奖品档位 (库存表中的一行)
/// - total / remaining: -1 表示无限
/// - baseline: 保底奖品, 永不扣减库存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PrizeTier {
    /// 奖品标识 (唯一)
    #[schema(example = "kit")]
    pub id: String,
    /// 展示名称
    #[schema(example = "Daily Ultimate Essentials Kit")]
    pub name: String,
    /// 总库存 (-1 = 无限)
    #[schema(value_type = i64, example = 10)]
    pub total: Stock,
    /// 剩余库存 (-1 = 无限)
    #[schema(value_type = i64, example = 7)]
    pub remaining: Stock,
    /// 是否保底奖品
    #[serde(default, rename = "baseline")]
    pub is_baseline: bool,
}

impl PrizeTier {
    pub fn new(id: &str, name: &str, total: Stock, remaining: Stock, is_baseline: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            total,
            remaining,
            is_baseline,
        }
    }

    /// 是否可被抽中: 保底 / 无限 / 剩余 > 0
    pub fn is_awardable(&self) -> bool {
        if self.is_baseline {
            return true;
        }
        match self.remaining {
            Stock::Unlimited => true,
            Stock::Finite(n) => n > 0,
        }
    }

    /// 是否是需要扣减库存的限量奖品
    pub fn is_consumable(&self) -> bool {
        !self.is_baseline && !self.remaining.is_unlimited()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("missing id".to_string());
        }
        if self.is_baseline {
            return Ok(());
        }
        match (self.total, self.remaining) {
            (Stock::Finite(total), Stock::Finite(remaining)) if remaining > total => Err(format!(
                "remaining {remaining} exceeds total {total} for tier {}",
                self.id
            )),
            (Stock::Finite(_), Stock::Unlimited) => Err(format!(
                "tier {} has a finite total but unlimited remaining",
                self.id
            )),
            _ => Ok(()),
        }
    }
}

/// Tier set used when a store holds no tiers yet.
pub fn default_tiers() -> Vec<PrizeTier> {
    vec![
        PrizeTier::new(
            "discount",
            "10% off first order",
            Stock::Unlimited,
            Stock::Unlimited,
            true,
        ),
        PrizeTier::new(
            "hat",
            "IM8 Limited Edition Embroidered Logo Cap",
            Stock::Finite(1000),
            Stock::Finite(1000),
            false,
        ),
        PrizeTier::new(
            "sixpack",
            "Daily Ultimate Essentials 6 Sticks Pack",
            Stock::Finite(500),
            Stock::Finite(500),
            false,
        ),
        PrizeTier::new(
            "kit",
            "Daily Ultimate Essentials Kit",
            Stock::Finite(10),
            Stock::Finite(10),
            false,
        ),
    ]
}

/// 奖品列表响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeListResponse {
    pub updated_at: DateTime<Utc>,
    pub prizes: Vec<PrizeTier>,
}

/// 单个奖品的局部更新 (按 id 合并)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PrizePatch {
    #[schema(example = "kit")]
    pub id: String,
    pub name: Option<String>,
    /// -1 = 无限
    pub total: Option<i64>,
    /// 负数视为无限, 其余按 >= 0 截断
    pub remaining: Option<i64>,
    pub baseline: Option<bool>,
}

/// 管理端批量更新奖品请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePrizesRequest {
    pub prizes: Option<Vec<PrizePatch>>,
}

/// 初始化库存请求 (不传则使用默认奖品)
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SeedRequest {
    pub prizes: Option<Vec<PrizeTier>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeedResponse {
    /// 本次是否写入了奖品
    pub seeded: bool,
    /// 当前奖品数量
    pub tiers: usize,
}
