use crate::config::DrawConfig;
use crate::models::{PrizeTier, Stock};
use rand::Rng;

/// 抽奖权重策略
///
/// - 保底奖品: `baseline_weight` (默认 1000)
/// - 无限库存的普通奖品: `unlimited_weight` (默认 1)
/// - 限量奖品: 剩余库存, 截断到 `[1, max_tier_weight]`
///
/// A zero baseline weight means the baseline is only awarded once nothing
/// else is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightPolicy {
    pub baseline_weight: u64,
    pub unlimited_weight: u64,
    pub max_tier_weight: u64,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self::from(&DrawConfig::default())
    }
}

impl From<&DrawConfig> for WeightPolicy {
    fn from(config: &DrawConfig) -> Self {
        Self {
            baseline_weight: config.baseline_weight,
            unlimited_weight: config.unlimited_weight,
            max_tier_weight: config.max_tier_weight.max(1),
        }
    }
}

impl WeightPolicy {
    pub fn weight_of(&self, tier: &PrizeTier) -> u64 {
        // 先判断保底, 保底奖品不看库存
        if tier.is_baseline {
            return self.baseline_weight;
        }
        match tier.remaining {
            Stock::Unlimited => self.unlimited_weight,
            Stock::Finite(0) => 0,
            Stock::Finite(n) => n.clamp(1, self.max_tier_weight),
        }
    }

    /// Pick one candidate with probability proportional to its weight.
    ///
    /// Candidates are expected to be awardable already. When every weight is
    /// zero the first candidate wins.
    pub fn choose<'a, R>(&self, candidates: &[&'a PrizeTier], rng: &mut R) -> Option<&'a PrizeTier>
    where
        R: Rng + ?Sized,
    {
        let weights: Vec<u64> = candidates.iter().map(|t| self.weight_of(t)).collect();
        let total = weights.iter().fold(0u64, |sum, w| sum.saturating_add(*w));
        if total == 0 {
            return candidates.first().copied();
        }

        let point = rng.gen_range(0..total);
        let mut acc = 0u64;
        for (tier, weight) in candidates.iter().zip(&weights) {
            acc = acc.saturating_add(*weight);
            if point < acc {
                return Some(*tier);
            }
        }
        candidates.last().copied()
    }
}
