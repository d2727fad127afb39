//! Prize inventory stores.
//!
//! Every backing technology implements [`InventoryRepository`]; the draw engine
//! only ever sees the trait object. Atomicity of `decrement_tier` differs per
//! store:
//! - `DatabaseInventory`: single conditional `UPDATE`, no oversell.
//! - `MemoryInventory`: mutex guarded, no oversell.
//! - `FileInventory`: read-modify-write under a process-local lock; separate
//!   processes sharing the file can still race.
//! - `SheetsInventory`: read then write over two API round-trips; concurrent
//!   draws on the last unit can oversell by the number of requests in flight.

pub mod database;
pub mod file;
pub mod memory;
pub mod sheets;

pub use database::DatabaseInventory;
pub use file::FileInventory;
pub use memory::MemoryInventory;
pub use sheets::SheetsInventory;

use crate::error::AppResult;
use crate::models::{PrizeTier, Stock};
use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Current tier set.
    ///
    /// A store with no valid tiers is initialized with [`default_tiers`](crate::models::default_tiers) and
    /// the persisted set is returned, so every listed finite tier can be
    /// decremented afterwards.
    async fn list_tiers(&self) -> AppResult<Vec<PrizeTier>>;

    /// Take one unit of a finite, non-baseline tier and return the new remaining
    /// count. Baseline, unlimited and exhausted tiers are left untouched and
    /// their current count is returned. Fails with `NotFound` for unknown ids.
    async fn decrement_tier(&self, id: &str) -> AppResult<Stock>;

    /// Overwrite the whole tier set (admin edits).
    async fn replace_tiers(&self, tiers: &[PrizeTier]) -> AppResult<()>;

    /// Write `tiers` only if the store holds none yet. Returns whether it wrote.
    async fn seed(&self, tiers: &[PrizeTier]) -> AppResult<bool>;
}

/// 扣减单个奖品库存, 返回扣减后的剩余数量
pub(crate) fn take_one(tier: &mut PrizeTier) -> Stock {
    if tier.is_baseline {
        return tier.remaining;
    }
    if let Stock::Finite(n) = tier.remaining
        && n > 0
    {
        tier.remaining = Stock::Finite(n - 1);
    }
    tier.remaining
}

/// Keep parseable, unique rows; the first valid row wins for a repeated id.
/// Rejected rows are logged and skipped. May return an empty set, in which
/// case the store falls back to [`default_tiers`](crate::models::default_tiers) and persists them.
pub(crate) fn collect_tiers<I>(rows: I, source: &str) -> Vec<PrizeTier>
where
    I: IntoIterator<Item = Result<PrizeTier, String>>,
{
    let mut seen = HashSet::new();
    let mut tiers = Vec::new();
    let mut rejected = 0usize;

    for (index, row) in rows.into_iter().enumerate() {
        match row {
            Ok(tier) if !seen.insert(tier.id.clone()) => {
                log::warn!("Skipping duplicate prize tier {} in {source}", tier.id);
                rejected += 1;
            }
            Ok(tier) => tiers.push(tier),
            Err(e) => {
                log::warn!("Skipping malformed prize row {index} in {source}: {e}");
                rejected += 1;
            }
        }
    }

    if tiers.is_empty() && rejected > 0 {
        log::warn!("No valid prize tiers in {source}, {rejected} rows rejected");
    }
    tiers
}
