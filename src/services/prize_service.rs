use crate::error::{AppError, AppResult};
use crate::inventory::InventoryRepository;
use crate::models::{
    PrizeListResponse, PrizePatch, PrizeTier, SeedRequest, SeedResponse, Stock,
    UpdatePrizesRequest, default_tiers,
};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

/// 奖品库存管理 (列表 / 管理端更新 / 初始化)
#[derive(Clone)]
pub struct PrizeService {
    inventory: Arc<dyn InventoryRepository>,
}

impl PrizeService {
    pub fn new(inventory: Arc<dyn InventoryRepository>) -> Self {
        Self { inventory }
    }

    pub async fn list_prizes(&self) -> AppResult<PrizeListResponse> {
        let prizes = self.inventory.list_tiers().await?;
        Ok(PrizeListResponse {
            updated_at: Utc::now(),
            prizes,
        })
    }

    /// 管理端更新: 按 id 合并后整体写回
    ///
    /// The current set is read and then replaced as a whole. A decrement
    /// committed between the two calls is overwritten, and stored rows that
    /// failed validation on read are dropped by the rewrite.
    pub async fn update_prizes(&self, request: UpdatePrizesRequest) -> AppResult<PrizeListResponse> {
        let patches = match request.prizes {
            Some(patches) if !patches.is_empty() => patches,
            _ => return Err(AppError::ValidationError("prizes array required".to_string())),
        };

        let current = self.inventory.list_tiers().await?;
        let merged = apply_patches(current, &patches);
        validate_tier_set(&merged)?;

        self.inventory.replace_tiers(&merged).await?;
        log::info!("Prize inventory updated: {} patches, {} tiers", patches.len(), merged.len());

        Ok(PrizeListResponse {
            updated_at: Utc::now(),
            prizes: merged,
        })
    }

    pub async fn seed(&self, request: SeedRequest) -> AppResult<SeedResponse> {
        let tiers = match request.prizes {
            Some(tiers) if !tiers.is_empty() => tiers,
            _ => default_tiers(),
        };
        validate_tier_set(&tiers)?;

        let seeded = self.inventory.seed(&tiers).await?;
        if !seeded {
            log::info!("Prize inventory already initialized, seed skipped");
        }
        let current = self.inventory.list_tiers().await?;
        Ok(SeedResponse {
            seeded,
            tiers: current.len(),
        })
    }
}

/// Merge patches into `tiers` by id, keeping order; unknown ids are appended.
pub fn apply_patches(mut tiers: Vec<PrizeTier>, patches: &[PrizePatch]) -> Vec<PrizeTier> {
    for patch in patches {
        let id = patch.id.trim();
        let index = match tiers.iter().position(|t| t.id == id) {
            Some(index) => index,
            None => {
                tiers.push(PrizeTier::new(id, "", Stock::Finite(0), Stock::Finite(0), false));
                tiers.len() - 1
            }
        };
        let tier = &mut tiers[index];

        if let Some(name) = &patch.name {
            tier.name = name.clone();
        }
        if let Some(total) = patch.total {
            tier.total = Stock::from_lenient(total);
        }
        if let Some(remaining) = patch.remaining {
            tier.remaining = Stock::from_lenient(remaining);
        }
        if let Some(baseline) = patch.baseline {
            tier.is_baseline = baseline;
        }
    }
    tiers
}

/// 每个奖品合法, id 唯一, 至多一个保底
pub fn validate_tier_set(tiers: &[PrizeTier]) -> AppResult<()> {
    let mut ids = HashSet::new();
    for tier in tiers {
        tier.validate().map_err(AppError::ValidationError)?;
        if !ids.insert(tier.id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "duplicate prize id {}",
                tier.id
            )));
        }
    }
    if tiers.iter().filter(|t| t.is_baseline).count() > 1 {
        return Err(AppError::ValidationError(
            "at most one baseline prize is allowed".to_string(),
        ));
    }
    Ok(())
}
