use super::{InventoryRepository, take_one};
use crate::error::{AppError, AppResult};
use crate::models::{PrizeTier, Stock, default_tiers};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// In-process store. Decrements happen under the lock, so it never oversells.
#[derive(Default)]
pub struct MemoryInventory {
    tiers: Mutex<Vec<PrizeTier>>,
}

impl MemoryInventory {
    pub fn new(tiers: Vec<PrizeTier>) -> Self {
        Self {
            tiers: Mutex::new(tiers),
        }
    }

    pub async fn snapshot(&self) -> Vec<PrizeTier> {
        self.tiers.lock().await.clone()
    }
}

#[async_trait]
impl InventoryRepository for MemoryInventory {
    async fn list_tiers(&self) -> AppResult<Vec<PrizeTier>> {
        let mut tiers = self.tiers.lock().await;
        if tiers.is_empty() {
            log::info!("Initializing in-memory prize store with default tiers");
            *tiers = default_tiers();
        }
        Ok(tiers.clone())
    }

    async fn decrement_tier(&self, id: &str) -> AppResult<Stock> {
        let mut tiers = self.tiers.lock().await;
        let tier = tiers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("prize tier {id}")))?;
        Ok(take_one(tier))
    }

    async fn replace_tiers(&self, tiers: &[PrizeTier]) -> AppResult<()> {
        *self.tiers.lock().await = tiers.to_vec();
        Ok(())
    }

    async fn seed(&self, tiers: &[PrizeTier]) -> AppResult<bool> {
        let mut current = self.tiers.lock().await;
        if !current.is_empty() {
            return Ok(false);
        }
        *current = tiers.to_vec();
        Ok(true)
    }
}
