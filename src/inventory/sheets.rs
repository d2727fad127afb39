use super::{InventoryRepository, collect_tiers};
use crate::error::{AppError, AppResult};
use crate::external::{GoogleSheetsClient, ValueInputOption};
use crate::models::{PrizeTier, Stock, default_tiers};
use crate::utils::{count_to_cell, is_header_row, parse_tier_row, tier_to_row};
use async_trait::async_trait;
use std::sync::Arc;

const HEADER: [&str; 5] = ["id", "name", "total", "remaining", "baseline"];

/// Inventory kept on a spreadsheet tab, one tier per row:
/// `id | name | total | remaining | baseline`, header in row 1.
///
/// `decrement_tier` reads the tab and then writes one cell; there is no
/// transaction spanning the two calls.
pub struct SheetsInventory {
    client: Arc<GoogleSheetsClient>,
    tab: String,
}

impl SheetsInventory {
    pub fn new(client: Arc<GoogleSheetsClient>, tab: impl Into<String>) -> Self {
        Self {
            client,
            tab: tab.into(),
        }
    }

    fn data_range(&self) -> String {
        format!("{}!A2:E", self.tab)
    }

    fn header_range(&self) -> String {
        format!("{}!A1:E1", self.tab)
    }

    async fn read_rows(&self) -> AppResult<Vec<Vec<String>>> {
        self.client
            .get_values(&self.data_range())
            .await
            .map_err(AppError::into_repository_error)
    }

    async fn write_header(&self) -> AppResult<()> {
        let header = vec![HEADER.iter().map(|h| h.to_string()).collect()];
        self.client
            .update_values(&self.header_range(), header, ValueInputOption::Raw)
            .await
    }

    async fn write_tiers(&self, tiers: &[PrizeTier]) -> AppResult<()> {
        if tiers.is_empty() {
            return Ok(());
        }
        let rows = tiers.iter().map(tier_to_row).collect();
        self.client
            .update_values(&self.data_range(), rows, ValueInputOption::Raw)
            .await
    }
}

#[async_trait]
impl InventoryRepository for SheetsInventory {
    async fn list_tiers(&self) -> AppResult<Vec<PrizeTier>> {
        let rows = self.read_rows().await?;
        let source = format!("sheet tab {}", self.tab);
        let tiers = collect_tiers(
            rows.iter()
                .filter(|row| !is_header_row(row))
                .map(|row| parse_tier_row(row)),
            &source,
        );
        if !tiers.is_empty() {
            return Ok(tiers);
        }

        // 没有可用奖品: 写入默认奖品, 否则抽中的限量奖品无法扣减
        log::warn!(
            "Inventory tab {} has no valid tiers ({} rows), writing default tiers",
            self.tab,
            rows.len()
        );
        let defaults = default_tiers();
        self.replace_tiers(&defaults)
            .await
            .map_err(AppError::into_repository_error)?;
        Ok(defaults)
    }

    async fn decrement_tier(&self, id: &str) -> AppResult<Stock> {
        let rows = self.read_rows().await?;
        // 与 list_tiers 一致: 同 id 取第一条合法行
        let (index, tier) = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.first().map(|c| c.trim()) == Some(id) && !is_header_row(row))
            .find_map(|(index, row)| parse_tier_row(row).ok().map(|tier| (index, tier)))
            .ok_or_else(|| AppError::NotFound(format!("prize tier {id}")))?;

        if tier.is_baseline {
            return Ok(tier.remaining);
        }

        match tier.remaining {
            Stock::Finite(n) if n > 0 => {
                let updated = Stock::Finite(n - 1);
                // 数据区从第 2 行开始, D 列为 remaining
                let target = format!("{}!D{}", self.tab, index + 2);
                self.client
                    .update_values(
                        &target,
                        vec![vec![count_to_cell(updated)]],
                        ValueInputOption::Raw,
                    )
                    .await
                    .map_err(AppError::into_repository_error)?;
                Ok(updated)
            }
            other => Ok(other),
        }
    }

    async fn replace_tiers(&self, tiers: &[PrizeTier]) -> AppResult<()> {
        self.write_header().await?;
        // 先清空, 避免新列表更短时残留旧行
        self.client.clear_values(&self.data_range()).await?;
        self.write_tiers(tiers).await
    }

    async fn seed(&self, tiers: &[PrizeTier]) -> AppResult<bool> {
        if let Err(e) = self.client.add_sheet(&self.tab).await {
            log::debug!("Inventory tab {} not added (likely exists): {e}", self.tab);
        }
        self.write_header().await?;

        if !self.client.get_values(&self.data_range()).await?.is_empty() {
            return Ok(false);
        }
        self.write_tiers(tiers).await?;
        log::info!(
            "Seeded {} prize tiers into {}",
            tiers.len(),
            self.client.spreadsheet_url()
        );
        Ok(true)
    }
}
