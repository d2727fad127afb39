use crate::audit::{AuditSink, DatabaseAuditSink, FileAuditSink, LogAuditSink, SheetsAuditSink};
use crate::config::{Config, StorageBackend};
use crate::database::{create_pool, run_migrations};
use crate::error::AppResult;
use crate::external::GoogleSheetsClient;
use crate::inventory::{
    DatabaseInventory, FileInventory, InventoryRepository, MemoryInventory, SheetsInventory,
};
use std::sync::Arc;

/// Inventory store plus the ledger that goes with it.
#[derive(Clone)]
pub struct Storage {
    pub inventory: Arc<dyn InventoryRepository>,
    pub audit: Arc<dyn AuditSink>,
}

/// 根据配置选择存储后端
pub async fn build(config: &Config) -> AppResult<Storage> {
    let storage = match config.storage.backend {
        StorageBackend::File => Storage {
            inventory: Arc::new(FileInventory::new(&config.storage.prizes_file)),
            audit: Arc::new(FileAuditSink::new(&config.storage.entries_file)),
        },
        StorageBackend::Sheets => {
            let client = Arc::new(GoogleSheetsClient::new(config.google.clone())?);
            log::info!("Using spreadsheet {}", client.spreadsheet_url());
            Storage {
                inventory: Arc::new(SheetsInventory::new(
                    client.clone(),
                    config.google.inventory_tab.clone(),
                )),
                audit: Arc::new(SheetsAuditSink::new(
                    client,
                    config.google.entries_range.clone(),
                )),
            }
        }
        StorageBackend::Database => {
            let pool = create_pool(&config.database).await?;
            run_migrations(&pool).await?;
            Storage {
                inventory: Arc::new(DatabaseInventory::new(pool.clone())),
                audit: Arc::new(DatabaseAuditSink::new(pool)),
            }
        }
        StorageBackend::Memory => {
            log::warn!("Memory storage selected; inventory is lost on restart");
            Storage {
                inventory: Arc::new(MemoryInventory::default()),
                audit: Arc::new(LogAuditSink),
            }
        }
    };

    log::info!("Storage backend: {:?}", config.storage.backend);
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.prizes_file = dir.path().join("prizes.json").display().to_string();
        config.storage.entries_file = dir.path().join("entries.jsonl").display().to_string();

        let storage = build(&config).await.unwrap();
        let tiers = storage.inventory.list_tiers().await.unwrap();
        assert_eq!(tiers, crate::models::default_tiers());
        assert!(dir.path().join("prizes.json").exists());
    }

    #[tokio::test]
    async fn test_build_memory_backend() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;

        let storage = build(&config).await.unwrap();
        assert!(storage.inventory.seed(&crate::models::default_tiers()).await.unwrap());
    }
}
