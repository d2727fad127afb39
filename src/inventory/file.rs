use super::{InventoryRepository, collect_tiers, take_one};
use crate::error::{AppError, AppResult};
use crate::models::{PrizeTier, Stock, default_tiers};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// 本地 JSON 库存文件格式: { "updatedAt": ..., "prizes": [...] }
#[derive(Debug, Serialize, Deserialize)]
struct InventoryDocument {
    #[serde(rename = "updatedAt", default)]
    updated_at: Option<DateTime<Utc>>,
    /// 保留原始 JSON, 单条损坏不影响其它奖品
    #[serde(default)]
    prizes: Vec<Value>,
}

impl InventoryDocument {
    fn from_tiers(tiers: &[PrizeTier]) -> AppResult<Self> {
        let prizes = tiers
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            updated_at: Some(Utc::now()),
            prizes,
        })
    }
}

/// Inventory persisted as a JSON document on local disk.
///
/// The file is created with the default tier set on first access. All access
/// goes through one async mutex, so decrements are atomic within a process.
pub struct FileInventory {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Caller must hold `self.lock`. `None` when the file does not exist yet.
    async fn read_document(&self) -> AppResult<Option<InventoryDocument>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::RepositoryUnavailable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw).map(Some).map_err(|e| {
            AppError::RepositoryCorrupt(format!("cannot parse {}: {e}", self.path.display()))
        })
    }

    /// Caller must hold `self.lock`. Writes a sibling temp file then renames it over.
    async fn write_document(&self, mut document: InventoryDocument) -> AppResult<()> {
        document.updated_at = Some(Utc::now());
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::RepositoryUnavailable(e.to_string()))?;
        }
        let body = serde_json::to_string_pretty(&document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| AppError::RepositoryUnavailable(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::RepositoryUnavailable(e.to_string()))?;
        Ok(())
    }

    fn parse_prizes(&self, document: &InventoryDocument) -> Vec<PrizeTier> {
        let source = self.path.display().to_string();
        collect_tiers(document.prizes.iter().map(parse_entry), &source)
    }

    /// Caller must hold `self.lock`.
    async fn write_defaults(&self) -> AppResult<Vec<PrizeTier>> {
        let tiers = default_tiers();
        self.write_document(InventoryDocument::from_tiers(&tiers)?)
            .await?;
        Ok(tiers)
    }
}

fn parse_entry(value: &Value) -> Result<PrizeTier, String> {
    let tier: PrizeTier = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
    tier.validate()?;
    Ok(tier)
}

#[async_trait]
impl InventoryRepository for FileInventory {
    async fn list_tiers(&self) -> AppResult<Vec<PrizeTier>> {
        let _guard = self.lock.lock().await;
        let Some(document) = self.read_document().await? else {
            log::info!(
                "Initializing prize store at {} with default tiers",
                self.path.display()
            );
            return self.write_defaults().await;
        };

        let tiers = self.parse_prizes(&document);
        if tiers.is_empty() {
            log::warn!(
                "Prize store at {} has no valid tiers ({} entries), rewriting with default tiers",
                self.path.display(),
                document.prizes.len()
            );
            return self.write_defaults().await;
        }
        Ok(tiers)
    }

    async fn decrement_tier(&self, id: &str) -> AppResult<Stock> {
        let _guard = self.lock.lock().await;
        let mut document = self
            .read_document()
            .await?
            .ok_or_else(|| AppError::NotFound(format!("prize tier {id}")))?;

        // 与 parse_prizes 一致: 同 id 取第一条合法记录
        let (slot, mut tier) = document
            .prizes
            .iter_mut()
            .filter(|value| value.get("id").and_then(Value::as_str) == Some(id))
            .find_map(|value| {
                let tier = parse_entry(value).ok()?;
                Some((value, tier))
            })
            .ok_or_else(|| AppError::NotFound(format!("prize tier {id}")))?;

        let before = tier.remaining;
        let after = take_one(&mut tier);
        if after != before {
            slot["remaining"] = Value::from(i64::from(after));
            self.write_document(document).await?;
        }
        Ok(after)
    }

    async fn replace_tiers(&self, tiers: &[PrizeTier]) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let stored = match self.read_document().await {
            Ok(Some(document)) => document.prizes.len(),
            _ => 0,
        };
        if stored > tiers.len() {
            log::warn!(
                "Replacing {stored} stored prize entries in {} with {} tiers",
                self.path.display(),
                tiers.len()
            );
        }
        self.write_document(InventoryDocument::from_tiers(tiers)?)
            .await
    }

    async fn seed(&self, tiers: &[PrizeTier]) -> AppResult<bool> {
        let _guard = self.lock.lock().await;
        let has_prizes = matches!(
            self.read_document().await?,
            Some(document) if !document.prizes.is_empty()
        );
        if has_prizes {
            return Ok(false);
        }
        self.write_document(InventoryDocument::from_tiers(tiers)?)
            .await?;
        Ok(true)
    }
}
