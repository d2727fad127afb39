use super::AuditSink;
use crate::error::AppResult;
use crate::models::AuditEntry;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// JSON-lines ledger next to the file inventory, one entry per line.
pub struct FileAuditSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn record(&self, entry: &AuditEntry) -> AppResult<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DrawOutcome, DrawRequest, PrizeTier, Stock};

    #[tokio::test]
    async fn test_entries_are_appended() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("entries.jsonl");
        let sink = FileAuditSink::new(&path);

        let kit = PrizeTier::new("kit", "Kit", Stock::Finite(3), Stock::Finite(3), false);
        for email in ["a@example.com", "b@example.com"] {
            let request = DrawRequest {
                email: Some(email.to_string()),
                ..Default::default()
            };
            let entry = AuditEntry::new(&DrawOutcome::for_tier(&kit), &request);
            sink.record(&entry).await.unwrap();
        }

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let entries: Vec<AuditEntry> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].email, "b@example.com");
        assert_eq!(entries[0].prize_id, "kit");
    }
}
