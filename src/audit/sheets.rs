use super::AuditSink;
use crate::error::AppResult;
use crate::external::{GoogleSheetsClient, ValueInputOption};
use crate::models::AuditEntry;
use async_trait::async_trait;
use std::sync::Arc;

/// Appends `timestamp | first | last | email | prize name | prize id | baseline`
/// rows to the entries sheet.
pub struct SheetsAuditSink {
    client: Arc<GoogleSheetsClient>,
    range: String,
}

impl SheetsAuditSink {
    pub fn new(client: Arc<GoogleSheetsClient>, range: impl Into<String>) -> Self {
        Self {
            client,
            range: range.into(),
        }
    }
}

#[async_trait]
impl AuditSink for SheetsAuditSink {
    async fn record(&self, entry: &AuditEntry) -> AppResult<()> {
        let updated = self
            .client
            .append_values(&self.range, vec![entry.to_row()], ValueInputOption::UserEntered)
            .await?;
        log::debug!("Draw {} appended to {:?}", entry.draw_id, updated);
        Ok(())
    }
}
