//! Append-only ledger of draw outcomes.
//!
//! The draw engine hands entries to an [`AuditSink`] on a detached task and
//! never looks at the result, so a sink may fail without affecting the draw.

pub mod database;
pub mod file;
pub mod sheets;

pub use database::DatabaseAuditSink;
pub use file::FileAuditSink;
pub use sheets::SheetsAuditSink;

use crate::error::AppResult;
use crate::models::AuditEntry;
use async_trait::async_trait;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> AppResult<()>;
}

/// Writes entries to the application log only (memory backend).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record(&self, entry: &AuditEntry) -> AppResult<()> {
        log::info!(
            target: "audit",
            "draw {} prize={} baseline={} email={}",
            entry.draw_id,
            entry.prize_id,
            entry.is_baseline,
            entry.email
        );
        Ok(())
    }
}
