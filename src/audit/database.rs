use super::AuditSink;
use crate::entities::draw_entry_entity as entries;
use crate::error::AppResult;
use crate::models::AuditEntry;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Inserts one `draw_entries` row per draw.
#[derive(Clone)]
pub struct DatabaseAuditSink {
    pool: DatabaseConnection,
}

impl DatabaseAuditSink {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for DatabaseAuditSink {
    async fn record(&self, entry: &AuditEntry) -> AppResult<()> {
        entries::ActiveModel {
            draw_id: Set(entry.draw_id),
            first_name: Set(entry.first_name.clone()),
            last_name: Set(entry.last_name.clone()),
            email: Set(entry.email.clone()),
            prize_id: Set(entry.prize_id.clone()),
            prize_name: Set(entry.prize_name.clone()),
            is_baseline: Set(entry.is_baseline),
            drawn_at: Set(entry.timestamp),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(())
    }
}
