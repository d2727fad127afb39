use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::PrizeTier;

/// 审计记录中保底奖品的标记
pub const BASELINE_MARKER: &str = "baseline";

/// 抽奖请求 (参与者信息, 仅用于审计记录)
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrawRequest {
    #[schema(example = "Ada")]
    pub first_name: Option<String>,
    /// 旧版前端只传 name
    pub name: Option<String>,
    #[schema(example = "Lovelace")]
    pub last_name: Option<String>,
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
}

impl DrawRequest {
    pub fn first_name(&self) -> &str {
        non_empty(&self.first_name)
            .or_else(|| non_empty(&self.name))
            .unwrap_or("")
    }

    pub fn last_name(&self) -> &str {
        non_empty(&self.last_name).unwrap_or("")
    }

    pub fn email(&self) -> &str {
        non_empty(&self.email).unwrap_or("")
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// 一次抽奖的结果, 创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DrawOutcome {
    pub draw_id: Uuid,
    pub prize_id: String,
    pub prize_name: String,
    pub is_baseline: bool,
    pub drawn_at: DateTime<Utc>,
}

impl DrawOutcome {
    pub fn for_tier(tier: &PrizeTier) -> Self {
        Self {
            draw_id: Uuid::new_v4(),
            prize_id: tier.id.clone(),
            prize_name: tier.name.clone(),
            is_baseline: tier.is_baseline,
            drawn_at: Utc::now(),
        }
    }
}

/// 审计账本中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub draw_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub prize_name: String,
    pub prize_id: String,
    pub is_baseline: bool,
}

impl AuditEntry {
    pub fn new(outcome: &DrawOutcome, request: &DrawRequest) -> Self {
        Self {
            draw_id: outcome.draw_id,
            timestamp: outcome.drawn_at,
            first_name: request.first_name().to_string(),
            last_name: request.last_name().to_string(),
            email: request.email().to_string(),
            prize_name: outcome.prize_name.clone(),
            prize_id: outcome.prize_id.clone(),
            is_baseline: outcome.is_baseline,
        }
    }

    /// Timestamp, first name, last name, email, prize name, prize id, baseline marker.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.clone(),
            self.prize_name.clone(),
            self.prize_id.clone(),
            if self.is_baseline {
                BASELINE_MARKER.to_string()
            } else {
                String::new()
            },
        ]
    }
}

/// 返回给前端的奖品
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WonPrize {
    #[schema(example = "kit")]
    pub id: String,
    #[schema(example = "Daily Ultimate Essentials Kit")]
    pub name: String,
    pub baseline: bool,
}

/// 抽奖响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResponse {
    pub prize: WonPrize,
}

impl From<DrawOutcome> for DrawResponse {
    fn from(outcome: DrawOutcome) -> Self {
        DrawResponse {
            prize: WonPrize {
                id: outcome.prize_id,
                name: outcome.prize_name,
                baseline: outcome.is_baseline,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stock;

    #[test]
    fn test_request_absent_fields_become_empty() {
        let request: DrawRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.first_name(), "");
        assert_eq!(request.last_name(), "");
        assert_eq!(request.email(), "");
    }

    #[test]
    fn test_request_name_alias() {
        let request: DrawRequest =
            serde_json::from_str(r#"{"name":"Ada","email":"ada@example.com"}"#).unwrap();
        assert_eq!(request.first_name(), "Ada");

        let request: DrawRequest =
            serde_json::from_str(r#"{"firstName":"Grace","name":"Ada"}"#).unwrap();
        assert_eq!(request.first_name(), "Grace");
    }

    #[test]
    fn test_audit_row_layout() {
        let tier = PrizeTier::new("discount", "10% off", Stock::Unlimited, Stock::Unlimited, true);
        let outcome = DrawOutcome::for_tier(&tier);
        let request = DrawRequest {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            ..Default::default()
        };

        let row = AuditEntry::new(&outcome, &request).to_row();
        assert_eq!(row.len(), 7);
        assert_eq!(&row[1..], ["Ada", "Lovelace", "ada@example.com", "10% off", "discount", "baseline"]);

        let kit = PrizeTier::new("kit", "Kit", Stock::Finite(1), Stock::Finite(1), false);
        let row = AuditEntry::new(&DrawOutcome::for_tier(&kit), &DrawRequest::default()).to_row();
        assert_eq!(row[6], "");
    }
}
