use crate::audit::AuditSink;
use crate::config::DrawConfig;
use crate::error::{AppError, AppResult};
use crate::inventory::InventoryRepository;
use crate::models::{AuditEntry, DrawOutcome, DrawRequest, PrizeTier};
use crate::services::WeightPolicy;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct DrawService {
    inventory: Arc<dyn InventoryRepository>,
    audit: Arc<dyn AuditSink>,
    policy: WeightPolicy,
    list_timeout: Duration,
}

impl DrawService {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        audit: Arc<dyn AuditSink>,
        config: &DrawConfig,
    ) -> Self {
        Self {
            inventory,
            audit,
            policy: WeightPolicy::from(config),
            list_timeout: Duration::from_millis(config.list_timeout_ms),
        }
    }

    /// 抽奖
    ///
    /// 逻辑:
    /// 1. 读取当前库存 (失败或超时 -> DrawUnavailable, 不回退到默认奖品)
    /// 2. 过滤出可抽奖品 (保底 / 无限 / 剩余 > 0), 为空 -> SoldOut
    /// 3. 按权重随机抽取
    /// 4. 限量奖品扣减库存; 扣减失败不影响本次结果
    /// 5. 异步写审计记录, 失败只记日志
    pub async fn draw(&self, request: DrawRequest) -> AppResult<DrawOutcome> {
        let tiers = match tokio::time::timeout(self.list_timeout, self.inventory.list_tiers()).await
        {
            Ok(Ok(tiers)) => tiers,
            Ok(Err(e)) => {
                log::error!("Failed to read prize inventory: {e}");
                return Err(AppError::DrawUnavailable(e.to_string()));
            }
            Err(_) => {
                log::error!(
                    "Reading prize inventory timed out after {}ms",
                    self.list_timeout.as_millis()
                );
                return Err(AppError::DrawUnavailable(
                    "inventory read timed out".to_string(),
                ));
            }
        };

        let awardable = awardable_tiers(&tiers);
        let chosen = {
            let mut rng = rand::thread_rng();
            self.policy.choose(&awardable, &mut rng).cloned()
        }
        .ok_or(AppError::SoldOut)?;

        if chosen.is_consumable() {
            // 与读取之间没有锁, 并发时可能已被抽完; 本次结果仍然有效
            match self.inventory.decrement_tier(&chosen.id).await {
                Ok(remaining) => {
                    log::debug!("Prize tier {} remaining after draw: {remaining}", chosen.id)
                }
                Err(AppError::NotFound(_)) => {
                    log::warn!("Prize tier {} vanished before decrement", chosen.id)
                }
                Err(e) => log::warn!("Failed to decrement prize tier {}: {e}", chosen.id),
            }
        }

        let outcome = DrawOutcome::for_tier(&chosen);
        log::info!(
            "Draw {} awarded {} (baseline: {})",
            outcome.draw_id,
            outcome.prize_id,
            outcome.is_baseline
        );

        self.submit_audit(AuditEntry::new(&outcome, &request));
        Ok(outcome)
    }

    fn submit_audit(&self, entry: AuditEntry) {
        let sink = self.audit.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.record(&entry).await {
                log::warn!("Failed to record draw {} in audit log: {e}", entry.draw_id);
            }
        });
    }
}

/// 可抽奖品: 保底 / 无限 / 剩余 > 0。多个保底时只保留第一个。
fn awardable_tiers(tiers: &[PrizeTier]) -> Vec<&PrizeTier> {
    let mut baseline_seen = false;
    let mut awardable = Vec::with_capacity(tiers.len());
    for tier in tiers {
        if tier.is_baseline {
            if baseline_seen {
                log::warn!("Ignoring extra baseline prize tier {}", tier.id);
                continue;
            }
            baseline_seen = true;
        }
        if tier.is_awardable() {
            awardable.push(tier);
        }
    }
    awardable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::MemoryInventory;
    use crate::models::Stock;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _entry: &AuditEntry) -> AppResult<()> {
            Err(AppError::ExternalApiError("ledger offline".to_string()))
        }
    }

    struct ChannelSink(mpsc::UnboundedSender<AuditEntry>);

    #[async_trait]
    impl AuditSink for ChannelSink {
        async fn record(&self, entry: &AuditEntry) -> AppResult<()> {
            let _ = self.0.send(entry.clone());
            Ok(())
        }
    }

    /// Store that is unreachable, or slow when `delay` is set.
    struct BrokenInventory {
        delay: Option<Duration>,
    }

    #[async_trait]
    impl InventoryRepository for BrokenInventory {
        async fn list_tiers(&self) -> AppResult<Vec<PrizeTier>> {
            match self.delay {
                Some(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(crate::models::default_tiers())
                }
                None => Err(AppError::RepositoryUnavailable("connection refused".into())),
            }
        }

        async fn decrement_tier(&self, id: &str) -> AppResult<Stock> {
            Err(AppError::NotFound(id.to_string()))
        }

        async fn replace_tiers(&self, _tiers: &[PrizeTier]) -> AppResult<()> {
            Ok(())
        }

        async fn seed(&self, _tiers: &[PrizeTier]) -> AppResult<bool> {
            Ok(false)
        }
    }

    /// Lists a fixed tier but reports every decrement target as missing.
    struct GhostInventory;

    #[async_trait]
    impl InventoryRepository for GhostInventory {
        async fn list_tiers(&self) -> AppResult<Vec<PrizeTier>> {
            Ok(vec![finite("kit", 3)])
        }

        async fn decrement_tier(&self, id: &str) -> AppResult<Stock> {
            Err(AppError::NotFound(id.to_string()))
        }

        async fn replace_tiers(&self, _tiers: &[PrizeTier]) -> AppResult<()> {
            Ok(())
        }

        async fn seed(&self, _tiers: &[PrizeTier]) -> AppResult<bool> {
            Ok(false)
        }
    }

    fn finite(id: &str, remaining: u64) -> PrizeTier {
        PrizeTier::new(id, id, Stock::Finite(remaining), Stock::Finite(remaining), false)
    }

    fn baseline() -> PrizeTier {
        PrizeTier::new("discount", "10% off first order", Stock::Finite(5), Stock::Finite(5), true)
    }

    fn service(inventory: Arc<dyn InventoryRepository>, audit: Arc<dyn AuditSink>) -> DrawService {
        DrawService::new(inventory, audit, &DrawConfig::default())
    }

    fn tier<'a>(tiers: &'a [PrizeTier], id: &str) -> &'a PrizeTier {
        tiers.iter().find(|t| t.id == id).unwrap()
    }

    #[tokio::test]
    async fn test_finite_tier_never_oversold() {
        let store = Arc::new(MemoryInventory::new(vec![
            finite("kit", 3),
            PrizeTier::new("pin", "Pin", Stock::Unlimited, Stock::Unlimited, false),
        ]));
        let svc = service(store.clone(), Arc::new(FailingSink));

        let mut kit_wins = 0;
        for _ in 0..200 {
            if svc.draw(DrawRequest::default()).await.unwrap().prize_id == "kit" {
                kit_wins += 1;
            }
        }

        let tiers = store.snapshot().await;
        assert!(kit_wins <= 3);
        assert_eq!(tier(&tiers, "kit").remaining, Stock::Finite(3 - kit_wins));
    }

    #[tokio::test]
    async fn test_exhausts_then_stops_awarding() {
        let store = Arc::new(MemoryInventory::new(vec![
            PrizeTier::new("kit", "kit", Stock::Finite(4), Stock::Finite(0), false),
            baseline(),
        ]));
        let svc = service(store.clone(), Arc::new(FailingSink));

        for _ in 0..200 {
            let outcome = svc.draw(DrawRequest::default()).await.unwrap();
            assert_eq!(outcome.prize_id, "discount");
            assert!(outcome.is_baseline);
        }
        let tiers = store.snapshot().await;
        assert_eq!(tier(&tiers, "kit").remaining, Stock::Finite(0));
    }

    #[tokio::test]
    async fn test_sequential_draws_drain_exactly() {
        let store = Arc::new(MemoryInventory::new(vec![finite("a", 2), finite("b", 3)]));
        let svc = service(store.clone(), Arc::new(FailingSink));

        let mut wins = std::collections::HashMap::new();
        for _ in 0..5 {
            let outcome = svc.draw(DrawRequest::default()).await.unwrap();
            *wins.entry(outcome.prize_id).or_insert(0u64) += 1;
        }
        assert_eq!(wins.get("a"), Some(&2));
        assert_eq!(wins.get("b"), Some(&3));

        assert!(matches!(
            svc.draw(DrawRequest::default()).await,
            Err(AppError::SoldOut)
        ));
    }

    #[tokio::test]
    async fn test_baseline_never_decremented() {
        let store = Arc::new(MemoryInventory::new(vec![baseline(), finite("kit", 1)]));
        let svc = service(store.clone(), Arc::new(FailingSink));

        let mut baseline_wins = 0;
        for _ in 0..300 {
            if svc.draw(DrawRequest::default()).await.unwrap().is_baseline {
                baseline_wins += 1;
            }
        }

        let tiers = store.snapshot().await;
        assert!(baseline_wins >= 299);
        assert_eq!(tier(&tiers, "discount").remaining, Stock::Finite(5));
    }

    #[tokio::test]
    async fn test_unlimited_tier_untouched() {
        let store = Arc::new(MemoryInventory::new(vec![PrizeTier::new(
            "pin",
            "Pin",
            Stock::Unlimited,
            Stock::Unlimited,
            false,
        )]));
        let svc = service(store.clone(), Arc::new(FailingSink));

        for _ in 0..50 {
            assert_eq!(svc.draw(DrawRequest::default()).await.unwrap().prize_id, "pin");
        }
        assert_eq!(store.snapshot().await[0].remaining, Stock::Unlimited);
    }

    #[tokio::test]
    async fn test_sold_out_without_baseline() {
        let store = Arc::new(MemoryInventory::new(vec![finite("a", 0), finite("b", 0)]));
        let svc = service(store, Arc::new(FailingSink));

        assert!(matches!(
            svc.draw(DrawRequest::default()).await,
            Err(AppError::SoldOut)
        ));
    }

    #[tokio::test]
    async fn test_empty_store_draws_from_defaults() {
        let svc = service(Arc::new(MemoryInventory::default()), Arc::new(FailingSink));
        let outcome = svc.draw(DrawRequest::default()).await.unwrap();
        assert!(
            crate::models::default_tiers()
                .iter()
                .any(|t| t.id == outcome.prize_id)
        );
    }

    #[tokio::test]
    async fn test_empty_store_default_stock_is_drained() {
        let store = Arc::new(MemoryInventory::default());
        let config = DrawConfig {
            baseline_weight: 0,
            ..DrawConfig::default()
        };
        let svc = DrawService::new(store.clone(), Arc::new(FailingSink), &config);

        let mut wins = std::collections::HashMap::new();
        for _ in 0..2_000 {
            let outcome = svc.draw(DrawRequest::default()).await.unwrap();
            *wins.entry(outcome.prize_id).or_insert(0u64) += 1;
        }

        assert_eq!(wins.get("kit"), Some(&10));
        assert_eq!(wins.get("hat"), Some(&1000));
        assert_eq!(wins.get("sixpack"), Some(&500));
        let tiers = store.snapshot().await;
        for id in ["kit", "hat", "sixpack"] {
            assert_eq!(tier(&tiers, id).remaining, Stock::Finite(0));
        }
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_draw() {
        let store = Arc::new(MemoryInventory::new(vec![finite("kit", 2)]));
        let svc = service(store.clone(), Arc::new(FailingSink));

        let outcome = svc.draw(DrawRequest::default()).await.unwrap();
        assert_eq!(outcome.prize_id, "kit");
        assert_eq!(store.snapshot().await[0].remaining, Stock::Finite(1));
    }

    #[tokio::test]
    async fn test_audit_receives_entrant() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let store = Arc::new(MemoryInventory::new(vec![finite("kit", 2)]));
        let svc = service(store, Arc::new(ChannelSink(tx)));

        let outcome = svc
            .draw(DrawRequest {
                name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let entry = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.draw_id, outcome.draw_id);
        assert_eq!(entry.first_name, "Ada");
        assert_eq!(entry.last_name, "");
        assert_eq!(entry.email, "ada@example.com");
        assert_eq!(entry.prize_id, "kit");
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_closed() {
        let svc = service(
            Arc::new(BrokenInventory { delay: None }),
            Arc::new(FailingSink),
        );
        assert!(matches!(
            svc.draw(DrawRequest::default()).await,
            Err(AppError::DrawUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let config = DrawConfig {
            list_timeout_ms: 20,
            ..DrawConfig::default()
        };
        let svc = DrawService::new(
            Arc::new(BrokenInventory {
                delay: Some(Duration::from_secs(5)),
            }),
            Arc::new(FailingSink),
            &config,
        );
        assert!(matches!(
            svc.draw(DrawRequest::default()).await,
            Err(AppError::DrawUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_decrement_target_keeps_award() {
        let svc = service(Arc::new(GhostInventory), Arc::new(FailingSink));
        let outcome = svc.draw(DrawRequest::default()).await.unwrap();
        assert_eq!(outcome.prize_id, "kit");
    }

    #[test]
    fn test_awardable_tiers_single_baseline() {
        let tiers = vec![
            baseline(),
            finite("empty", 0),
            PrizeTier::new("second", "Second", Stock::Unlimited, Stock::Unlimited, true),
            finite("kit", 2),
        ];
        let ids: Vec<_> = awardable_tiers(&tiers).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["discount", "kit"]);
    }
}
