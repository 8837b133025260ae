use std::sync::Arc;
use std::time::Duration;

use crate::cache::keys::{GLOBAL_RATE_KEY, ip_rate_key};
use crate::cache::operations::{CounterStore, StoreError};
use crate::config::Config;

/// 准入判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted,
    /// 单个请求方超出当日额度
    IpLimitExceeded,
    /// 全局额度耗尽
    GlobalLimitExceeded,
}

/// 准入门，保护上游生成额度
/// 先递增再判断：计数器本身就是并发场景下的裁决依据
#[derive(Clone)]
pub struct AdmissionGate {
    counters: Arc<dyn CounterStore>,
    per_ip_ceiling: u32,
    global_ceiling: u32,
    window: Duration,
}

impl AdmissionGate {
    pub fn new(counters: Arc<dyn CounterStore>, config: &Config) -> Self {
        Self {
            counters,
            per_ip_ceiling: config.rate_limit_per_ip,
            global_ceiling: config.rate_limit_global,
            window: config.rate_limit_window(),
        }
    }

    /// 同时递增请求方计数和全局计数，再依次比较额度
    /// 存储不可用时直接返回错误，由调用方拒绝请求（fail closed）
    pub async fn admit(&self, ip: &str) -> Result<Decision, StoreError> {
        let ip_count = self.counters.incr(&ip_rate_key(ip), self.window).await?;
        let global_count = self.counters.incr(GLOBAL_RATE_KEY, self.window).await?;

        if ip_count > self.per_ip_ceiling as u64 {
            tracing::info!("ip {} over per-requester ceiling ({})", ip, ip_count);
            return Ok(Decision::IpLimitExceeded);
        }
        if global_count > self.global_ceiling as u64 {
            tracing::info!("global ceiling reached ({})", global_count);
            return Ok(Decision::GlobalLimitExceeded);
        }

        Ok(Decision::Admitted)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::operations::MemoryStore;

    fn gate(per_ip: u32, global: u32) -> AdmissionGate {
        AdmissionGate {
            counters: Arc::new(MemoryStore::new()),
            per_ip_ceiling: per_ip,
            global_ceiling: global,
            window: Duration::from_secs(86_400),
        }
    }

    #[tokio::test]
    async fn rejects_after_per_ip_ceiling() {
        let gate = gate(2, 100);
        assert_eq!(gate.admit("1.1.1.1").await.unwrap(), Decision::Admitted);
        assert_eq!(gate.admit("1.1.1.1").await.unwrap(), Decision::Admitted);
        assert_eq!(
            gate.admit("1.1.1.1").await.unwrap(),
            Decision::IpLimitExceeded
        );
        // 其他请求方不受影响
        assert_eq!(gate.admit("2.2.2.2").await.unwrap(), Decision::Admitted);
    }

    #[tokio::test]
    async fn rejects_when_global_ceiling_reached() {
        let gate = gate(100, 3);
        assert_eq!(gate.admit("1.1.1.1").await.unwrap(), Decision::Admitted);
        assert_eq!(gate.admit("2.2.2.2").await.unwrap(), Decision::Admitted);
        assert_eq!(gate.admit("3.3.3.3").await.unwrap(), Decision::Admitted);
        // 不论来自哪个请求方，第四次都被全局额度挡下
        assert_eq!(
            gate.admit("4.4.4.4").await.unwrap(),
            Decision::GlobalLimitExceeded
        );
    }

    #[tokio::test]
    async fn unidentified_requesters_share_one_budget() {
        let gate = gate(1, 100);
        assert_eq!(gate.admit("unknown").await.unwrap(), Decision::Admitted);
        assert_eq!(
            gate.admit("unknown").await.unwrap(),
            Decision::IpLimitExceeded
        );
    }

    #[tokio::test]
    async fn counter_resets_after_window() {
        let mut gate = gate(1, 100);
        gate.window = Duration::from_millis(20);

        assert_eq!(gate.admit("1.1.1.1").await.unwrap(), Decision::Admitted);
        assert_eq!(
            gate.admit("1.1.1.1").await.unwrap(),
            Decision::IpLimitExceeded
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(gate.admit("1.1.1.1").await.unwrap(), Decision::Admitted);
    }

    struct BrokenStore;

    #[async_trait]
    impl CounterStore for BrokenStore {
        async fn incr(&self, key: &str, _window: Duration) -> Result<u64, StoreError> {
            Err(StoreError::Corrupt(key.to_string()))
        }
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let gate = AdmissionGate {
            counters: Arc::new(BrokenStore),
            per_ip_ceiling: 5,
            global_ceiling: 20,
            window: Duration::from_secs(86_400),
        };
        assert!(gate.admit("1.1.1.1").await.is_err());
    }
}
