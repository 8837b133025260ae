use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::cache::keys::new_job_key;
use crate::cache::models::job::{JobRecord, JobStatus};
use crate::cache::operations::{CounterStore, JobStore, StoreError};

struct CounterEntry {
    count: u64,
    expires_at: Instant,
}

struct JobEntry {
    record: JobRecord,
    claimed: bool,
    expires_at: Instant,
}

/// 进程内存储，实现与 Redis 相同的计数和任务契约
/// 仅用于本地开发和测试：跨实例部署时计数不共享，限流会失效
#[derive(Default)]
pub struct MemoryStore {
    counters: Mutex<HashMap<String, CounterEntry>>,
    jobs: Mutex<HashMap<String, JobEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn incr(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let mut counters = self.counters.lock().unwrap();
        let now = Instant::now();

        match counters.entry(key.to_string()) {
            // 窗口内递增不刷新过期时间
            Entry::Occupied(mut occupied) if occupied.get().expires_at > now => {
                let entry = occupied.get_mut();
                entry.count += 1;
                Ok(entry.count)
            }
            // 已过期的计数从 1 重新开始，窗口锚定在本次递增
            Entry::Occupied(mut occupied) => {
                occupied.insert(CounterEntry {
                    count: 1,
                    expires_at: now + window,
                });
                Ok(1)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CounterEntry {
                    count: 1,
                    expires_at: now + window,
                });
                Ok(1)
            }
        }
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, record: &JobRecord, ttl: Duration) -> Result<String, StoreError> {
        let key = new_job_key();
        self.jobs.lock().unwrap().insert(
            key.clone(),
            JobEntry {
                record: record.clone(),
                claimed: false,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<JobRecord>, StoreError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.record.clone()))
    }

    async fn claim(&self, key: &str) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(key) {
            Some(entry) if entry.expires_at > Instant::now() && !entry.claimed => {
                entry.claimed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete(&self, key: &str, image_url: &str) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(entry) = jobs.get_mut(key) {
            if entry.record.status == JobStatus::Pending {
                entry.record.status = JobStatus::Complete;
                entry.record.image_url = Some(image_url.to_string());
            }
        }
        Ok(())
    }

    async fn fail(&self, key: &str, message: &str) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(entry) = jobs.get_mut(key) {
            if entry.record.status == JobStatus::Pending {
                entry.record.status = JobStatus::Error;
                entry.record.error = Some(message.to_string());
            }
        }
        Ok(())
    }

    async fn job_keys(&self) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    #[tokio::test]
    async fn incr_counts_within_window() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("rate:ip:1.2.3.4", DAY).await.unwrap(), 1);
        assert_eq!(store.incr("rate:ip:1.2.3.4", DAY).await.unwrap(), 2);
        assert_eq!(store.incr("rate:ip:5.6.7.8", DAY).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn window_anchored_at_first_increment() {
        let store = MemoryStore::new();
        let window = Duration::from_millis(40);

        assert_eq!(store.incr("k", window).await.unwrap(), 1);
        tokio::time::sleep(Duration::from_millis(25)).await;
        // 第二次递增不应把窗口往后推
        assert_eq!(store.incr("k", window).await.unwrap(), 2);
        tokio::time::sleep(Duration::from_millis(25)).await;
        // 距首次递增已超过窗口，计数重新开始
        assert_eq!(store.incr("k", window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn claim_succeeds_exactly_once() {
        let store = MemoryStore::new();
        let key = store
            .create(&JobRecord::pending("a dog"), DAY)
            .await
            .unwrap();

        assert!(store.claim(&key).await.unwrap());
        assert!(!store.claim(&key).await.unwrap());
        assert!(!store.claim("image-job:missing").await.unwrap());
    }

    #[tokio::test]
    async fn terminal_transitions_are_one_way() {
        let store = MemoryStore::new();
        let key = store
            .create(&JobRecord::pending("a dog"), DAY)
            .await
            .unwrap();

        store.complete(&key, "https://img.example/dog.png").await.unwrap();
        store.fail(&key, "too late").await.unwrap();

        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Complete);
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn expired_jobs_disappear() {
        let store = MemoryStore::new();
        let key = store
            .create(&JobRecord::pending("a dog"), Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(store.job_keys().await.unwrap().is_empty());
    }
}
