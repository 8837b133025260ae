use std::sync::Arc;
use std::time::Duration;

use crate::cache::operations::{JobStore, StoreError};
use crate::upstream::ImageGenerator;

/// 图像生成 worker
/// 扫描任务命名空间，认领 pending 任务并逐个调用上游，
/// 单个任务失败不影响本轮其余任务
#[derive(Clone)]
pub struct ImageWorker {
    jobs: Arc<dyn JobStore>,
    upstream: Arc<dyn ImageGenerator>,
}

impl ImageWorker {
    pub fn new(jobs: Arc<dyn JobStore>, upstream: Arc<dyn ImageGenerator>) -> Self {
        Self { jobs, upstream }
    }

    /// 执行一轮扫描，返回本轮进入终态的任务数
    pub async fn run_once(&self) -> Result<usize, StoreError> {
        let keys = self.jobs.job_keys().await?;
        let mut processed = 0;

        for key in keys {
            match self.process(&key).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                // 单个任务的存储错误只记录日志，下一轮扫描会重新看到它
                Err(e) => tracing::warn!("job {} skipped after store error: {}", key, e),
            }
        }

        Ok(processed)
    }

    /// 处理单个任务，返回它是否在本次调用中进入终态
    async fn process(&self, key: &str) -> Result<bool, StoreError> {
        let Some(record) = self.jobs.get(key).await? else {
            return Ok(false);
        };
        if record.status.is_terminal() {
            return Ok(false);
        }

        // 先认领再处理：并发的 worker 轮次里同一任务最多触发一次上游调用
        if !self.jobs.claim(key).await? {
            return Ok(false);
        }

        // 空提示词直接置为失败，不调用上游，也不让它卡住后续扫描
        if record.prompt.is_empty() {
            self.jobs.fail(key, "Prompt is empty").await?;
            return Ok(true);
        }

        match self.upstream.generate(&record.prompt).await {
            Ok(image_url) => {
                self.jobs.complete(key, &image_url).await?;
                tracing::info!("job {} complete", key);
            }
            Err(e) => {
                tracing::warn!("job {} failed: {}", key, e);
                self.jobs.fail(key, &e.to_string()).await?;
            }
        }

        Ok(true)
    }
}

/// 按固定间隔在后台执行 worker，WORKER_INTERVAL 配置大于 0 时由 main 启动
pub fn spawn_interval(worker: ImageWorker, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match worker.run_once().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("worker pass processed {} job(s)", n),
                Err(e) => tracing::error!("worker pass failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::cache::models::job::{JobRecord, JobStatus};
    use crate::cache::operations::MemoryStore;
    use crate::upstream::UpstreamError;

    const TTL: Duration = Duration::from_secs(3_600);

    enum Outcome {
        Url(&'static str),
        Malformed,
    }

    struct FakeUpstream {
        calls: AtomicUsize,
        outcome: Outcome,
        delay: Duration,
    }

    impl FakeUpstream {
        fn ok(url: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Outcome::Url(url),
                delay: Duration::ZERO,
            }
        }

        fn malformed() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Outcome::Malformed,
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageGenerator for FakeUpstream {
        async fn generate(&self, _prompt: &str) -> Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.outcome {
                Outcome::Url(url) => Ok((*url).to_string()),
                Outcome::Malformed => Err(UpstreamError::MalformedResponse),
            }
        }
    }

    fn worker(store: &Arc<MemoryStore>, upstream: &Arc<FakeUpstream>) -> ImageWorker {
        ImageWorker::new(store.clone(), upstream.clone())
    }

    #[tokio::test]
    async fn completes_pending_job() {
        let store = Arc::new(MemoryStore::new());
        let upstream = Arc::new(FakeUpstream::ok("https://img.example/cat.png"));
        let key = store
            .create(&JobRecord::pending("a cat"), TTL)
            .await
            .unwrap();

        let processed = worker(&store, &upstream).run_once().await.unwrap();
        assert_eq!(processed, 1);

        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Complete);
        assert_eq!(record.image_url.as_deref(), Some("https://img.example/cat.png"));
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn second_pass_does_not_reprocess() {
        let store = Arc::new(MemoryStore::new());
        let upstream = Arc::new(FakeUpstream::ok("https://img.example/cat.png"));
        store
            .create(&JobRecord::pending("a cat"), TTL)
            .await
            .unwrap();

        let worker = worker(&store, &upstream);
        assert_eq!(worker.run_once().await.unwrap(), 1);
        assert_eq!(worker.run_once().await.unwrap(), 0);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_upstream_marks_error_without_retry() {
        let store = Arc::new(MemoryStore::new());
        let upstream = Arc::new(FakeUpstream::malformed());
        let key = store
            .create(&JobRecord::pending("a cat"), TTL)
            .await
            .unwrap();

        let worker = worker(&store, &upstream);
        assert_eq!(worker.run_once().await.unwrap(), 1);

        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Error);
        assert!(record.error.is_some());

        // error 是终态，后续轮次不会再碰上游
        assert_eq!(worker.run_once().await.unwrap(), 0);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn empty_prompt_fails_without_upstream_call() {
        let store = Arc::new(MemoryStore::new());
        let upstream = Arc::new(FakeUpstream::ok("https://img.example/cat.png"));
        let key = store.create(&JobRecord::pending("   "), TTL).await.unwrap();

        assert_eq!(worker(&store, &upstream).run_once().await.unwrap(), 1);

        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Error);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_passes_call_upstream_at_most_once() {
        let store = Arc::new(MemoryStore::new());
        let upstream = Arc::new(FakeUpstream {
            calls: AtomicUsize::new(0),
            outcome: Outcome::Url("https://img.example/cat.png"),
            delay: Duration::from_millis(30),
        });
        store
            .create(&JobRecord::pending("a cat"), TTL)
            .await
            .unwrap();

        let worker = worker(&store, &upstream);
        let (a, b) = tokio::join!(worker.run_once(), worker.run_once());
        assert_eq!(a.unwrap() + b.unwrap(), 1);
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn counts_only_newly_terminal_jobs() {
        let store = Arc::new(MemoryStore::new());
        let upstream = Arc::new(FakeUpstream::ok("https://img.example/cat.png"));

        store.create(&JobRecord::pending("a"), TTL).await.unwrap();
        store.create(&JobRecord::pending("b"), TTL).await.unwrap();
        let done = store.create(&JobRecord::pending("c"), TTL).await.unwrap();
        store.claim(&done).await.unwrap();
        store.complete(&done, "https://img.example/c.png").await.unwrap();

        assert_eq!(worker(&store, &upstream).run_once().await.unwrap(), 2);
    }
}
