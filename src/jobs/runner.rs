use crate::{
    classification::Classifier,
    config::Config,
    entities::ProcessingStatus,
    repositories::StatusStore,
};
use anyhow::Result;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::{signal, sync::Semaphore, task::JoinSet, time::interval};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Items pulled from the store per batch.
    pub batch_size: usize,
    /// Items classified at the same time within a batch.
    pub concurrency: usize,
    pub poll_interval: Duration,
    /// Leave the polling loop once a batch comes back empty.
    pub stop_when_drained: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            concurrency: 4,
            poll_interval: Duration::from_millis(1000),
            stop_when_drained: false,
        }
    }
}

impl RunnerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size(),
            concurrency: config.worker_concurrency(),
            poll_interval: config.poll_interval(),
            stop_when_drained: false,
        }
    }
}

/// What happened to one product code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Completed,
    NoData,
    Failed,
    /// The store rejected a status write; the item keeps whatever status it had.
    StoreError,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub no_data: usize,
    pub failed: usize,
    pub store_errors: usize,
}

impl BatchSummary {
    pub fn processed(&self) -> usize {
        self.completed + self.no_data + self.failed + self.store_errors
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Completed => self.completed += 1,
            ItemOutcome::NoData => self.no_data += 1,
            ItemOutcome::Failed => self.failed += 1,
            ItemOutcome::StoreError => self.store_errors += 1,
        }
    }

    fn merge(&mut self, other: BatchSummary) {
        self.completed += other.completed;
        self.no_data += other.no_data;
        self.failed += other.failed;
        self.store_errors += other.store_errors;
    }
}

/// Works through "Not started" product codes, one batch at a time.
pub struct BatchRunner {
    store: Arc<dyn StatusStore>,
    classifier: Arc<Classifier>,
    config: RunnerConfig,
    run_id: Uuid,
    shutdown_token: CancellationToken,
}

impl BatchRunner {
    pub fn new(store: Arc<dyn StatusStore>, classifier: Arc<Classifier>, config: RunnerConfig) -> Self {
        Self {
            store,
            classifier,
            config,
            run_id: Uuid::new_v4(),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Cancelling the token stops [`BatchRunner::run`] after the current batch.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Claim one batch and drive every item to a terminal status.
    ///
    /// Only failing to claim the batch is an error; per-item problems end up in
    /// the summary. Runners sharing a store never claim the same item.
    pub async fn run_once(&self) -> Result<BatchSummary> {
        let items = self.store.claim_batch(self.config.batch_size).await?;
        debug!(run_id = %self.run_id, "claimed {} items", items.len());

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for item in items {
            let permit = semaphore.clone().acquire_owned().await?;
            let store = self.store.clone();
            let classifier = self.classifier.clone();
            let code = item.product_code;
            let span = info_span!("item", run_id = %self.run_id, product_code = %code);

            tasks.spawn(
                async move {
                    let _permit = permit; // Hold permit until the item is done
                    Self::process_item(store.as_ref(), &classifier, &code).await
                }
                .instrument(span),
            );
        }

        let mut summary = BatchSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    error!("item task aborted: {}", e);
                    summary.record(ItemOutcome::Failed);
                }
            }
        }

        if summary.processed() > 0 {
            info!(
                run_id = %self.run_id,
                completed = summary.completed,
                no_data = summary.no_data,
                failed = summary.failed,
                store_errors = summary.store_errors,
                "batch finished"
            );
        }

        Ok(summary)
    }

    /// Run batches every poll interval until cancelled (or drained, if so
    /// configured). Returns the totals.
    pub async fn run(&self) -> Result<BatchSummary> {
        info!(
            "Starting batch runner {} - batch_size: {}, concurrency: {}, poll_interval: {}ms",
            self.run_id,
            self.config.batch_size,
            self.config.concurrency,
            self.config.poll_interval.as_millis()
        );

        // Dropped with the loop, so nothing keeps listening once `run` returns
        let ctrl_c = signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut listening = true;

        let mut total = BatchSummary::default();
        let mut poll_interval = interval(self.config.poll_interval.max(Duration::from_millis(1)));

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Runner shutting down");
                    break;
                }
                signal = &mut ctrl_c, if listening => match signal {
                    Ok(()) => {
                        info!("Received shutdown signal, finished current batch");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to listen for shutdown signal: {}", e);
                        listening = false;
                    }
                },
                _ = poll_interval.tick() => {
                    match self.run_once().await {
                        Ok(summary) => {
                            total.merge(summary);
                            if summary.processed() == 0 && self.config.stop_when_drained {
                                info!("No items left to process");
                                break;
                            }
                        }
                        Err(e) => error!("Failed to claim batch: {}", e),
                    }
                }
            }
        }

        Ok(total)
    }

    async fn process_item(
        store: &dyn StatusStore,
        classifier: &Classifier,
        product_code: &str,
    ) -> ItemOutcome {
        let (status, data, outcome) = match classifier.classify(product_code).await {
            Ok(Some(record)) => (
                ProcessingStatus::Completed,
                Some(record.to_json()),
                ItemOutcome::Completed,
            ),
            Ok(None) => (ProcessingStatus::NoDataFound, None, ItemOutcome::NoData),
            Err(e) => {
                warn!("Error processing {}: {}", product_code, e);
                (
                    ProcessingStatus::Failed,
                    Some(json!({ "error_message": e.to_string() })),
                    ItemOutcome::Failed,
                )
            }
        };

        if let Err(e) = store.update_status(product_code, status, data).await {
            error!("Failed to mark {} as {}: {}", product_code, status, e);
            return ItemOutcome::StoreError;
        }

        info!("{} -> {}", product_code, status);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::RetryPolicy;
    use crate::repositories::{MemoryStatusRepository, MockStatusStore};
    use anyhow::anyhow;
    use url::Url;

    fn classifier() -> Arc<Classifier> {
        // Nothing listens on port 9; only invalid codes reach this classifier
        let base = Url::parse("http://127.0.0.1:9/classification.cfm").unwrap();
        Arc::new(Classifier::new(base, RetryPolicy::none()).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_codes_are_marked_failed() {
        let store = Arc::new(MemoryStatusRepository::with_codes(["A1B", "C-D"]));
        let runner = BatchRunner::new(store.clone(), classifier(), RunnerConfig::default());

        let summary = runner.run_once().await.unwrap();
        assert_eq!(summary.failed, 2);

        let item = store.get("A1B").await.unwrap().unwrap();
        assert_eq!(item.status, ProcessingStatus::Failed);
        let message = item.data.unwrap()["error_message"].as_str().unwrap().to_string();
        assert!(message.contains("invalid product code"));
    }

    #[tokio::test]
    async fn test_empty_store_is_a_noop() {
        let store = Arc::new(MemoryStatusRepository::new());
        let runner = BatchRunner::new(store, classifier(), RunnerConfig::default());
        assert_eq!(runner.run_once().await.unwrap(), BatchSummary::default());
    }

    #[tokio::test]
    async fn test_store_write_failure_is_counted_not_fatal() {
        let mut store = MockStatusStore::new();
        store
            .expect_claim_batch()
            .returning(|_| Ok(vec![crate::entities::StatusRecord::not_started("A1B")]));
        store
            .expect_update_status()
            .returning(|_, _, _| Err(anyhow!("connection reset")));

        let runner = BatchRunner::new(Arc::new(store), classifier(), RunnerConfig::default());
        let summary = runner.run_once().await.unwrap();
        assert_eq!(summary.store_errors, 1);
        assert_eq!(summary.processed(), 1);
    }

    #[tokio::test]
    async fn test_batch_read_failure_is_an_error() {
        let mut store = MockStatusStore::new();
        store
            .expect_claim_batch()
            .returning(|_| Err(anyhow!("table missing")));

        let runner = BatchRunner::new(Arc::new(store), classifier(), RunnerConfig::default());
        assert!(runner.run_once().await.is_err());
    }

    #[tokio::test]
    async fn test_run_stops_when_drained() {
        let store = Arc::new(MemoryStatusRepository::with_codes(["A1", "B2", "C3"]));
        let config = RunnerConfig {
            batch_size: 2,
            poll_interval: Duration::from_millis(5),
            stop_when_drained: true,
            ..RunnerConfig::default()
        };
        let runner = BatchRunner::new(store.clone(), classifier(), config);

        let total = runner.run().await.unwrap();
        assert_eq!(total.failed, 3);
        assert!(store
            .snapshot()
            .iter()
            .all(|item| item.status == ProcessingStatus::Failed));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_runners_split_the_work() {
        let codes: Vec<String> = (0..40).map(|i| format!("X{i:02}")).collect();
        let store = Arc::new(MemoryStatusRepository::with_codes(codes.clone()));
        let config = RunnerConfig {
            batch_size: 100,
            ..RunnerConfig::default()
        };
        let a = BatchRunner::new(store.clone(), classifier(), config.clone());
        let b = BatchRunner::new(store.clone(), classifier(), config);

        let (first, second) = tokio::join!(a.run_once(), b.run_once());
        let processed = first.unwrap().processed() + second.unwrap().processed();
        assert_eq!(processed, codes.len());
        assert!(
            store
                .snapshot()
                .iter()
                .all(|item| item.status == ProcessingStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_run_can_repeat_after_draining() {
        let store = Arc::new(MemoryStatusRepository::with_codes(["A1"]));
        let config = RunnerConfig {
            poll_interval: Duration::from_millis(5),
            stop_when_drained: true,
            ..RunnerConfig::default()
        };
        let runner = BatchRunner::new(store.clone(), classifier(), config);

        assert_eq!(runner.run().await.unwrap().failed, 1);
        store.reset_status().await.unwrap();
        assert_eq!(runner.run().await.unwrap().failed, 1);
        assert!(!runner.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let store = Arc::new(MemoryStatusRepository::new());
        let runner = BatchRunner::new(store, classifier(), RunnerConfig::default());
        runner.shutdown_token().cancel();
        assert_eq!(runner.run().await.unwrap(), BatchSummary::default());
    }
}
