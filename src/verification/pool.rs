//! Bounded fan-out of pipeline runs over a batch.
//!
//! Each address is tagged with its input index and its result lands in a
//! pre-sized slot, so output order equals input order whatever order the
//! workers finish in.

use super::pipeline::ValidationPipeline;
use crate::core::config::Config;
use crate::core::models::{BatchSummary, ValidationResult};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Reason recorded for addresses that were never dispatched.
pub const CANCELLED: &str = "cancelled";

/// Cooperative cancellation shared between a caller and a running batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops further dispatch; in-flight addresses finish within their stage timeouts.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Per-batch parameters supplied by the caller.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub from: String,
    pub smtp_enabled: bool,
    /// Requested worker count; zero or negative selects the default.
    pub concurrency: i64,
}

/// Runs the pipeline over batches with bounded concurrency.
#[derive(Clone)]
pub struct WorkerPool {
    pipeline: ValidationPipeline,
    config: Arc<Config>,
}

impl WorkerPool {
    pub fn new(pipeline: ValidationPipeline, config: Arc<Config>) -> Self {
        Self { pipeline, config }
    }

    pub async fn run(&self, addresses: &[String], request: &BatchRequest) -> Vec<ValidationResult> {
        self.run_with(addresses, request, &CancelToken::new(), |_, _| {})
            .await
    }

    /// Like [`run`](Self::run), with cancellation and a per-result callback.
    ///
    /// `on_result` receives the input index of each finished address, in
    /// completion order.
    pub async fn run_with<F>(
        &self,
        addresses: &[String],
        request: &BatchRequest,
        cancel: &CancelToken,
        mut on_result: F,
    ) -> Vec<ValidationResult>
    where
        F: FnMut(usize, &ValidationResult),
    {
        if addresses.is_empty() {
            return Vec::new();
        }

        let workers = self.config.effective_concurrency(request.concurrency);
        let deadline = self.config.batch_timeout.map(|t| Instant::now() + t);
        let started = Instant::now();
        tracing::info!(target: "worker_pool", "Validating {} addresses with {} workers (smtp={})",
            addresses.len(), workers, request.smtp_enabled);

        let from: Arc<str> = Arc::from(request.from.as_str());
        let smtp_enabled = request.smtp_enabled;
        let mut slots: Vec<Option<ValidationResult>> = vec![None; addresses.len()];

        let dispatch = stream::iter(addresses.iter().cloned().enumerate())
            .take_while(|_| {
                let expired = deadline.is_some_and(|d| Instant::now() >= d);
                futures::future::ready(!cancel.is_cancelled() && !expired)
            })
            .map(|(index, raw)| {
                let pipeline = self.pipeline.clone();
                let from = Arc::clone(&from);
                async move {
                    let task_raw = raw.clone();
                    let handle = tokio::spawn(async move {
                        pipeline.validate(&task_raw, &from, smtp_enabled).await
                    });
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!(target: "worker_pool", "[{}] Worker failed: {}", raw, e);
                            let class = if e.is_panic() { "internal_error: panic" } else { "internal_error: aborted" };
                            ValidationResult::unknown(&raw, class)
                        }
                    };
                    (index, result)
                }
            })
            .buffer_unordered(workers);
        futures::pin_mut!(dispatch);

        let mut completed = 0usize;
        while let Some((index, result)) = dispatch.next().await {
            completed += 1;
            tracing::trace!(target: "worker_pool", "Completed {}/{} (index {})", completed, addresses.len(), index);
            on_result(index, &result);
            slots[index] = Some(result);
        }

        if completed < addresses.len() {
            tracing::warn!(target: "worker_pool", "Batch stopped early: {} of {} addresses dispatched",
                completed, addresses.len());
        }

        let results: Vec<ValidationResult> = slots
            .into_iter()
            .zip(addresses)
            .map(|(slot, raw)| slot.unwrap_or_else(|| ValidationResult::unknown(raw, CANCELLED)))
            .collect();

        tracing::info!(target: "worker_pool", "Batch finished in {:.2?}: {}",
            started.elapsed(), BatchSummary::from_results(&results));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ResolutionError;
    use crate::core::models::Deliverable;
    use crate::utils::dns::{DnsLookup, DomainResolver, MxRecord};
    use crate::utils::smtp::SmtpProbe;
    use async_trait::async_trait;
    use std::net::IpAddr;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Each domain `dN.io` answers after N*10ms; `panic.io` panics.
    #[derive(Default)]
    struct DelayLookup {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl DnsLookup for DelayLookup {
        async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolutionError> {
            if domain == "panic.io" {
                panic!("lookup exploded");
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let n: u64 = domain
                .trim_start_matches('d')
                .trim_end_matches(".io")
                .parse()
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(n * 10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![MxRecord::new(10, format!("mx.{domain}"))])
        }

        async fn lookup_ip(&self, _domain: &str) -> Result<Vec<IpAddr>, ResolutionError> {
            Ok(Vec::new())
        }
    }

    fn pool_with(lookup: Arc<DelayLookup>, config: Config) -> WorkerPool {
        let resolver = Arc::new(DomainResolver::new(lookup, &config));
        let pipeline = ValidationPipeline::new(resolver, SmtpProbe::new(&config));
        WorkerPool::new(pipeline, Arc::new(config))
    }

    fn request(concurrency: i64) -> BatchRequest {
        BatchRequest {
            from: "noreply@example.com".into(),
            smtp_enabled: false,
            concurrency,
        }
    }

    fn batch(n: usize) -> Vec<String> {
        // Earlier entries are slower, so completion order is reversed.
        (0..n).map(|i| format!("user{i}@d{}.io", n - i)).collect()
    }

    #[tokio::test]
    async fn empty_batch_returns_empty() {
        let pool = pool_with(Arc::default(), Config::default());
        assert!(pool.run(&[], &request(4)).await.is_empty());
    }

    #[tokio::test]
    async fn output_order_matches_input_order() {
        let addresses = batch(8);
        let pool = pool_with(Arc::default(), Config::default());
        let mut completion = Vec::new();
        let results = pool
            .run_with(&addresses, &request(8), &CancelToken::new(), |i, _| completion.push(i))
            .await;

        let emails: Vec<&str> = results.iter().map(|r| r.email.as_str()).collect();
        let inputs: Vec<&str> = addresses.iter().map(String::as_str).collect();
        assert_eq!(emails, inputs);
        assert_ne!(completion, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let lookup = Arc::new(DelayLookup::default());
        let pool = pool_with(Arc::clone(&lookup), Config::default());
        let results = pool.run(&batch(12), &request(3)).await;
        assert_eq!(results.len(), 12);
        assert!(lookup.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn panicking_worker_does_not_abort_batch() {
        let addresses = vec![
            "a@d1.io".to_string(),
            "b@panic.io".to_string(),
            "c@d1.io".to_string(),
        ];
        let pool = pool_with(Arc::default(), Config::default());
        let results = pool.run(&addresses, &request(2)).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].deliverable, Deliverable::Unknown);
        assert!(results[1].reason.starts_with("internal_error"));
        assert_eq!(results[2].reason, "smtp_skipped");
    }

    #[tokio::test]
    async fn cancellation_stops_dispatch_but_keeps_length() {
        let addresses = batch(6);
        let pool = pool_with(Arc::default(), Config::default());
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let results = pool
            .run_with(&addresses, &request(1), &cancel, |_, _| trigger.cancel())
            .await;
        assert_eq!(results.len(), 6);
        assert_eq!(results[0].reason, "smtp_skipped");
        assert!(results[1..].iter().all(|r| r.reason == CANCELLED));
    }

    #[tokio::test]
    async fn batch_deadline_behaves_like_cancellation() {
        let config = Config {
            batch_timeout: Some(Duration::ZERO),
            ..Config::default()
        };
        let pool = pool_with(Arc::default(), config);
        let results = pool.run(&batch(3), &request(1)).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.reason == CANCELLED));
    }
}
