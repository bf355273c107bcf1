//! The public entry point: single-address and batch validation plus export.

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::export::{write_results, ExportPaths};
use crate::core::models::ValidationResult;
use crate::utils::dns::{create_resolver, DnsLookup, DomainResolver, TrustDnsLookup};
use crate::utils::smtp::SmtpProbe;
use crate::verification::{BatchRequest, CancelToken, ValidationPipeline, WorkerPool};
use std::path::Path;
use std::sync::Arc;

/// Owns the shared resolver cache and the worker pool.
///
/// Cloning is cheap; clones share the domain cache.
#[derive(Clone)]
pub struct EmailVerifier {
    config: Arc<Config>,
    pipeline: ValidationPipeline,
    pool: WorkerPool,
}

impl EmailVerifier {
    /// Creates a verifier resolving through trust-dns.
    pub fn new(config: Config) -> Result<Self> {
        tracing::debug!("Initializing EmailVerifier components...");
        let resolver = create_resolver(&config)?;
        tracing::debug!("DNS resolver initialized.");
        Ok(Self::with_lookup(config, Arc::new(TrustDnsLookup::new(resolver))))
    }

    /// Creates a verifier on top of any record source.
    pub fn with_lookup(config: Config, lookup: Arc<dyn DnsLookup>) -> Self {
        let config = Arc::new(config);
        let resolver = Arc::new(DomainResolver::new(lookup, &config));
        let pipeline = ValidationPipeline::new(resolver, SmtpProbe::new(&config));
        let pool = WorkerPool::new(pipeline.clone(), Arc::clone(&config));
        tracing::info!("EmailVerifier initialized (smtp default={}).", config.enable_smtp);
        Self {
            config,
            pipeline,
            pool,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validates one address.
    pub async fn validate_one(
        &self,
        raw: &str,
        from: &str,
        smtp_enabled: bool,
    ) -> ValidationResult {
        self.pipeline.validate(raw, from, smtp_enabled).await
    }

    /// Validates a batch; results are index-aligned with `addresses`.
    pub async fn validate_batch(
        &self,
        addresses: &[String],
        from: &str,
        smtp_enabled: bool,
        concurrency: i64,
    ) -> Vec<ValidationResult> {
        let request = BatchRequest {
            from: from.to_string(),
            smtp_enabled,
            concurrency,
        };
        self.validate_batch_with(addresses, &request, &CancelToken::new(), |_, _| {})
            .await
    }

    /// Batch validation with cooperative cancellation and a progress callback.
    pub async fn validate_batch_with<F>(
        &self,
        addresses: &[String],
        request: &BatchRequest,
        cancel: &CancelToken,
        on_result: F,
    ) -> Vec<ValidationResult>
    where
        F: FnMut(usize, &ValidationResult),
    {
        let results = self
            .pool
            .run_with(addresses, request, cancel, on_result)
            .await;
        let purged = self.pipeline.resolver().purge_expired();
        if purged > 0 {
            tracing::debug!(target: "dns", "Purged {} expired cache entries", purged);
        }
        results
    }

    /// Writes `results.json` and `results.csv` into `dest_dir`.
    pub fn export_results(&self, results: &[ValidationResult], dest_dir: &Path) -> Result<ExportPaths> {
        write_results(results, dest_dir)
    }

    /// Forgets every cached domain resolution.
    pub fn clear_dns_cache(&self) {
        self.pipeline.resolver().clear();
    }
}
