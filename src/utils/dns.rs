//! Mail routing resolution with a shared, single-flight cache.
//!
//! [`DnsLookup`] is the raw record source (trust-dns in production, a stub in
//! tests). [`DomainResolver`] sits on top of it and owns the cache: concurrent
//! callers asking for the same uncached domain wait on one in-flight lookup and
//! all receive its outcome.

use crate::core::config::Config;
use crate::core::error::{AppError, ResolutionError, Result};
use crate::core::models::ResolvedDomain;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;

/// A single MX answer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }

    /// RFC 7505 null MX: the domain explicitly accepts no mail.
    pub fn is_null(&self) -> bool {
        let exchange = self.exchange.trim();
        exchange.is_empty() || exchange == "."
    }
}

/// Raw record lookups.
///
/// An existing domain without records of the requested type yields `Ok(vec![])`;
/// `Err` is reserved for NXDOMAIN, timeouts and server failures.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> std::result::Result<Vec<MxRecord>, ResolutionError>;
    async fn lookup_ip(&self, domain: &str) -> std::result::Result<Vec<IpAddr>, ResolutionError>;
}

/// Production lookups backed by trust-dns.
pub struct TrustDnsLookup {
    resolver: TokioAsyncResolver,
}

impl TrustDnsLookup {
    pub fn new(resolver: TokioAsyncResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl DnsLookup for TrustDnsLookup {
    async fn lookup_mx(&self, domain: &str) -> std::result::Result<Vec<MxRecord>, ResolutionError> {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|mx| {
                    MxRecord::new(
                        mx.preference(),
                        mx.exchange().to_ascii().trim_end_matches('.').to_string(),
                    )
                })
                .collect()),
            Err(e) => classify_resolve_error(&e).map(|()| Vec::new()),
        }
    }

    async fn lookup_ip(&self, domain: &str) -> std::result::Result<Vec<IpAddr>, ResolutionError> {
        match self.resolver.lookup_ip(domain).await {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(e) => classify_resolve_error(&e).map(|()| Vec::new()),
        }
    }
}

/// `Ok(())` means "the name exists but has no records of this type".
fn classify_resolve_error(err: &ResolveError) -> std::result::Result<(), ResolutionError> {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::NXDomain => Err(ResolutionError::NxDomain),
            ResponseCode::NoError => Ok(()),
            _ => Err(ResolutionError::ServFail),
        },
        ResolveErrorKind::Timeout => Err(ResolutionError::Timeout),
        _ => {
            tracing::debug!(target: "dns", "Unclassified resolver error: {}", err);
            Err(ResolutionError::ServFail)
        }
    }
}

/// Creates the trust-dns resolver from configuration.
///
/// An empty `dns_servers` list uses the system configuration.
pub fn create_resolver(config: &Config) -> Result<TokioAsyncResolver> {
    let mut opts = ResolverOpts::default();
    opts.timeout = config.dns_timeout;
    opts.attempts = 2;
    // Our own cache sits above this one; keep the resolver's small.
    opts.cache_size = 64;

    if config.dns_servers.is_empty() {
        let (sys_config, mut sys_opts) =
            trust_dns_resolver::system_conf::read_system_conf().map_err(|e| {
                AppError::Initialization(format!("Failed to read system DNS config: {}", e))
            })?;
        sys_opts.timeout = opts.timeout;
        sys_opts.attempts = opts.attempts;
        sys_opts.cache_size = opts.cache_size;
        tracing::debug!(target: "dns", "Using system DNS configuration");
        return Ok(TokioAsyncResolver::tokio(sys_config, sys_opts));
    }

    let ips = config
        .dns_servers
        .iter()
        .map(|s| s.parse::<IpAddr>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
    tracing::debug!(target: "dns", "Using {} configured DNS servers", ips.len());
    Ok(TokioAsyncResolver::tokio(
        ResolverConfig::from_parts(None, vec![], group),
        opts,
    ))
}

type Resolution = std::result::Result<Arc<ResolvedDomain>, ResolutionError>;

/// One cache entry: empty while the first lookup is in flight.
struct Slot {
    cell: OnceCell<(Instant, Resolution)>,
}

impl Slot {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }
}

/// Resolves domains to mail hosts, caching positive and negative outcomes.
pub struct DomainResolver {
    lookup: Arc<dyn DnsLookup>,
    timeout: Duration,
    ttl: Duration,
    negative_ttl: Duration,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl DomainResolver {
    pub fn new(lookup: Arc<dyn DnsLookup>, config: &Config) -> Self {
        Self {
            lookup,
            timeout: config.dns_timeout,
            ttl: config.dns_cache_ttl,
            negative_ttl: config.dns_negative_cache_ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the mail routing for `domain`, collapsing concurrent lookups.
    pub async fn resolve(&self, domain: &str) -> Resolution {
        let key = domain.trim_end_matches('.').to_lowercase();
        let slot = self.slot_for(&key);

        let (_, outcome) = slot
            .cell
            .get_or_init(|| async {
                let outcome = self.resolve_uncached(&key).await;
                (Instant::now(), outcome)
            })
            .await;
        let outcome = outcome.clone();

        // Timeouts are shared with whoever was waiting, but the next caller retries.
        if outcome == Err(ResolutionError::Timeout) {
            let mut slots = self.slots.lock();
            if slots.get(&key).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                slots.remove(&key);
            }
        }
        outcome
    }

    fn slot_for(&self, key: &str) -> Arc<Slot> {
        let mut slots = self.slots.lock();
        if let Some(existing) = slots.get(key) {
            let expired = existing
                .cell
                .get()
                .is_some_and(|(at, outcome)| at.elapsed() >= self.ttl_for(outcome));
            if !expired {
                tracing::trace!(target: "dns", "Cache hit (or in flight) for {}", key);
                return Arc::clone(existing);
            }
        }
        let slot = Arc::new(Slot::new());
        slots.insert(key.to_string(), Arc::clone(&slot));
        slot
    }

    fn ttl_for(&self, outcome: &Resolution) -> Duration {
        if outcome.is_ok() {
            self.ttl
        } else {
            self.negative_ttl
        }
    }

    async fn resolve_uncached(&self, domain: &str) -> Resolution {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.lookup_routes(domain)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ResolutionError::Timeout),
        };
        match &outcome {
            Ok(resolved) => tracing::debug!(target: "dns",
                "Resolved {} -> {:?} (implicit_mx={}) in {:.2?}",
                domain, resolved.mx_hosts, resolved.implicit_mx, started.elapsed()),
            Err(e) => tracing::debug!(target: "dns", "Resolution of {} failed in {:.2?}: {}",
                domain, started.elapsed(), e),
        }
        outcome
    }

    async fn lookup_routes(&self, domain: &str) -> Resolution {
        let mut records = self.lookup.lookup_mx(domain).await?;

        if !records.is_empty() {
            if records.iter().all(MxRecord::is_null) {
                return Err(ResolutionError::NoMxNoA);
            }
            records.retain(|r| !r.is_null());
            records.sort();
            records.dedup_by(|a, b| a.exchange.eq_ignore_ascii_case(&b.exchange));
            return Ok(Arc::new(ResolvedDomain {
                domain: domain.to_string(),
                mx_hosts: records.into_iter().map(|r| r.exchange).collect(),
                fallback_addrs: Vec::new(),
                implicit_mx: false,
                resolved_at: Utc::now(),
                ttl: self.ttl,
            }));
        }

        let addrs = self.lookup.lookup_ip(domain).await?;
        if addrs.is_empty() {
            return Err(ResolutionError::NoMxNoA);
        }
        Ok(Arc::new(ResolvedDomain {
            domain: domain.to_string(),
            mx_hosts: vec![domain.to_string()],
            fallback_addrs: addrs,
            implicit_mx: true,
            resolved_at: Utc::now(),
            ttl: self.ttl,
        }))
    }

    /// Drops entries whose TTL has elapsed. In-flight entries are kept.
    pub fn purge_expired(&self) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|_, slot| match slot.cell.get() {
            Some((at, outcome)) => at.elapsed() < self.ttl_for(outcome),
            None => true,
        });
        before - slots.len()
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
        tracing::debug!(target: "dns", "Domain cache cleared");
    }

    pub fn cached_len(&self) -> usize {
        self.slots.lock().len()
    }
}
