//! Per-address validation: parse, resolve, probe.
//!
//! Every stage writes its outcome into the accumulating [`ValidationResult`]. A
//! failing stage ends the run; nothing here returns an error to the caller.

use crate::core::models::{Deliverable, EmailAddress, ResolvedDomain, ValidationResult};
use crate::utils::address::parse_address;
use crate::utils::classify::{
    identify_provider, is_disposable_domain, is_free_provider, is_no_reply, is_role_account,
};
use crate::utils::dns::DomainResolver;
use crate::utils::smtp::SmtpProbe;
use std::sync::Arc;
use std::time::Instant;

/// Reason recorded when probing is turned off.
pub const SMTP_SKIPPED: &str = "smtp_skipped";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Parse,
    Resolve,
    Probe,
    Done,
}

/// Composes the address parser, the domain resolver and the SMTP probe.
#[derive(Clone)]
pub struct ValidationPipeline {
    resolver: Arc<DomainResolver>,
    probe: SmtpProbe,
}

impl ValidationPipeline {
    pub fn new(resolver: Arc<DomainResolver>, probe: SmtpProbe) -> Self {
        Self { resolver, probe }
    }

    pub fn resolver(&self) -> &Arc<DomainResolver> {
        &self.resolver
    }

    /// Produces the verdict for one raw address.
    pub async fn validate(&self, raw: &str, from: &str, smtp_enabled: bool) -> ValidationResult {
        let started = Instant::now();
        let mut result = ValidationResult::pending(raw);
        let mut stage = Stage::Parse;
        let mut address = None;
        let mut routes = None;

        while stage != Stage::Done {
            stage = match stage {
                Stage::Parse => match parse_address(raw) {
                    Ok(parsed) => {
                        record_parse(&mut result, &parsed);
                        address = Some(parsed);
                        Stage::Resolve
                    }
                    Err(e) => {
                        result.conclude(Deliverable::Invalid, e.to_string());
                        Stage::Done
                    }
                },
                Stage::Resolve => match address.as_ref() {
                    Some(parsed) => match self.resolver.resolve(&parsed.domain).await {
                        Ok(resolved) => {
                            record_routes(&mut result, &parsed.domain, &resolved);
                            routes = Some(resolved);
                            Stage::Probe
                        }
                        Err(e) => {
                            result.domain_exists = e.domain_exists();
                            let verdict = if e.is_conclusive() {
                                Deliverable::Invalid
                            } else {
                                Deliverable::Unknown
                            };
                            result.conclude(verdict, e.to_string());
                            Stage::Done
                        }
                    },
                    None => Stage::Done,
                },
                Stage::Probe => {
                    match (address.as_ref(), routes.as_ref()) {
                        (Some(parsed), Some(resolved)) if smtp_enabled => {
                            self.run_probe(&mut result, parsed, resolved, from).await;
                        }
                        _ => result.conclude(Deliverable::Unknown, SMTP_SKIPPED),
                    }
                    Stage::Done
                }
                Stage::Done => Stage::Done,
            };
        }

        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(target: "pipeline", "[{}] {} ({}) in {}ms",
            raw, result.deliverable, result.reason, result.duration_ms);
        result
    }

    async fn run_probe(
        &self,
        result: &mut ValidationResult,
        address: &EmailAddress,
        resolved: &ResolvedDomain,
        from: &str,
    ) {
        result.smtp_checked = true;
        match self
            .probe
            .probe(&resolved.mx_hosts, from, &address.normalized())
            .await
        {
            Ok(outcome) => {
                result.smtp_code = Some(outcome.code);
                result.mx_host = Some(outcome.host.clone());
                result.accept_all = outcome.is_catch_all;
                result.mailbox_full = outcome.is_mailbox_full();
                result.smtp_provider =
                    Some(identify_provider(&address.domain, &outcome.host).to_string());
                let (verdict, reason) = outcome.verdict();
                result.conclude(verdict, reason);
            }
            Err(e) => {
                // Connection-level failures never prove an address invalid.
                result.conclude(Deliverable::Unknown, e.class());
            }
        }
    }
}

fn record_parse(result: &mut ValidationResult, address: &EmailAddress) {
    result.syntax_valid = true;
    result.domain = address.domain.clone();
    result.is_role = is_role_account(&address.local);
    result.is_free = is_free_provider(&address.domain);
    result.is_disposable = is_disposable_domain(&address.domain);
    result.is_no_reply = is_no_reply(&address.local);
}

fn record_routes(result: &mut ValidationResult, domain: &str, resolved: &ResolvedDomain) {
    result.domain_exists = true;
    result.mx_found = resolved.has_mx();
    result.implicit_mx = resolved.implicit_mx;
    result.mx_host = resolved.primary_host().map(str::to_string);
    result.smtp_provider = resolved
        .primary_host()
        .map(|host| identify_provider(domain, host).to_string());
}
