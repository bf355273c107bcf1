//! Data types shared across the validation stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// A syntactically valid address split into its parts.
///
/// `domain` is lowercase ASCII (IDNA labels already converted to punycode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    pub raw: String,
    pub local: String,
    pub domain: String,
}

impl EmailAddress {
    /// The address as it is presented to mail servers.
    pub fn normalized(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }
}

/// Mail routing information for a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDomain {
    pub domain: String,
    /// MX exchanges, ascending by preference. When the domain has no MX records this
    /// holds the domain itself (implicit MX).
    pub mx_hosts: Vec<String>,
    /// A/AAAA records used for the implicit MX fallback.
    pub fallback_addrs: Vec<IpAddr>,
    pub implicit_mx: bool,
    pub resolved_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl ResolvedDomain {
    pub fn has_mx(&self) -> bool {
        !self.implicit_mx && !self.mx_hosts.is_empty()
    }

    pub fn primary_host(&self) -> Option<&str> {
        self.mx_hosts.first().map(String::as_str)
    }
}

/// Final classification of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deliverable {
    Valid,
    Invalid,
    Unknown,
    Risky,
}

impl Deliverable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Deliverable::Valid => "valid",
            Deliverable::Invalid => "invalid",
            Deliverable::Unknown => "unknown",
            Deliverable::Risky => "risky",
        }
    }
}

impl fmt::Display for Deliverable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One verdict per input address. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub email: String,
    pub syntax_valid: bool,
    pub domain_exists: bool,
    pub mx_found: bool,
    pub smtp_checked: bool,
    pub smtp_code: Option<u16>,
    pub deliverable: Deliverable,
    pub reason: String,
    pub duration_ms: u64,
    pub domain: String,
    pub mx_host: Option<String>,
    pub implicit_mx: bool,
    pub is_role: bool,
    pub is_free: bool,
    pub is_disposable: bool,
    pub is_no_reply: bool,
    pub accept_all: bool,
    pub mailbox_full: bool,
    pub smtp_provider: Option<String>,
    /// Deliverability score from 0 to 100, derived from the verdict and flags.
    pub score: u8,
}

impl ValidationResult {
    /// A blank result for `raw`; the pipeline fills it stage by stage.
    pub fn pending(raw: &str) -> Self {
        Self {
            email: raw.to_string(),
            syntax_valid: false,
            domain_exists: false,
            mx_found: false,
            smtp_checked: false,
            smtp_code: None,
            deliverable: Deliverable::Unknown,
            reason: String::new(),
            duration_ms: 0,
            domain: String::new(),
            mx_host: None,
            implicit_mx: false,
            is_role: false,
            is_free: false,
            is_disposable: false,
            is_no_reply: false,
            accept_all: false,
            mailbox_full: false,
            smtp_provider: None,
            score: 0,
        }
    }

    /// Result for an address the pool could not run to completion.
    pub fn unknown(raw: &str, reason: impl Into<String>) -> Self {
        let mut result = Self::pending(raw);
        result.conclude(Deliverable::Unknown, reason);
        result
    }

    /// Sets the verdict; every flag the score depends on must already be set.
    pub(crate) fn conclude(&mut self, deliverable: Deliverable, reason: impl Into<String>) {
        self.deliverable = deliverable;
        self.reason = reason.into();
        self.score = self.deliverability_score();
    }

    fn deliverability_score(&self) -> u8 {
        let base: u8 = match self.deliverable {
            Deliverable::Invalid => return 0,
            Deliverable::Valid => 100,
            Deliverable::Risky => 60,
            Deliverable::Unknown if self.domain_exists => 50,
            Deliverable::Unknown => 20,
        };

        let mut risk = 0u8;
        if self.is_disposable {
            risk += 40;
        }
        if self.is_no_reply {
            risk += 20;
        }
        if self.is_role {
            risk += 10;
        }
        if self.implicit_mx {
            risk += 10;
        }
        if self.mailbox_full {
            risk += 10;
        }
        base.saturating_sub(risk)
    }
}

/// Verdict counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unknown: usize,
    pub risky: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut acc, result| {
                acc.total += 1;
                match result.deliverable {
                    Deliverable::Valid => acc.valid += 1,
                    Deliverable::Invalid => acc.invalid += 1,
                    Deliverable::Unknown => acc.unknown += 1,
                    Deliverable::Risky => acc.risky += 1,
                }
                acc
            })
    }

    pub fn count(&self, verdict: Deliverable) -> usize {
        match verdict {
            Deliverable::Valid => self.valid,
            Deliverable::Invalid => self.invalid,
            Deliverable::Unknown => self.unknown,
            Deliverable::Risky => self.risky,
        }
    }

    /// Share of the batch with the given verdict, rounded to a whole percent.
    pub fn percent(&self, verdict: Deliverable) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let share = self.count(verdict) as f64 * 100.0 / self.total as f64;
        share.round() as u8
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} valid={} ({}%) invalid={} ({}%) unknown={} ({}%) risky={} ({}%)",
            self.total,
            self.valid,
            self.percent(Deliverable::Valid),
            self.invalid,
            self.percent(Deliverable::Invalid),
            self.unknown,
            self.percent(Deliverable::Unknown),
            self.risky,
            self.percent(Deliverable::Risky),
        )
    }
}
