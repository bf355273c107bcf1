//! Defines the error types for the mailprobe validation engine.
//!
//! Two families live here. [`AppError`] covers hard failures that surface to the
//! caller (configuration, initialization, export I/O). The per-stage errors
//! ([`SyntaxError`], [`ResolutionError`], [`ProbeError`]) never abort a batch: the
//! pipeline folds them into a verdict and a `reason` string on the result.

use std::{fmt, io, net::AddrParseError, path::PathBuf};
use thiserror::Error;

/// The primary error type for hard failures.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error initializing necessary components (e.g., resolvers).
    #[error("Initialization Error: {0}")]
    Initialization(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Writing an export artifact failed.
    #[error("Write Failed for {}: {source}", path.display())]
    WriteFailed {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reading or writing tabular output.
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    /// Error parsing the TOML configuration file.
    #[error("TOML Error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Error parsing an IP address or socket address.
    #[error("Address Parsing Error: {0}")]
    AddrParse(#[from] AddrParseError),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Classification of a syntactic rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    Empty,
    MissingAt,
    MultipleAt,
    EmptyLocal,
    EmptyDomain,
    DomainWithoutDot,
    LocalTooLong,
    DomainTooLong,
    AddressTooLong,
    ControlCharacter,
    InvalidLocalPart,
    InvalidDomain,
}

impl SyntaxErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::MissingAt => "missing_at",
            Self::MultipleAt => "multiple_at",
            Self::EmptyLocal => "empty_local_part",
            Self::EmptyDomain => "empty_domain",
            Self::DomainWithoutDot => "domain_without_dot",
            Self::LocalTooLong => "local_part_too_long",
            Self::DomainTooLong => "domain_too_long",
            Self::AddressTooLong => "address_too_long",
            Self::ControlCharacter => "control_character",
            Self::InvalidLocalPart => "invalid_local_part",
            Self::InvalidDomain => "invalid_domain",
        }
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw address failed structural validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax: {kind}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind) -> Self {
        Self { kind }
    }
}

/// Outcome classes of a failed domain resolution.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionError {
    /// The domain does not exist.
    #[error("resolution: nxdomain")]
    NxDomain,
    /// The lookup did not complete within the configured bound.
    #[error("resolution: timeout")]
    Timeout,
    /// The upstream server failed to answer authoritatively.
    #[error("resolution: servfail")]
    ServFail,
    /// The domain exists but publishes neither MX nor A/AAAA records (or a null MX).
    #[error("resolution: no_mx_no_a")]
    NoMxNoA,
}

impl ResolutionError {
    /// Only timeouts are ambiguous; every other class proves the domain cannot take mail.
    pub fn is_conclusive(&self) -> bool {
        !matches!(self, Self::Timeout)
    }

    pub fn domain_exists(&self) -> bool {
        matches!(self, Self::NoMxNoA)
    }
}

/// Failure to obtain a RCPT verdict from any mail host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("smtp_connect_failed: {0}")]
    ConnectFailed(String),
    #[error("smtp_timeout: {0}")]
    Timeout(String),
    #[error("smtp_protocol_error: {0}")]
    Protocol(String),
}

impl ProbeError {
    /// Short class name used as the result `reason`.
    pub fn class(&self) -> &'static str {
        match self {
            Self::ConnectFailed(_) => "smtp_connect_failed",
            Self::Timeout(_) => "smtp_timeout",
            Self::Protocol(_) => "smtp_protocol_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_render_reason_prefixes() {
        let syntax = SyntaxError::new(SyntaxErrorKind::MultipleAt);
        assert_eq!(syntax.to_string(), "syntax: multiple_at");
        assert_eq!(ResolutionError::NxDomain.to_string(), "resolution: nxdomain");
        assert!(!ResolutionError::Timeout.is_conclusive());
        assert!(ResolutionError::ServFail.is_conclusive());
        assert_eq!(ProbeError::Timeout("mx1".into()).class(), "smtp_timeout");
    }

    #[test]
    fn hard_failures_convert_with_question_mark() {
        fn parse_server(raw: &str) -> Result<std::net::IpAddr> {
            Ok(raw.parse()?)
        }
        assert!(matches!(parse_server("not-an-ip"), Err(AppError::AddrParse(_))));

        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.toml")?)
        }
        assert!(matches!(read_missing(), Err(AppError::Io(_))));
    }
}
