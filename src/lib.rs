//! mailprobe core: concurrent bulk email validation.
//!
//! Addresses go through syntax checks, MX resolution (with a shared single-flight
//! cache) and an optional SMTP `RCPT TO` probe. Batches run on a bounded worker
//! pool and come back in input order, ready for export as JSON and CSV.

pub mod core;
pub mod utils;
pub mod verification;

pub use crate::core::config::{load_config_file, Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{
    AppError, ProbeError, ResolutionError, Result, SyntaxError, SyntaxErrorKind,
};
pub use crate::core::export::{read_table, write_results, ExportPaths};
pub use crate::core::models::{
    BatchSummary, Deliverable, EmailAddress, ResolvedDomain, ValidationResult,
};
pub use crate::core::verifier::EmailVerifier;
pub use crate::utils::address::parse_address;
pub use crate::utils::dns::{DnsLookup, MxRecord};
pub use crate::verification::{BatchRequest, CancelToken};
