//! Defines the core runtime `Config` struct, its defaults, and related utilities.
//! Submodules handle loading, building, and validation.

pub(crate) mod builder;
pub(crate) mod file;
pub(crate) mod loading;
pub(crate) mod validation;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;
pub use loading::load_config_file;

use std::time::Duration;

/// Worker count used when the caller passes zero or a negative value.
pub const DEFAULT_CONCURRENCY: usize = 12;

/// Runtime configuration settings used by the validation engine.
#[derive(Clone, Debug)]
pub struct Config {
    pub dns_timeout: Duration,
    pub dns_servers: Vec<String>,
    pub dns_cache_ttl: Duration,
    pub dns_negative_cache_ttl: Duration,

    pub enable_smtp: bool,
    pub smtp_timeout: Duration,
    pub smtp_sender_email: String,
    pub smtp_hello_name: Option<String>,
    pub smtp_port: u16,
    pub max_mx_hosts: usize,
    pub check_catch_all: bool,

    pub default_concurrency: usize,
    pub max_concurrency: usize,
    pub batch_timeout: Option<Duration>,

    pub loaded_config_path: Option<String>,
}

impl Config {
    fn build_default() -> Self {
        Config {
            dns_timeout: Duration::from_secs(5),
            dns_servers: Vec::new(),
            dns_cache_ttl: Duration::from_secs(300),
            dns_negative_cache_ttl: Duration::from_secs(60),
            enable_smtp: true,
            smtp_timeout: Duration::from_secs(10),
            smtp_sender_email: "noreply@example.com".to_string(),
            smtp_hello_name: None,
            smtp_port: 25,
            max_mx_hosts: 3,
            check_catch_all: true,
            default_concurrency: DEFAULT_CONCURRENCY,
            max_concurrency: 256,
            batch_timeout: None,
            loaded_config_path: None,
        }
    }

    /// Name announced in EHLO: explicit setting, else the sender's domain.
    pub fn hello_name(&self) -> String {
        if let Some(name) = self.smtp_hello_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        self.smtp_sender_email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "localhost".to_string())
    }

    /// Maps a caller-supplied worker count onto the pool size actually used.
    ///
    /// Zero and negative values fall back to `default_concurrency`; anything above
    /// `max_concurrency` is clamped.
    pub fn effective_concurrency(&self, requested: i64) -> usize {
        let wanted = if requested <= 0 {
            self.default_concurrency
        } else {
            usize::try_from(requested).unwrap_or(self.max_concurrency)
        };
        wanted.clamp(1, self.max_concurrency.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::build_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_concurrency_defaults_to_twelve() {
        let config = Config::default();
        assert_eq!(config.effective_concurrency(0), 12);
        assert_eq!(config.effective_concurrency(-5), 12);
        assert_eq!(config.effective_concurrency(3), 3);
        assert_eq!(config.effective_concurrency(10_000), 256);
    }

    #[test]
    fn hello_name_falls_back_to_sender_domain() {
        let mut config = Config::default();
        assert_eq!(config.hello_name(), "example.com");
        config.smtp_hello_name = Some("probe.local".into());
        assert_eq!(config.hello_name(), "probe.local");
    }
}
