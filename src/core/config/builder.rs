//! Layered construction of [`Config`]: defaults, then file values, then explicit overrides.

use super::file::ConfigFile;
use super::validation::validate_config;
use super::Config;
use crate::core::error::Result;
use std::time::Duration;

/// Fluent builder producing a validated [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies every value present in a parsed configuration file.
    pub fn with_file(mut self, file: &ConfigFile, path: Option<String>) -> Self {
        let c = &mut self.config;

        if let Some(secs) = file.dns.dns_timeout {
            c.dns_timeout = Duration::from_secs(secs);
        }
        if let Some(servers) = &file.dns.dns_servers {
            c.dns_servers = servers.clone();
        }
        if let Some(secs) = file.dns.cache_ttl {
            c.dns_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = file.dns.negative_cache_ttl {
            c.dns_negative_cache_ttl = Duration::from_secs(secs);
        }

        if let Some(enabled) = file.smtp.enabled {
            c.enable_smtp = enabled;
        }
        if let Some(secs) = file.smtp.smtp_timeout {
            c.smtp_timeout = Duration::from_secs(secs);
        }
        if let Some(sender) = &file.smtp.smtp_sender_email {
            c.smtp_sender_email = sender.clone();
        }
        if let Some(name) = &file.smtp.hello_name {
            c.smtp_hello_name = Some(name.clone());
        }
        if let Some(port) = file.smtp.port {
            c.smtp_port = port;
        }
        if let Some(hosts) = file.smtp.max_mx_hosts {
            c.max_mx_hosts = hosts;
        }
        if let Some(check) = file.smtp.check_catch_all {
            c.check_catch_all = check;
        }

        if let Some(n) = file.pool.default_concurrency {
            c.default_concurrency = n;
        }
        if let Some(n) = file.pool.max_concurrency {
            c.max_concurrency = n;
        }
        if let Some(secs) = file.pool.batch_timeout {
            c.batch_timeout = Some(Duration::from_secs(secs));
        }

        c.loaded_config_path = path;
        self
    }

    pub fn dns_timeout(mut self, timeout: Duration) -> Self {
        self.config.dns_timeout = timeout;
        self
    }

    pub fn dns_servers(mut self, servers: Vec<String>) -> Self {
        self.config.dns_servers = servers;
        self
    }

    pub fn dns_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.dns_cache_ttl = ttl;
        self
    }

    pub fn enable_smtp(mut self, enabled: bool) -> Self {
        self.config.enable_smtp = enabled;
        self
    }

    pub fn smtp_timeout(mut self, timeout: Duration) -> Self {
        self.config.smtp_timeout = timeout;
        self
    }

    pub fn smtp_sender_email(mut self, sender: impl Into<String>) -> Self {
        self.config.smtp_sender_email = sender.into();
        self
    }

    pub fn smtp_hello_name(mut self, name: impl Into<String>) -> Self {
        self.config.smtp_hello_name = Some(name.into());
        self
    }

    pub fn smtp_port(mut self, port: u16) -> Self {
        self.config.smtp_port = port;
        self
    }

    pub fn max_mx_hosts(mut self, hosts: usize) -> Self {
        self.config.max_mx_hosts = hosts;
        self
    }

    pub fn check_catch_all(mut self, check: bool) -> Self {
        self.config.check_catch_all = check;
        self
    }

    pub fn default_concurrency(mut self, workers: usize) -> Self {
        self.config.default_concurrency = workers;
        self
    }

    pub fn max_concurrency(mut self, workers: usize) -> Self {
        self.config.max_concurrency = workers;
        self
    }

    pub fn batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.batch_timeout = timeout;
        self
    }

    /// Validates the accumulated settings and returns the final configuration.
    pub fn build(self) -> Result<Config> {
        validate_config(&self.config)?;
        tracing::debug!("Configuration built: {:?}", self.config);
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults_and_explicit_setters_win() {
        let file: ConfigFile = toml::from_str(
            r#"
            [dns]
            dns_timeout = 2
            [smtp]
            smtp_sender_email = "probe@checker.io"
            port = 2525
            [pool]
            default_concurrency = 4
            "#,
        )
        .expect("valid toml");

        let config = ConfigBuilder::new()
            .with_file(&file, Some("mailprobe.toml".into()))
            .smtp_port(587)
            .build()
            .expect("valid config");

        assert_eq!(config.dns_timeout, Duration::from_secs(2));
        assert_eq!(config.smtp_sender_email, "probe@checker.io");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.default_concurrency, 4);
        assert_eq!(config.loaded_config_path.as_deref(), Some("mailprobe.toml"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed: std::result::Result<ConfigFile, _> = toml::from_str("[smtp]\nbogus = 1\n");
        assert!(parsed.is_err());
    }
}
