//! Sanity checks applied before a [`Config`] is handed to the engine.

use super::Config;
use crate::core::error::{AppError, Result};
use crate::utils::address::parse_address;
use std::net::IpAddr;

pub(crate) fn validate_config(config: &Config) -> Result<()> {
    if config.dns_timeout.is_zero() {
        return Err(AppError::Config("dns_timeout must be greater than zero".into()));
    }
    if config.smtp_timeout.is_zero() {
        return Err(AppError::Config("smtp_timeout must be greater than zero".into()));
    }
    if config.default_concurrency == 0 {
        return Err(AppError::Config(
            "default_concurrency must be at least 1".into(),
        ));
    }
    if config.max_concurrency == 0 {
        return Err(AppError::Config("max_concurrency must be at least 1".into()));
    }
    if config.max_mx_hosts == 0 {
        return Err(AppError::Config("max_mx_hosts must be at least 1".into()));
    }
    if config.smtp_port == 0 {
        return Err(AppError::Config("smtp_port must be non-zero".into()));
    }
    if let Err(e) = parse_address(&config.smtp_sender_email) {
        return Err(AppError::Config(format!(
            "smtp_sender_email '{}' is not a usable address ({})",
            config.smtp_sender_email, e.kind
        )));
    }
    for server in &config.dns_servers {
        if server.parse::<IpAddr>().is_err() {
            return Err(AppError::Config(format!(
                "dns server '{}' is not an IP address",
                server
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_bad_sender_and_zero_timeouts() {
        let mut config = Config::default();
        config.smtp_sender_email = "not-an-address".into();
        assert!(matches!(validate_config(&config), Err(AppError::Config(_))));

        let mut config = Config::default();
        config.smtp_timeout = Duration::ZERO;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.dns_servers = vec!["resolver.example".into()];
        assert!(validate_config(&config).is_err());
    }
}
