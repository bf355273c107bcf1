//! Defines the structure mirroring the TOML configuration file format.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) dns: DnsConfig,
    #[serde(default)]
    pub(crate) smtp: SmtpConfig,
    #[serde(default)]
    pub(crate) pool: PoolConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct DnsConfig {
    pub(crate) dns_timeout: Option<u64>,
    pub(crate) dns_servers: Option<Vec<String>>,
    pub(crate) cache_ttl: Option<u64>,
    pub(crate) negative_cache_ttl: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct SmtpConfig {
    pub(crate) enabled: Option<bool>,
    pub(crate) smtp_timeout: Option<u64>,
    pub(crate) smtp_sender_email: Option<String>,
    pub(crate) hello_name: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) max_mx_hosts: Option<usize>,
    pub(crate) check_catch_all: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct PoolConfig {
    pub(crate) default_concurrency: Option<usize>,
    pub(crate) max_concurrency: Option<usize>,
    pub(crate) batch_timeout: Option<u64>,
}
