#![allow(dead_code)]

use async_trait::async_trait;
use mailprobe_core::{Config, DnsLookup, EmailVerifier, MxRecord, ResolutionError};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// In-memory record source with a call counter. Unknown domains are NXDOMAIN.
#[derive(Default)]
pub struct MockLookup {
    mx: HashMap<String, Vec<MxRecord>>,
    ip: HashMap<String, Vec<IpAddr>>,
    mx_calls: AtomicUsize,
    delay: Duration,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mx(mut self, domain: &str, host: &str) -> Self {
        self.mx
            .entry(domain.to_string())
            .or_default()
            .push(MxRecord::new(10, host));
        self
    }

    pub fn with_address_only(mut self, domain: &str, ip: IpAddr) -> Self {
        self.mx.insert(domain.to_string(), Vec::new());
        self.ip.insert(domain.to_string(), vec![ip]);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn mx_calls(&self) -> usize {
        self.mx_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsLookup for MockLookup {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolutionError> {
        self.mx_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.mx
            .get(domain)
            .cloned()
            .ok_or(ResolutionError::NxDomain)
    }

    async fn lookup_ip(&self, domain: &str) -> Result<Vec<IpAddr>, ResolutionError> {
        Ok(self.ip.get(domain).cloned().unwrap_or_default())
    }
}

pub fn verifier(lookup: Arc<MockLookup>, config: Config) -> EmailVerifier {
    EmailVerifier::with_lookup(config, lookup)
}

/// RCPT reply that makes the mock server go silent.
pub const STALL: &str = "";

/// Loopback SMTP server; `rcpt` decides the reply to each `RCPT TO` line.
pub async fn mock_smtp(rcpt: fn(&str) -> &'static str) -> u16 {
    serve_smtp(rcpt, false).await
}

/// Like [`mock_smtp`], but never answers `QUIT`.
pub async fn mock_smtp_stalling_quit(rcpt: fn(&str) -> &'static str) -> u16 {
    serve_smtp(rcpt, true).await
}

async fn serve_smtp(rcpt: fn(&str) -> &'static str, stall_on_quit: bool) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (read, mut write) = stream.into_split();
                let mut lines = BufReader::new(read).lines();
                write.write_all(b"220 mock.test ESMTP\r\n").await.ok();
                while let Ok(Some(line)) = lines.next_line().await {
                    let upper = line.to_uppercase();
                    let reply = if upper.starts_with("RCPT TO") {
                        rcpt(&line)
                    } else if upper.starts_with("QUIT") {
                        if stall_on_quit {
                            STALL
                        } else {
                            write.write_all(b"221 Bye\r\n").await.ok();
                            break;
                        }
                    } else if upper.starts_with("EHLO") {
                        "250 mock.test\r\n"
                    } else {
                        "250 Ok\r\n"
                    };
                    if reply == STALL {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        break;
                    }
                    if write.write_all(reply.as_bytes()).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    port
}

/// Accepts connections and never says a word.
pub async fn silent_smtp() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    port
}
