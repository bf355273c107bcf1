//! Transient SMTP sessions that ask a mail host whether it would accept a recipient.
//!
//! The dialogue stops after `RCPT TO`; `DATA` is never sent. Connecting and the
//! envelope up to the recipient verdict are bounded by the per-connection
//! timeout. The catch-all decoy and `QUIT` come after the verdict and get their
//! own shorter bound, so a server that stalls there cannot undo an answer.

pub mod result;

pub use result::{ReplyStage, SmtpOutcome};

use crate::core::config::Config;
use crate::core::error::ProbeError;
use lettre::transport::smtp::client::AsyncSmtpConnection;
use lettre::transport::smtp::commands::{Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::response::Response;
use lettre::Address;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Upper bound for post-verdict steps, whatever the connection timeout.
const FOLLOW_UP_LIMIT: Duration = Duration::from_secs(5);

/// Probes mail hosts in priority order.
#[derive(Debug, Clone)]
pub struct SmtpProbe {
    timeout: Duration,
    port: u16,
    hello_name: ClientId,
    max_hosts: usize,
    check_catch_all: bool,
}

impl SmtpProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.smtp_timeout,
            port: config.smtp_port,
            hello_name: ClientId::Domain(config.hello_name()),
            max_hosts: config.max_mx_hosts.max(1),
            check_catch_all: config.check_catch_all,
        }
    }

    /// Runs `MAIL FROM`/`RCPT TO` against each host until one answers.
    ///
    /// Hosts that refuse the connection, time out, or break the protocol are
    /// skipped; the last such error is returned when none answers. Once a host
    /// has answered `RCPT TO` its verdict stands, whatever the rest of the
    /// session does.
    pub async fn probe(
        &self,
        mx_hosts: &[String],
        from: &str,
        to: &str,
    ) -> Result<SmtpOutcome, ProbeError> {
        let sender = Address::from_str(from)
            .map_err(|e| ProbeError::Protocol(format!("sender '{}' rejected locally: {}", from, e)))?;
        let recipient = Address::from_str(to)
            .map_err(|e| ProbeError::Protocol(format!("recipient '{}' rejected locally: {}", to, e)))?;

        let mut last_error = None;
        for host in mx_hosts.iter().take(self.max_hosts) {
            let label = format!("[SMTP {} via {}]", to, host);
            let started = Instant::now();
            tracing::debug!(target: "smtp_probe", "{} Connecting on port {}", label, self.port);

            let attempt = tokio::time::timeout(
                self.timeout,
                self.ask_host(host, &sender, &recipient, &label),
            )
            .await;

            match attempt {
                Ok(Ok((mut conn, mut outcome))) => {
                    let usable = if outcome.exists == Some(true) && self.check_catch_all {
                        self.check_decoy(&mut conn, &recipient, &mut outcome, &label)
                            .await
                    } else {
                        true
                    };
                    if usable {
                        self.close(conn, &label).await;
                    }
                    tracing::info!(target: "smtp_probe", "{} Reply {} after {:.2?} (exists={:?}, catch_all={})",
                        label, outcome.code, started.elapsed(), outcome.exists, outcome.is_catch_all);
                    return Ok(outcome);
                }
                Ok(Err(e)) => {
                    tracing::warn!(target: "smtp_probe", "{} Failed after {:.2?}: {}", label, started.elapsed(), e);
                    last_error = Some(e);
                }
                Err(_) => {
                    tracing::warn!(target: "smtp_probe", "{} Timed out after {:.2?}", label, self.timeout);
                    last_error = Some(ProbeError::Timeout(host.clone()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProbeError::ConnectFailed("no mail hosts".to_string())))
    }

    /// Bound for the steps that follow a verdict: the decoy `RCPT` and `QUIT`.
    fn follow_up_timeout(&self) -> Duration {
        self.timeout.min(FOLLOW_UP_LIMIT)
    }

    /// Connects and runs the envelope up to the recipient verdict.
    ///
    /// Any error after the connection is up aborts the session before returning.
    async fn ask_host(
        &self,
        host: &str,
        sender: &Address,
        recipient: &Address,
        label: &str,
    ) -> Result<(AsyncSmtpConnection, SmtpOutcome), ProbeError> {
        let mut conn = AsyncSmtpConnection::connect_tokio1(
            (host, self.port),
            Some(self.timeout),
            &self.hello_name,
            None,
            None,
        )
        .await
        .map_err(|e| connect_error(host, e))?;
        tracing::trace!(target: "smtp_probe", "{} Greeting and EHLO accepted", label);

        match run_envelope(&mut conn, host, sender, recipient).await {
            Ok(outcome) => Ok((conn, outcome)),
            Err(e) => {
                let _ = tokio::time::timeout(self.follow_up_timeout(), conn.abort()).await;
                Err(e)
            }
        }
    }

    /// Sends a second `RCPT` for a random mailbox on the same domain.
    ///
    /// Anything but acceptance means "not catch-all". Returns `false` when the
    /// decoy stalled: the session is then mid-command and must be dropped.
    async fn check_decoy(
        &self,
        conn: &mut AsyncSmtpConnection,
        recipient: &Address,
        outcome: &mut SmtpOutcome,
        label: &str,
    ) -> bool {
        let Some(decoy) = decoy_recipient(recipient.domain()) else {
            tracing::trace!(target: "smtp_probe", "{} Could not build decoy recipient", label);
            return true;
        };
        match tokio::time::timeout(self.follow_up_timeout(), conn.command(Rcpt::new(decoy, vec![]))).await {
            Ok(Ok(_)) => {
                tracing::debug!(target: "smtp_probe", "{} Random recipient accepted; domain is catch-all", label);
                outcome.mark_catch_all();
                true
            }
            Ok(Err(e)) => {
                tracing::trace!(target: "smtp_probe", "{} Random recipient refused: {}", label, e);
                true
            }
            Err(_) => {
                tracing::debug!(target: "smtp_probe", "{} Random recipient stalled; keeping verdict", label);
                false
            }
        }
    }

    /// Ends the session with `QUIT`, aborting if the server refuses it.
    ///
    /// A stalled `QUIT` is given up on; dropping the connection closes the socket.
    async fn close(&self, mut conn: AsyncSmtpConnection, label: &str) {
        match tokio::time::timeout(self.follow_up_timeout(), conn.quit()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::trace!(target: "smtp_probe", "{} QUIT failed ({}); aborting connection", label, e);
                let _ = tokio::time::timeout(self.follow_up_timeout(), conn.abort()).await;
            }
            Err(_) => {
                tracing::debug!(target: "smtp_probe", "{} QUIT stalled; dropping connection", label);
            }
        }
    }
}

async fn run_envelope(
    conn: &mut AsyncSmtpConnection,
    host: &str,
    sender: &Address,
    recipient: &Address,
) -> Result<SmtpOutcome, ProbeError> {
    if let Err(e) = conn.command(Mail::new(Some(sender.clone()), vec![])).await {
        return match e.status() {
            Some(code) => Ok(SmtpOutcome::sender_rejected(host, code_value(code), e.to_string())),
            None => Err(session_error(host, "MAIL FROM", e)),
        };
    }

    let (code, message) = match conn.command(Rcpt::new(recipient.clone(), vec![])).await {
        Ok(response) => (code_value(response.code()), response_text(&response)),
        Err(e) => match e.status() {
            Some(code) => (code_value(code), e.to_string()),
            None => return Err(session_error(host, "RCPT TO", e)),
        },
    };
    Ok(SmtpOutcome::from_rcpt(host, code, message))
}

fn code_value(code: lettre::transport::smtp::response::Code) -> u16 {
    code.to_string().parse().unwrap_or(0)
}

fn response_text(response: &Response) -> String {
    response.message().collect::<Vec<_>>().join(" ")
}

/// A recipient on the same domain that almost certainly does not exist.
fn decoy_recipient(domain: &str) -> Option<Address> {
    let user: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    Address::new(format!("nx-{}", user), domain).ok()
}

fn connect_error(host: &str, e: lettre::transport::smtp::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout(host.to_string())
    } else if let Some(code) = e.status() {
        ProbeError::Protocol(format!("{} refused session with {}", host, code_value(code)))
    } else {
        ProbeError::ConnectFailed(format!("{}: {}", host, e))
    }
}

fn session_error(host: &str, command: &str, e: lettre::transport::smtp::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout(host.to_string())
    } else {
        ProbeError::Protocol(format!("{} during {}: {}", host, command, e))
    }
}
