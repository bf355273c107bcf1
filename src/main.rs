mod cli;
mod service;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use indicatif::{ProgressBar, ProgressStyle};
use mailprobe_core::{
    load_config_file, BatchRequest, BatchSummary, CancelToken, Config, ConfigBuilder,
    EmailVerifier,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const VERBOSE_FILTER: &str =
    "info,mailprobe=debug,mailprobe_core=debug,address=debug,dns=debug,smtp_probe=debug,pipeline=debug,worker_pool=debug,export=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;
    let smtp_enabled = config.enable_smtp;
    let from = config.smtp_sender_email.clone();
    let verifier = EmailVerifier::new(config).context("failed to initialize verifier")?;

    match cli.command {
        Command::Check { email } => {
            let result = verifier.validate_one(&email, &from, smtp_enabled).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Batch {
            input,
            out,
            workers,
            quiet,
        } => {
            let addresses = service::input::load_addresses(&input)
                .with_context(|| format!("failed to load addresses from {}", input.display()))?;

            let cancel = CancelToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received; finishing in-flight addresses");
                    ctrl_c.cancel();
                }
            });

            let progress = if quiet {
                ProgressBar::hidden()
            } else {
                progress_bar(addresses.len() as u64)?
            };
            let request = BatchRequest {
                from,
                smtp_enabled,
                concurrency: workers,
            };
            let results = verifier
                .validate_batch_with(&addresses, &request, &cancel, |_, _| progress.inc(1))
                .await;
            progress.finish_and_clear();

            let paths = verifier
                .export_results(&results, &out)
                .context("failed to write results")?;
            println!("{}", BatchSummary::from_results(&results));
            println!("records: {}", paths.records.display());
            println!("table:   {}", paths.table.display());
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut builder = ConfigBuilder::new();
    if let Some((file, path)) = load_config_file(cli.config.as_deref())? {
        builder = builder.with_file(&file, Some(path));
    }
    if cli.no_smtp {
        builder = builder.enable_smtp(false);
    }
    if let Some(from) = &cli.from {
        builder = builder.smtp_sender_email(from.clone());
    }
    if let Some(secs) = cli.dns_timeout {
        builder = builder.dns_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = cli.smtp_timeout {
        builder = builder.smtp_timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

fn progress_bar(len: u64) -> anyhow::Result<ProgressBar> {
    let style = ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} ({eta})",
    )?;
    Ok(ProgressBar::new(len).with_style(style))
}
