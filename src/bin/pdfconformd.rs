//! Server binary for pdfconform.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ServiceConfig` and runs the HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use pdfconform::{ServiceConfig, ServiceContext};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pdfconformd", version, about = "PDF/A conformance validation over HTTP")]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8080", env = "PDFCONFORM_BIND")]
    bind: SocketAddr,

    /// Base URL for rule-documentation links in HTML reports.
    #[arg(long, env = "PDFCONFORM_WIKI_BASE_URL")]
    wiki_base_url: Option<String>,

    /// Timeout for fetching `url` inputs, in seconds.
    #[arg(long, default_value_t = 120, env = "PDFCONFORM_DOWNLOAD_TIMEOUT")]
    download_timeout: u64,

    /// Stop recording failed rule checks past this count.
    #[arg(long, default_value_t = 100)]
    max_failed_checks: u32,

    /// Include passed rules in rendered HTML reports.
    #[arg(long)]
    verbose_reports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut builder = ServiceConfig::builder()
        .download_timeout_secs(cli.download_timeout)
        .max_failed_checks(cli.max_failed_checks)
        .verbose_reports(cli.verbose_reports);
    if let Some(url) = cli.wiki_base_url {
        builder = builder.wiki_base_url(url);
    }
    let config = builder.build().context("invalid configuration")?;

    let ctx = Arc::new(ServiceContext::new(config));
    pdfconform::serve(cli.bind, ctx)
        .await
        .context("HTTP server failed")?;
    Ok(())
}
