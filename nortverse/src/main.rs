#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use nortverse_core::{Client, Crawl, Request};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Download, Subcommands};

mod args;

async fn download(args: Download, cancel: CancellationToken) -> Result<()> {
    ensure!(
        args.sleep_min <= args.sleep_max,
        "--sleep-min ({}) can't be greater than --sleep-max ({})",
        args.sleep_min,
        args.sleep_max
    );

    if let Some(endpoint) = &args.flaresolverr {
        info!("Requests go through flaresolverr at {endpoint}");
    }
    let client = Client::new(Duration::from_secs(args.timeout))
        .context("couldn't build the http client")?
        .set_flaresolverr(args.flaresolverr);

    Crawl::new(&client)
        .set_start_url(&args.start_url)
        .set_single(args.single)
        .set_sleep(
            Duration::from_secs(args.sleep_min),
            Duration::from_secs(args.sleep_max),
        )
        .set_output_dir(args.output)
        .set_overwrite(args.overwrite)
        .set_cancellation_token(cancel)
        .request()
        .await
        .with_context(|| format!("archiving from {} failed", args.start_url))?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping");
                cancel.cancel();
            }
        }
    });

    match args.command {
        Subcommands::Download(args) => download(args, cancel).await,
    }
}
