use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

mod downloader;
mod registry;
mod utils;

use downloader::Options;

#[derive(Parser)]
#[clap(about = "Download URLs in parallel, publishing each file only once it is complete")]
struct Args {
    #[clap(short, help = "Do not print a GET line per download")]
    quiet: bool,
    #[clap(
        short = 'p',
        default_value_t = 1,
        allow_negative_numbers = true,
        help = "Number of parallel downloads"
    )]
    parallel: i64,
    #[clap(
        short = 'C',
        long,
        default_value = ".",
        help = "Directory to download into"
    )]
    directory: PathBuf,
    #[clap(long, help = "Enable debug mode")]
    debug: bool,
    #[clap(required = true, help = "URLs to download, http:// is assumed without a scheme")]
    urls: Vec<String>,
}

impl Args {
    fn options(&self) -> Result<Options> {
        if self.parallel < 1 {
            bail!("can't do less than 1 parallel downloads");
        }
        Ok(Options {
            quiet: self.quiet,
            parallel: usize::try_from(self.parallel)?,
            directory: self.directory.clone(),
        })
    }
}

/// Registers the Ctrl-C handler right away so that an interrupt arriving
/// during allocation still goes through teardown.
#[cfg(unix)]
fn cancel_on_interrupt(shutdown: CancellationToken) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt =
        signal(SignalKind::interrupt()).context("Failed to install Ctrl-C handler")?;
    tokio::spawn(async move {
        if interrupt.recv().await.is_some() {
            log::warn!("Ctrl-C received, stopping");
            shutdown.cancel();
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn cancel_on_interrupt(shutdown: CancellationToken) -> Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received, stopping");
            shutdown.cancel();
        }
    });
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::builder().filter_level(log_level).init();

    let options = match args.options() {
        Ok(options) => options,
        Err(err) => {
            log::error!("{}", err);
            process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    if let Err(err) = cancel_on_interrupt(shutdown.clone()) {
        log::warn!("{:#}", err);
    }

    match downloader::download_all(&args.urls, &options, &shutdown).await {
        Ok(summary) => {
            let dispatched = summary.dispatched;
            let published = summary.published;
            log::info!(
                "{} of {} download(s) succeeded ({} bytes), {} failed",
                dispatched.succeeded,
                dispatched.launched,
                dispatched.bytes,
                dispatched.failed
            );
            log::debug!(
                "Published {}, missing {}, discarded {}, rename failures {}",
                published.published,
                published.missing,
                published.discarded,
                published.failed
            );
        }
        Err(err) => {
            log::error!("Error: {:#}", err);
            process::exit(1);
        }
    }

    Ok(())
}
