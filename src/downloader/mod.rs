use std::path::PathBuf;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;

use crate::registry::Registry;
use crate::utils::build_client;

mod dispatch;
mod fetch;
mod publish;

use dispatch::{dispatch, DispatchSummary};
use fetch::fetch;
use publish::{publish, PublishReport, WorkDir};

#[derive(Debug, Clone)]
pub struct Options {
    pub quiet: bool,
    pub parallel: usize,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub dispatched: DispatchSummary,
    pub published: PublishReport,
}

/// Publishing and teardown run after dispatch on every path, including a
/// cancelled `shutdown`. Failed downloads alone are not an error.
pub async fn download_all(
    raw_urls: &[String],
    options: &Options,
    shutdown: &CancellationToken,
) -> Result<RunSummary> {
    let client = build_client()?;
    let work_dir = WorkDir::create_in(&options.directory)?;

    let mut registry = Registry::new();
    let mut urls = Vec::with_capacity(raw_urls.len());
    for raw_url in raw_urls {
        if shutdown.is_cancelled() {
            break;
        }
        match registry.allocate(raw_url, work_dir.path()) {
            Ok(url) => urls.push(url),
            Err(err) => log::error!("{:#}", err),
        }
    }
    log::debug!("{} distinct URL(s) allocated", registry.len());

    let quiet = options.quiet;
    let dispatched = dispatch(
        &urls,
        &mut registry,
        options.parallel,
        |url, temp_path| fetch(client.clone(), url, temp_path, quiet),
        shutdown,
    )
    .await;

    let published = publish(registry, &options.directory);
    work_dir.remove()?;

    if dispatched.interrupted {
        bail!("Interrupted before all downloads finished");
    }

    Ok(RunSummary {
        dispatched,
        published,
    })
}
