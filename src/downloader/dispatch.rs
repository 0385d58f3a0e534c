use std::future::Future;
use std::path::PathBuf;

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use super::fetch::FetchError;
use crate::registry::Registry;

type FetchResult = Result<u64, FetchError>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub launched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub bytes: u64,
    pub interrupted: bool,
}

impl DispatchSummary {
    fn record(&mut self, joined: Result<FetchResult, JoinError>) {
        match joined {
            Ok(Ok(bytes)) => {
                self.succeeded += 1;
                self.bytes += bytes;
            }
            Ok(Err(_)) => self.failed += 1,
            Err(err) if err.is_cancelled() => self.failed += 1,
            Err(err) => {
                log::error!("Download task failed: {}", err);
                self.failed += 1;
            }
        }
    }
}

/// Launches one fetch per URL occurrence in input order, at most `limit` at
/// a time, and waits for all of them. Once `shutdown` is cancelled nothing
/// new is launched and in-flight fetches are aborted.
pub async fn dispatch<L, Fut>(
    urls: &[String],
    registry: &mut Registry,
    limit: usize,
    mut launch: L,
    shutdown: &CancellationToken,
) -> DispatchSummary
where
    L: FnMut(String, PathBuf) -> Fut,
    Fut: Future<Output = FetchResult> + Send + 'static,
{
    let limit = limit.max(1);
    let mut in_flight = JoinSet::new();
    let mut summary = DispatchSummary::default();

    for url in urls {
        if shutdown.is_cancelled() {
            return interrupt(in_flight, summary).await;
        }
        if in_flight.len() >= limit {
            tokio::select! {
                Some(joined) = in_flight.join_next() => summary.record(joined),
                () = shutdown.cancelled() => return interrupt(in_flight, summary).await,
            }
        }

        let Some(temp_path) = registry.next_temp_file(url) else {
            continue;
        };
        log::debug!("Dispatching {} into {}", url, temp_path.display());
        in_flight.spawn(launch(url.clone(), temp_path));
        summary.launched += 1;
    }

    while !in_flight.is_empty() {
        tokio::select! {
            Some(joined) = in_flight.join_next() => summary.record(joined),
            () = shutdown.cancelled() => return interrupt(in_flight, summary).await,
        }
    }

    summary
}

async fn interrupt(
    mut in_flight: JoinSet<FetchResult>,
    mut summary: DispatchSummary,
) -> DispatchSummary {
    log::warn!("Interrupted, aborting {} download(s)", in_flight.len());
    in_flight.abort_all();
    while let Some(joined) = in_flight.join_next().await {
        summary.record(joined);
    }
    summary.interrupted = true;
    summary
}
