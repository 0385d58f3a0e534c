use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use reqwest::Client;
use tempfile::TempPath;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};

pub const CHUNK_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("GET {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Streams the body of `url` into the pre-allocated `temp_path`, removing
/// the file on any failure. The response status is not inspected.
///
/// `temp_path` is owned by a `TempPath` before the returned future is first
/// polled, so aborting a spawned fetch at any point also removes the file.
pub fn fetch(
    client: Client,
    url: String,
    temp_path: PathBuf,
    quiet: bool,
) -> impl Future<Output = Result<u64, FetchError>> + Send + 'static {
    let temp_path = TempPath::from_path(temp_path);

    async move {
        let fetched = match stream_to_file(&client, &url, &temp_path, quiet).await {
            Ok(written) => temp_path
                .keep()
                .map(|_| written)
                .map_err(|err| FetchError::Write {
                    path: err.path.to_path_buf(),
                    source: err.error,
                }),
            Err(err) => Err(err),
        };

        match &fetched {
            Ok(written) => log::debug!("Fetched {} bytes from {}", written, url),
            Err(err) => log::error!("{}", err),
        }
        fetched
    }
}

async fn stream_to_file(
    client: &Client,
    url: &str,
    temp_path: &Path,
    quiet: bool,
) -> Result<u64, FetchError> {
    if !quiet {
        println!("GET {}", url);
    }

    let file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(temp_path)
        .await
        .map_err(|source| FetchError::Open {
            path: temp_path.to_path_buf(),
            source,
        })?;
    println!("created {}", temp_path.display());

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
    log::debug!("{} answered {}", url, response.status());

    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut written = 0u64;
    let copied = loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break Ok(()),
            Err(source) => {
                break Err(FetchError::Body {
                    url: url.to_string(),
                    source,
                })
            }
        };
        if let Err(source) = writer.write_all(&chunk).await {
            break Err(FetchError::Write {
                path: temp_path.to_path_buf(),
                source,
            });
        }
        written += chunk.len() as u64;
    };

    let flushed = writer.flush().await.map_err(|source| FetchError::Write {
        path: temp_path.to_path_buf(),
        source,
    });

    copied?;
    flushed?;
    Ok(written)
}
