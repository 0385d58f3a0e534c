use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_FILENAME: &str = "index.html";

pub fn normalize_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    }
}

/// Name under which a download of `url` gets published.
///
/// Drops the scheme and the host, then keeps the last `/`-delimited segment
/// of the remaining path. An empty segment maps to `index.html`.
pub fn destination_name(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = rest.split_once('/').map_or("", |(_, path)| path);
    let name = path.rsplit('/').next().unwrap_or_default();

    if name.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        name.to_string()
    }
}

pub fn build_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_missing_scheme() {
        assert_eq!(normalize_url("example.com/a.txt"), "http://example.com/a.txt");
        assert_eq!(normalize_url("bad://nonexistent"), "http://bad://nonexistent");
    }

    #[test]
    fn normalize_keeps_http_and_https() {
        assert_eq!(normalize_url("http://example.com/"), "http://example.com/");
        assert_eq!(normalize_url("https://example.com/x"), "https://example.com/x");
    }

    #[test]
    fn destination_takes_last_segment() {
        assert_eq!(destination_name("http://example.com/a/b.txt"), "b.txt");
        assert_eq!(destination_name("https://example.com/a.txt"), "a.txt");
        assert_eq!(destination_name("http://example.com/a/b/c.tar.gz"), "c.tar.gz");
    }

    #[test]
    fn destination_falls_back_to_index() {
        assert_eq!(destination_name("http://example.com/"), "index.html");
        assert_eq!(destination_name("http://example.com"), "index.html");
        assert_eq!(destination_name("http://example.com/dir/"), "index.html");
    }

    #[test]
    fn destination_of_doubled_scheme() {
        assert_eq!(destination_name("http://bad://nonexistent"), "nonexistent");
    }

    #[test]
    fn client_builds() {
        assert!(build_client().is_ok());
    }
}
