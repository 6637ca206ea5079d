//! Blocking JSON-over-HTTP client shared by the package and loader hosts
//!
//! Every request is a plain GET against `{base_url}/{endpoint}`. Failures are
//! split into [`Error::Transport`] (connection, timeout, non-success status)
//! and [`Error::Decode`] (body is not the expected JSON) so callers can apply
//! their own fallback policy.

use crate::{Error, Result};
use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha512};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("oneclick/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used for every host
pub fn http_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))
}

/// Build a `?k=v&k=v` query string. Values are URL-encoded; an empty list
/// produces an empty string.
pub fn build_query(query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return String::new();
    }

    let params: Vec<String> = query
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect();
    format!("?{}", params.join("&"))
}

/// How often a single URL is retried before a download is declared failed
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// One attempt, no waiting
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Delay after the given failed attempt (1-based): backoff, 2x, 4x, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1 << shift)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Compose `{base_url}/{endpoint}` with exactly one separator
    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// GET an endpoint and decode the JSON body
    pub fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url_for(endpoint);
        let body = self.fetch_text(&url)?;
        serde_json::from_str(&body).map_err(|e| Error::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// GET an endpoint with query parameters appended
    pub fn get_with_query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        self.get(&format!("{}{}", endpoint, build_query(query)))
    }

    /// GET an endpoint and return the body verbatim
    pub fn get_raw(&self, endpoint: &str) -> Result<String> {
        let url = self.url_for(endpoint);
        self.fetch_text(&url)
    }

    /// Stream an absolute URL into `dest`, replacing any existing file.
    /// Returns the number of bytes written.
    pub fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        self.download_checked(url, dest, None)
    }

    /// Download with the given retry policy, optionally verifying the
    /// sha512 of the written bytes. Disk failures are not retried. When the
    /// last attempt fetched the file but its hash was wrong, the
    /// `HashMismatch` is returned as is.
    pub fn download_with_retry(
        &self,
        url: &str,
        dest: &Path,
        policy: &RetryPolicy,
        expected_sha512: Option<&str>,
    ) -> Result<u64> {
        let attempts = policy.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.download_checked(url, dest, expected_sha512) {
                Ok(written) => return Ok(written),
                Err(e @ Error::Io(_)) => return Err(e),
                Err(e) => {
                    warn!(
                        "Download attempt {}/{} for {} failed: {}",
                        attempt, attempts, url, e
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        std::thread::sleep(policy.delay_after(attempt));
                    }
                }
            }
        }

        match last_error {
            Some(e @ Error::HashMismatch { .. }) => Err(e),
            other => Err(Error::Download {
                url: url.to_string(),
                attempts,
                message: other.map(|e| e.to_string()).unwrap_or_default(),
            }),
        }
    }

    fn download_checked(
        &self,
        url: &str,
        dest: &Path,
        expected_sha512: Option<&str>,
    ) -> Result<u64> {
        let mut response = self.send(url)?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(dest)?;
        let mut writer = HashingWriter::new(file);
        let written = response.copy_to(&mut writer).map_err(|e| Error::Transport {
            url: url.to_string(),
            message: describe(&e),
        })?;
        let actual = writer.finish()?;

        if let Some(expected) = expected_sha512 {
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(Error::HashMismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        debug!("Downloaded {} -> {} ({} bytes)", url, dest.display(), written);
        Ok(written)
    }

    fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.send(url)?;
        response.text().map_err(|e| Error::Transport {
            url: url.to_string(),
            message: describe(&e),
        })
    }

    fn send(&self, url: &str) -> Result<Response> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().map_err(|e| Error::Transport {
            url: url.to_string(),
            message: describe(&e),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        Ok(response)
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_connect() {
        format!("cannot connect: {}", e)
    } else if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    }
}

/// Writes through to the inner writer while computing a sha512
struct HashingWriter<W> {
    inner: W,
    hasher: Sha512,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha512::new(),
        }
    }

    fn finish(mut self) -> io::Result<String> {
        self.inner.flush()?;
        Ok(hex::encode(self.hasher.finalize()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
