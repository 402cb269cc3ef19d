//! Media source backed by a paginated JSON manifest served over HTTP(S).
//!
//! Listing pages are fetched with `GET <manifest>?after=<seq>&limit=<n>`; item
//! bodies are fetched from the per-entry URL, optionally with a `Range` header.
//! libcurl runs on blocking threads and forwards body bytes over a channel.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::cell::Cell;
use std::path::PathBuf;
use std::str;
use std::time::Duration;
use url::Url;

use crate::media::{ByteRange, TransferItem};

use super::manifest::{ManifestEntry, ManifestPage};
use super::{ByteStream, ItemStream, MediaSource, SourceError};

/// Wait assumed when a 429/503 carries no usable `Retry-After`.
pub const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 30;

const DEFAULT_PAGE_SIZE: usize = 100;
const STREAM_BUFFER: usize = 16;
const LISTING_RATE_LIMIT_WAITS: u32 = 3;
const LISTING_GRACE_SECS: u64 = 5;

pub struct HttpManifestSource {
    manifest_url: Url,
    dest_root: PathBuf,
    page_size: usize,
}

impl HttpManifestSource {
    /// Source listing `manifest_url`, placing artifacts under `dest_root`.
    pub fn new(manifest_url: &str, dest_root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let manifest_url = Url::parse(manifest_url)
            .map_err(|e| SourceError::Unavailable(format!("invalid manifest URL: {}", e)))?;
        Ok(Self {
            manifest_url,
            dest_root: dest_root.into(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn page_url(&self, after: u64) -> Url {
        let mut u = self.manifest_url.clone();
        u.query_pairs_mut()
            .append_pair("after", &after.to_string())
            .append_pair("limit", &self.page_size.to_string());
        u
    }

    async fn fetch_page(&self, after: u64) -> Result<ManifestPage, SourceError> {
        let page_url = self.page_url(after).to_string();
        let mut waits = 0u32;
        loop {
            let u = page_url.clone();
            let res = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, SourceError> {
                let mut body = Vec::new();
                let resp = perform_get(&u, None, |data| {
                    body.extend_from_slice(data);
                    true
                })?;
                check_status(&resp)?;
                Ok(body)
            })
            .await
            .map_err(|e| SourceError::Unavailable(format!("listing task: {}", e)))?;

            match res {
                Ok(body) => return ManifestPage::parse(&body),
                Err(SourceError::RateLimited { wait_secs }) if waits < LISTING_RATE_LIMIT_WAITS => {
                    let wait = wait_secs + LISTING_GRACE_SECS;
                    tracing::warn!(after, wait_secs = wait, "listing rate limited, waiting");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    waits += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One step of the listing walk: the entries after `cursor` and the next cursor.
    async fn next_page(
        &self,
        cursor: Option<u64>,
    ) -> Result<Option<(Vec<ManifestEntry>, Option<u64>)>, SourceError> {
        let Some(after) = cursor else {
            return Ok(None);
        };
        let page = self.fetch_page(after).await?;
        tracing::debug!(after, entries = page.items.len(), "fetched listing page");
        let next = page
            .next_after
            .filter(|n| *n > after && !page.items.is_empty());
        Ok(Some((page.items, next)))
    }
}

#[async_trait]
impl MediaSource for HttpManifestSource {
    fn list_items(&self, after: u64) -> ItemStream<'_> {
        let pages = stream::try_unfold(Some(after), move |cursor| self.next_page(cursor));

        pages
            .map_ok(|entries| stream::iter(entries.into_iter().map(Ok::<_, SourceError>)))
            .try_flatten()
            .try_filter_map(move |entry| async move {
                if entry.sequence_id <= after {
                    return Ok(None);
                }
                Ok(entry.to_item(&self.dest_root))
            })
            .boxed()
    }

    async fn open_stream(
        &self,
        item: &TransferItem,
        range: Option<ByteRange>,
    ) -> Result<ByteStream, SourceError> {
        if range.map_or(false, |r| r.is_empty()) {
            return Ok(stream::empty().boxed());
        }
        if item.locator.is_empty() {
            return Err(SourceError::Unavailable(format!("item {} has no body URL", item.id)));
        }
        let url = item.locator.clone();
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, SourceError>>(STREAM_BUFFER);

        tokio::task::spawn_blocking(move || {
            let data_tx = tx.clone();
            let result = perform_get(&url, range, |data| {
                data_tx.blocking_send(Ok(Bytes::copy_from_slice(data))).is_ok()
            })
            .and_then(|resp| check_status(&resp));
            if let Err(e) = result {
                let _ = tx.blocking_send(Err(e));
            }
        });

        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        })
        .boxed())
    }
}

/// Status line and rate-limit hint of the final response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Response {
    status: u32,
    ranged: bool,
    retry_after: Option<u64>,
}

fn body_accepted(status: u32, ranged: bool) -> bool {
    if ranged {
        status == 206
    } else {
        (200..300).contains(&status)
    }
}

/// Blocking GET. Body bytes of an accepted final response go to `on_data`;
/// returning false from `on_data` aborts the transfer.
fn perform_get<F>(url: &str, range: Option<ByteRange>, mut on_data: F) -> Result<Response, SourceError>
where
    F: FnMut(&[u8]) -> bool,
{
    let status = Cell::new(0u32);
    let retry_after: Cell<Option<u64>> = Cell::new(None);
    let ranged = range.is_some();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    // Abort if throughput drops below 1 KiB/s for 60s rather than using a wall-clock cap.
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    if let Some(r) = range {
        easy.range(&curl_range(r))?;
    }

    let perform_result = {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            if let Ok(s) = str::from_utf8(line) {
                parse_header_line(s.trim_end(), &status, &retry_after);
            }
            true
        })?;
        transfer.write_function(|data| {
            let code = status.get();
            if (300..400).contains(&code) {
                return Ok(data.len());
            }
            if !body_accepted(code, ranged) {
                return Ok(0);
            }
            if on_data(data) {
                Ok(data.len())
            } else {
                Ok(0)
            }
        })?;
        transfer.perform()
    };

    let resp = Response {
        status: status.get(),
        ranged,
        retry_after: retry_after.get(),
    };
    match perform_result {
        Ok(()) => Ok(resp),
        Err(e) if e.is_write_error() && !body_accepted(resp.status, ranged) => Ok(resp),
        Err(e) if e.is_write_error() => Err(SourceError::Network("transfer aborted by consumer".into())),
        Err(e) => Err(e.into()),
    }
}

/// curl takes the inclusive `start-end` form, without the `bytes=` prefix.
fn curl_range(r: ByteRange) -> String {
    format!("{}-{}", r.start, r.end.saturating_sub(1))
}

fn parse_header_line(line: &str, status: &Cell<u32>, retry_after: &Cell<Option<u64>>) {
    if line.starts_with("HTTP/") {
        if let Some(code) = line.split_whitespace().nth(1).and_then(|c| c.parse().ok()) {
            status.set(code);
            retry_after.set(None);
        }
        return;
    }
    if let Some((name, value)) = line.split_once(':') {
        if name.trim().eq_ignore_ascii_case("retry-after") {
            retry_after.set(value.trim().parse().ok());
        }
    }
}

fn check_status(resp: &Response) -> Result<(), SourceError> {
    match resp.status {
        429 | 503 => Err(SourceError::RateLimited {
            wait_secs: resp.retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS),
        }),
        200 if resp.ranged => Err(SourceError::RangeIgnored),
        code if body_accepted(code, resp.ranged) => Ok(()),
        code => Err(SourceError::Http(code)),
    }
}
