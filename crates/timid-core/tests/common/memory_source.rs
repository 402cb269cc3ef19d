//! In-memory media source with fault injection and fetch accounting.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use timid_core::media::{ByteRange, MediaClass, TransferItem};
use timid_core::source::naming::destination_for;
use timid_core::source::{ByteStream, ItemStream, MediaSource, SourceError};

/// Injected failure for one item.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Every open fails with a network error.
    Network,
    /// Every open is answered with a rate-limit signal.
    RateLimited { wait_secs: u64 },
    /// Ranged opens starting at this offset fail with HTTP 404.
    RangeAt(u64),
    /// Every open waits this long before the body is served.
    Stall(Duration),
}

pub struct MemorySource {
    root: PathBuf,
    items: Vec<TransferItem>,
    bodies: HashMap<String, Vec<u8>>,
    ranges: bool,
    faults: Mutex<HashMap<String, Fault>>,
    listing_fails_after: Mutex<Option<u64>>,
    opens: AtomicUsize,
    opens_by_id: Mutex<HashMap<String, usize>>,
    open_times: Mutex<Vec<(String, tokio::time::Instant)>>,
}

impl MemorySource {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            items: Vec::new(),
            bodies: HashMap::new(),
            ranges: true,
            faults: Mutex::new(HashMap::new()),
            listing_fails_after: Mutex::new(None),
            opens: AtomicUsize::new(0),
            opens_by_id: Mutex::new(HashMap::new()),
            open_times: Mutex::new(Vec::new()),
        }
    }

    pub fn without_ranges(mut self) -> Self {
        self.ranges = false;
        self
    }

    /// Add an item with a generated body. Ids look like `image-3`.
    pub fn add(&mut self, class: MediaClass, sequence_id: u64, size: u64) -> TransferItem {
        self.add_named(class, sequence_id, size, None)
    }

    /// Like [`add`](Self::add) with a source-provided file name.
    pub fn add_named(
        &mut self,
        class: MediaClass,
        sequence_id: u64,
        size: u64,
        file_name: Option<&str>,
    ) -> TransferItem {
        let id = format!("{}-{}", class, sequence_id);
        let item = TransferItem {
            id: id.clone(),
            sequence_id,
            class,
            size_bytes: size,
            locator: String::new(),
            destination: destination_for(&self.root, class, sequence_id, &id, file_name),
        };
        let body = (0..size).map(|i| ((i + sequence_id) % 251) as u8).collect();
        self.bodies.insert(id, body);
        self.items.push(item.clone());
        self.items.sort_by_key(|i| i.sequence_id);
        item
    }

    pub fn body(&self, id: &str) -> &[u8] {
        &self.bodies[id]
    }

    pub fn set_fault(&self, id: &str, fault: Option<Fault>) {
        let mut faults = self.faults.lock().unwrap();
        match fault {
            Some(f) => faults.insert(id.to_string(), f),
            None => faults.remove(id),
        };
    }

    /// Listing yields an error after the last item with `sequence_id <= seq`.
    pub fn fail_listing_after(&self, seq: Option<u64>) {
        *self.listing_fails_after.lock().unwrap() = seq;
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn opens_for(&self, id: &str) -> usize {
        self.opens_by_id.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    /// First open instant of `id`.
    pub fn first_open(&self, id: &str) -> Option<tokio::time::Instant> {
        self.open_times
            .lock()
            .unwrap()
            .iter()
            .find(|(i, _)| i == id)
            .map(|(_, t)| *t)
    }
}

#[async_trait]
impl MediaSource for MemorySource {
    fn list_items(&self, after: u64) -> ItemStream<'_> {
        let fail_after = *self.listing_fails_after.lock().unwrap();
        let mut out: Vec<Result<TransferItem, SourceError>> = Vec::new();
        for item in self.items.iter().filter(|i| i.sequence_id > after) {
            if fail_after.map_or(false, |n| item.sequence_id > n) {
                out.push(Err(SourceError::Unavailable("listing endpoint gone".into())));
                break;
            }
            out.push(Ok(item.clone()));
        }
        stream::iter(out).boxed()
    }

    async fn open_stream(
        &self,
        item: &TransferItem,
        range: Option<ByteRange>,
    ) -> Result<ByteStream, SourceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self
            .opens_by_id
            .lock()
            .unwrap()
            .entry(item.id.clone())
            .or_insert(0) += 1;
        self.open_times
            .lock()
            .unwrap()
            .push((item.id.clone(), tokio::time::Instant::now()));

        let fault = self.faults.lock().unwrap().get(&item.id).copied();
        match (fault, range) {
            (Some(Fault::Network), _) => {
                return Err(SourceError::Network("connection reset by peer".into()))
            }
            (Some(Fault::RateLimited { wait_secs }), _) => {
                return Err(SourceError::RateLimited { wait_secs })
            }
            (Some(Fault::RangeAt(start)), Some(r)) if r.start == start => {
                return Err(SourceError::Http(404))
            }
            (Some(Fault::Stall(wait)), _) => tokio::time::sleep(wait).await,
            _ => {}
        }

        let body = self
            .bodies
            .get(&item.id)
            .ok_or_else(|| SourceError::Unavailable(format!("unknown item {}", item.id)))?;
        let r = range.unwrap_or(ByteRange {
            start: 0,
            end: body.len() as u64,
        });
        let slice = body[r.start as usize..r.end as usize].to_vec();
        // Deliver in small reads like a network body.
        let parts: Vec<Result<Bytes, SourceError>> = slice
            .chunks(97)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(stream::iter(parts).boxed())
    }

    fn supports_ranges(&self) -> bool {
        self.ranges
    }
}
