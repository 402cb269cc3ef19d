//! Chunked transfer: ranged reads in parallel, reassembled in index order.

use futures::future::join_all;
use std::path::{Path, PathBuf};

use crate::error::TransferError;
use crate::media::{ByteRange, TransferItem};
use crate::retry::run_with_retry;
use crate::segmenter::plan_chunks;
use crate::storage::{self, PartFile};

use super::Fetcher;

pub(super) async fn fetch_chunked(
    fetcher: &Fetcher,
    item: &TransferItem,
    chunk_count: usize,
) -> Result<u64, TransferError> {
    let Some(plan) = plan_chunks(item.size_bytes, chunk_count) else {
        return fetcher.fetch_single_with_retry(item).await;
    };
    let count = plan.chunk_count();
    let paths: Vec<PathBuf> = (0..count)
        .map(|i| storage::chunk_path(&item.destination, item.sequence_id, i, count))
        .collect();

    tracing::debug!(
        item_id = %item.id,
        file = %item.file_name(),
        bytes = item.size_bytes,
        chunks = count,
        chunk_size = plan.chunk_size,
        "chunked transfer"
    );

    let fetches = plan.chunks.iter().zip(&paths).enumerate().map(|(index, (range, path))| {
        let range = *range;
        async move {
            let label = format!("{}#{}", item.id, index);
            run_with_retry(&fetcher.policy, &label, || fetch_chunk(fetcher, item, range, path))
                .await
                .map_err(|e| TransferError::PartialChunk {
                    index,
                    count,
                    source: Box::new(e),
                })
        }
    });

    // Every read runs to its end so no chunk file is created after cleanup.
    let results = join_all(fetches).await;
    let mut errors = results.into_iter().filter_map(Result::err);
    if let Some(first) = errors.next() {
        let range_ignored = first.is_range_ignored() || errors.any(|e| e.is_range_ignored());
        discard_chunks(&item.destination, &paths).await;
        if range_ignored {
            fetcher.mark_ranges_ignored();
            tracing::info!(item_id = %item.id, file = %item.file_name(), "range ignored, fetching whole");
            return fetcher.fetch_single_with_retry(item).await;
        }
        return Err(first);
    }

    match reassemble(item, &paths).await {
        Ok(n) => {
            storage::remove_dir_if_empty(&storage::chunk_dir(&item.destination)).await;
            Ok(n)
        }
        Err(e) => {
            discard_chunks(&item.destination, &paths).await;
            Err(e)
        }
    }
}

/// One attempt at one range. The chunk file is truncated on every attempt.
async fn fetch_chunk(
    fetcher: &Fetcher,
    item: &TransferItem,
    range: ByteRange,
    path: &Path,
) -> Result<(), TransferError> {
    let mut part = PartFile::create(path).await?;
    fetcher.stream_into(item, Some(range), &mut part).await?;
    if part.written() != range.len() {
        return Err(TransferError::ShortTransfer {
            expected: range.len(),
            received: part.written(),
        });
    }
    part.sync().await?;
    Ok(())
}

/// Concatenate chunk files into `<dest>.part`, deleting each as it is
/// consumed, and rename into place.
async fn reassemble(item: &TransferItem, paths: &[PathBuf]) -> Result<u64, TransferError> {
    let temp = storage::temp_path(&item.destination);
    let mut out = PartFile::create(&temp).await?;
    if let Err(e) = append_chunks(&mut out, paths).await {
        let _ = out.discard().await;
        return Err(e);
    }
    if out.written() != item.size_bytes {
        let received = out.written();
        let _ = out.discard().await;
        return Err(TransferError::ShortTransfer {
            expected: item.size_bytes,
            received,
        });
    }
    Ok(out.finalize(&item.destination).await?)
}

async fn append_chunks(out: &mut PartFile, paths: &[PathBuf]) -> Result<(), TransferError> {
    for path in paths {
        out.append_file(path).await?;
        storage::remove_if_exists(path).await?;
    }
    Ok(())
}

async fn discard_chunks(destination: &Path, paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = storage::remove_if_exists(path).await {
            tracing::warn!(path = %path.display(), error = %e, "could not remove chunk file");
        }
    }
    storage::remove_dir_if_empty(&storage::chunk_dir(destination)).await;
}
