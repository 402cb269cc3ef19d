//! Single-stream transfer: whole body into `<dest>.part`, then rename.

use crate::error::TransferError;
use crate::media::TransferItem;
use crate::storage::{self, PartFile};

use super::Fetcher;

/// One attempt. Leaves no `.part` file behind on failure.
pub(super) async fn fetch_single(
    fetcher: &Fetcher,
    item: &TransferItem,
) -> Result<u64, TransferError> {
    let temp = storage::temp_path(&item.destination);
    let mut part = PartFile::create(&temp).await?;

    if let Err(e) = fetcher.stream_into(item, None, &mut part).await {
        discard(part).await;
        return Err(e);
    }

    // Unknown size (0) is trusted as-is.
    if item.size_bytes > 0 && part.written() != item.size_bytes {
        let received = part.written();
        discard(part).await;
        return Err(TransferError::ShortTransfer {
            expected: item.size_bytes,
            received,
        });
    }

    Ok(part.finalize(&item.destination).await?)
}

async fn discard(part: PartFile) {
    let path = part.temp_path().to_path_buf();
    if let Err(e) = part.discard().await {
        tracing::warn!(path = %path.display(), error = %e, "could not remove temp file");
    }
}
