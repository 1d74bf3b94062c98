use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use spanbase_types::{ObjectMeta, SpanSeq, Target};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::split::SpanSplitter;

/// Row counts across the whole store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub objects: u64,
    pub spans: u64,
    /// Sum of all span payload lengths.
    pub span_bytes: u64,
}

/// Chunked object store.
///
/// All implementations must satisfy these invariants:
/// - `allocate` hands out `max(existing target) + 1` (or 1) and inserts the
///   metadata row in the same critical section; concurrent callers never
///   receive the same target.
/// - Every span row references an existing object.
/// - `spans` returns rows in ascending `seq` order.
/// - No span is larger than [`span_size`](SpanStore::span_size).
/// - All backend errors are propagated, never retried.
#[async_trait]
pub trait SpanStore: Send + Sync {
    /// Maximum bytes per span row.
    fn span_size(&self) -> usize;

    /// Reserve the next target and insert its metadata row.
    async fn allocate(&self, text: &str, len: u64) -> StoreResult<Target>;

    /// Append one span to an existing object and return its sequence number.
    ///
    /// Fails with [`StoreError::UnknownTarget`] if no object has `target`.
    async fn write_span(&self, target: Target, data: Bytes) -> StoreResult<SpanSeq>;

    /// Metadata for one object, or `None` if it was never allocated.
    async fn object(&self, target: Target) -> StoreResult<Option<ObjectMeta>>;

    /// Every span payload of `target`, in sequence order.
    async fn spans(&self, target: Target) -> StoreResult<Vec<Bytes>>;

    /// The `limit` newest objects, returned in ascending target order.
    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ObjectMeta>>;

    async fn stats(&self) -> StoreResult<StoreStats>;

    /// Allocate an object for `payload` and write all of its spans.
    ///
    /// The default implementation issues one `write_span` per range with no
    /// cross-span atomicity: a failure after allocation leaves the object row
    /// behind and is reported as [`StoreError::PartialWrite`] carrying the
    /// backend error as its source. Backends that can scope the whole upload
    /// in one transaction override this.
    async fn put_object(&self, text: &str, payload: Bytes) -> StoreResult<Target> {
        let expected = payload.len() as u64;
        let target = self.allocate(text, expected).await?;

        let mut persisted = 0u64;
        for range in SpanSplitter::new(payload.len(), self.span_size()) {
            if let Err(err) = self.write_span(target, payload.slice(range.as_range())).await {
                warn!(%target, expected, persisted, error = %err, "span write failed mid-upload");
                return Err(StoreError::PartialWrite {
                    target,
                    expected,
                    persisted,
                    source: Some(Box::new(err)),
                });
            }
            persisted += range.len() as u64;
        }

        debug!(%target, len = expected, "object stored span by span");
        Ok(target)
    }
}
