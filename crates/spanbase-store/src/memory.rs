use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use spanbase_types::{ObjectMeta, SpanSeq, Target};
use tracing::debug;

use crate::config::DEFAULT_SPAN_SIZE;
use crate::error::{StoreError, StoreResult};
use crate::traits::{SpanStore, StoreStats};
use crate::writer::write_spans;

#[derive(Default)]
struct Tables {
    objects: BTreeMap<Target, ObjectMeta>,
    spans: HashMap<Target, Vec<Bytes>>,
}

impl Tables {
    fn next_target(&self) -> Target {
        self.objects
            .keys()
            .next_back()
            .map_or(Target::FIRST, |last| last.next())
    }

    fn insert_object(&mut self, text: &str, len: u64) -> Target {
        let target = self.next_target();
        self.objects.insert(target, ObjectMeta::new(target, text, len));
        target
    }
}

/// In-memory, map-based span store.
///
/// Intended for tests and embedding. Both tables live behind one `RwLock`, so
/// allocation and whole-object uploads are atomic with respect to each other.
pub struct InMemorySpanStore {
    tables: RwLock<Tables>,
    span_size: usize,
}

impl InMemorySpanStore {
    /// # Panics
    ///
    /// Panics if `span_size` is zero.
    pub fn new(span_size: usize) -> Self {
        assert!(span_size > 0, "span size must be non-zero");
        Self {
            tables: RwLock::new(Tables::default()),
            span_size,
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.tables.read().expect("lock poisoned").objects.len()
    }

    /// Returns `true` if no object has been allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySpanStore {
    fn default() -> Self {
        Self::new(DEFAULT_SPAN_SIZE)
    }
}

#[async_trait]
impl SpanStore for InMemorySpanStore {
    fn span_size(&self) -> usize {
        self.span_size
    }

    async fn allocate(&self, text: &str, len: u64) -> StoreResult<Target> {
        let target = self
            .tables
            .write()
            .expect("lock poisoned")
            .insert_object(text, len);
        debug!(%target, len, "allocated target");
        Ok(target)
    }

    async fn write_span(&self, target: Target, data: Bytes) -> StoreResult<SpanSeq> {
        if data.len() > self.span_size {
            return Err(StoreError::SpanTooLarge {
                size: data.len(),
                max: self.span_size,
            });
        }
        let mut tables = self.tables.write().expect("lock poisoned");
        let len = match tables.objects.get(&target) {
            Some(meta) => meta.len,
            None => return Err(StoreError::UnknownTarget(target)),
        };
        let spans = tables.spans.entry(target).or_default();
        let attempted = spans.iter().map(|s| s.len() as u64).sum::<u64>() + data.len() as u64;
        if attempted > len {
            return Err(StoreError::SpanOverrun {
                target,
                len,
                attempted,
            });
        }
        let seq = SpanSeq::try_from(spans.len()).map_err(|_| StoreError::SpanOverflow(target))?;
        spans.push(data);
        Ok(seq)
    }

    async fn object(&self, target: Target) -> StoreResult<Option<ObjectMeta>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.objects.get(&target).cloned())
    }

    async fn spans(&self, target: Target) -> StoreResult<Vec<Bytes>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.spans.get(&target).cloned().unwrap_or_default())
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ObjectMeta>> {
        let tables = self.tables.read().expect("lock poisoned");
        let mut recent: Vec<ObjectMeta> = tables.objects.values().rev().take(limit).cloned().collect();
        recent.reverse();
        Ok(recent)
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let tables = self.tables.read().expect("lock poisoned");
        let spans = tables.spans.values().map(|s| s.len() as u64).sum();
        let span_bytes = tables
            .spans
            .values()
            .flatten()
            .map(|b| b.len() as u64)
            .sum();
        Ok(StoreStats {
            objects: tables.objects.len() as u64,
            spans,
            span_bytes,
        })
    }

    async fn put_object(&self, text: &str, payload: Bytes) -> StoreResult<Target> {
        let mut tables = self.tables.write().expect("lock poisoned");
        let target = tables.next_target();

        let mut spans = Vec::new();
        write_spans::<StoreError, _>(target, &payload, self.span_size, |_, chunk| {
            spans.push(payload.slice_ref(chunk));
            Ok(())
        })?;

        tables.insert_object(text, payload.len() as u64);
        if !spans.is_empty() {
            tables.spans.insert(target, spans);
        }
        debug!(%target, len = payload.len(), "object stored");
        Ok(target)
    }
}

impl std::fmt::Debug for InMemorySpanStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySpanStore")
            .field("object_count", &self.len())
            .field("span_size", &self.span_size)
            .finish()
    }
}
