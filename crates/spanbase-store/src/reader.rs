use bytes::{Bytes, BytesMut};
use spanbase_types::{ObjectPayload, Target};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::SpanStore;

/// Concatenate span payloads in the given order, with no separators.
pub fn reassemble(spans: &[Bytes]) -> Bytes {
    match spans {
        [] => Bytes::new(),
        [only] => only.clone(),
        _ => {
            let total = spans.iter().map(Bytes::len).sum();
            let mut out = BytesMut::with_capacity(total);
            for span in spans {
                out.extend_from_slice(span);
            }
            out.freeze()
        }
    }
}

/// Read one object back as a single contiguous buffer.
///
/// The object row is looked up first, so an unknown target
/// ([`StoreError::NotFound`]) is told apart from an object that was stored
/// without a payload (empty buffer, success). A byte total that disagrees
/// with the object's `len` is reported as [`StoreError::PartialWrite`].
pub async fn read_object<S>(store: &S, target: Target) -> StoreResult<ObjectPayload>
where
    S: SpanStore + ?Sized,
{
    let meta = store
        .object(target)
        .await?
        .ok_or(StoreError::NotFound(target))?;

    let spans = store.spans(target).await?;
    if spans.is_empty() && !meta.has_payload() {
        debug!(%target, "object has no payload");
        return Ok(ObjectPayload {
            meta,
            data: Bytes::new(),
        });
    }
    let data = reassemble(&spans);

    if data.len() as u64 != meta.len {
        warn!(
            %target,
            expected = meta.len,
            persisted = data.len(),
            spans = spans.len(),
            "object length does not match persisted spans"
        );
        return Err(StoreError::PartialWrite {
            target,
            expected: meta.len,
            persisted: data.len() as u64,
            source: None,
        });
    }

    debug!(%target, spans = spans.len(), len = data.len(), "object reassembled");
    Ok(ObjectPayload { meta, data })
}
