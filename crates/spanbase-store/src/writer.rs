use spanbase_types::{SpanSeq, Target};

use crate::error::StoreError;
use crate::split::SpanSplitter;

/// Feed every span of `source` to `sink`, in ascending order.
///
/// The sink receives the span's sequence number and its bytes. The first sink
/// error stops the walk and is returned unchanged; spans already handed over
/// are the sink's responsibility (a transaction sink rolls them back).
/// Returns the number of spans written.
pub fn write_spans<E, F>(
    target: Target,
    source: &[u8],
    span_size: usize,
    mut sink: F,
) -> Result<SpanSeq, E>
where
    F: FnMut(SpanSeq, &[u8]) -> Result<(), E>,
    E: From<StoreError>,
{
    let mut written: SpanSeq = 0;
    for (index, range) in SpanSplitter::new(source.len(), span_size).enumerate() {
        let seq = SpanSeq::try_from(index).map_err(|_| StoreError::SpanOverflow(target))?;
        sink(seq, &source[range.as_range()])?;
        written = seq + 1;
    }
    Ok(written)
}
