use std::ops::Range;

/// Half-open byte range `[start, end)` of one span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanRange {
    pub start: usize,
    pub end: usize,
}

impl SpanRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Lazy sequence of span ranges covering `[0, size)`.
///
/// Each range is `min(span_size, size - start)` bytes. The ranges are
/// ascending, contiguous, and exhaustive; a zero `size` yields nothing. The
/// splitter only does arithmetic, so restarting is just building a new one.
#[derive(Clone, Debug)]
pub struct SpanSplitter {
    size: usize,
    span_size: usize,
    start: usize,
}

impl SpanSplitter {
    /// # Panics
    ///
    /// Panics if `span_size` is zero. [`StoreConfig::validate`](crate::StoreConfig::validate)
    /// rejects such configurations before a store is opened.
    pub fn new(size: usize, span_size: usize) -> Self {
        assert!(span_size > 0, "span size must be non-zero");
        Self {
            size,
            span_size,
            start: 0,
        }
    }

    /// Number of spans the full sequence produces.
    pub fn span_count(size: usize, span_size: usize) -> usize {
        size.div_ceil(span_size)
    }
}

impl Iterator for SpanSplitter {
    type Item = SpanRange;

    fn next(&mut self) -> Option<SpanRange> {
        if self.start >= self.size {
            return None;
        }
        let count = self.span_size.min(self.size - self.start);
        let range = SpanRange {
            start: self.start,
            end: self.start + count,
        };
        self.start += count;
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = Self::span_count(self.size - self.start.min(self.size), self.span_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SpanSplitter {}
