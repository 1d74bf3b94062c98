//! Chunked object storage for Spanbase.
//!
//! Relational backends cap the size of a single row, so large payloads are
//! split into bounded-size spans on write, each persisted as its own row
//! tagged with the owning object's [`Target`](spanbase_types::Target), and
//! concatenated back into one contiguous buffer on read.
//!
//! # Components
//!
//! - [`SpanSplitter`] -- lazy iterator of byte ranges no larger than the span size
//! - [`write_spans`] -- drives a sink over every range in ascending order
//! - [`read_object`] -- existence check, ordered fetch, and reassembly
//!
//! # Storage Backends
//!
//! All backends implement the [`SpanStore`] trait:
//!
//! - [`SqliteSpanStore`] -- rusqlite-backed store with explicit span sequence numbers
//! - [`InMemorySpanStore`] -- map-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Targets are `max(existing) + 1`, assigned in the same critical section as the insert.
//! 2. Spans carry an explicit `seq`; reads sort on it, never on storage order.
//! 3. `put_object` is all-or-nothing on both backends.
//! 4. An object that exists with fewer span bytes than its `len` is a partial
//!    write, never a silent short read.
//! 5. No retries. Every backend error is propagated once.

pub mod config;
pub mod error;
pub mod memory;
pub mod reader;
pub mod split;
pub mod sqlite;
pub mod traits;
pub mod writer;

pub use config::{StoreConfig, DEFAULT_LIST_LIMIT, DEFAULT_SPAN_SIZE};
pub use error::{StoreError, StoreResult};
pub use memory::InMemorySpanStore;
pub use reader::{read_object, reassemble};
pub use split::{SpanRange, SpanSplitter};
pub use sqlite::SqliteSpanStore;
pub use traits::{SpanStore, StoreStats};
pub use writer::write_spans;
