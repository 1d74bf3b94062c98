use spanbase_types::Target;

/// Errors from span store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object has been allocated under this target.
    #[error("object not found: {0}")]
    NotFound(Target),

    /// A span was written for a target that has no object row.
    #[error("span refers to unknown target {0}")]
    UnknownTarget(Target),

    /// The persisted span bytes do not add up to the object's length.
    ///
    /// `source` is the backend failure that interrupted a span-by-span upload;
    /// it is `None` when the mismatch is only observed on read.
    #[error("partial write for {target}: expected {expected} bytes, {persisted} persisted")]
    PartialWrite {
        target: Target,
        expected: u64,
        persisted: u64,
        #[source]
        source: Option<Box<StoreError>>,
    },

    /// Appending a span would push the object past its recorded length.
    #[error("span overruns {target}: {attempted} bytes would exceed length {len}")]
    SpanOverrun {
        target: Target,
        len: u64,
        attempted: u64,
    },

    /// A single span exceeds the configured span size.
    #[error("span of {size} bytes exceeds span size {max}")]
    SpanTooLarge { size: usize, max: usize },

    /// The object has more spans than a sequence number can address.
    #[error("too many spans for {0}")]
    SpanOverflow(Target),

    /// Error reported by the SQLite backend.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The blocking task running a backend call panicked or was cancelled.
    #[error("backend task failed: {0}")]
    Task(String),

    /// The store configuration is unusable.
    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}

impl StoreError {
    /// Returns `true` for errors raised by the backend itself rather than by
    /// the data model.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Sqlite(_) | Self::Task(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
