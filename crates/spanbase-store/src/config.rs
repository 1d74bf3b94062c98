use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Default span size: 1.5 MiB, comfortably under common row-size caps.
pub const DEFAULT_SPAN_SIZE: usize = 1024 * 1024 * 3 / 2;

/// Default number of objects returned by a recent-objects listing.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Store configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    /// Maximum bytes per span row.
    pub span_size: usize,
    /// Window size for recent-object listings.
    pub list_limit: usize,
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            span_size: DEFAULT_SPAN_SIZE,
            list_limit: DEFAULT_LIST_LIMIT,
            busy_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    /// In-memory configuration with a custom span size.
    pub fn in_memory(span_size: usize) -> Self {
        Self {
            span_size,
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.span_size == 0 {
            return Err(StoreError::Config("span_size must be greater than zero".into()));
        }
        if self.list_limit == 0 {
            return Err(StoreError::Config("list_limit must be greater than zero".into()));
        }
        Ok(())
    }
}
