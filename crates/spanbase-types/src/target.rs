use std::fmt;

use serde::{Deserialize, Serialize};

/// Zero-based position of a span within its object.
pub type SpanSeq = u32;

/// Integer identifier for a stored object.
///
/// Targets are assigned by the store as `max(existing) + 1`, starting at 1,
/// and are never reused. The same value tags every span row of the object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(u64);

impl Target {
    /// The first target handed out by an empty store.
    pub const FIRST: Target = Target(1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The target that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.0)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Target {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Target> for u64 {
    fn from(target: Target) -> Self {
        target.0
    }
}
