use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::target::Target;

/// Metadata row of a stored object.
///
/// Field order matches the listing shape clients already consume:
/// `{ "text": ..., "len": ..., "target": ... }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Short descriptive label supplied at creation.
    pub text: String,
    /// Total byte length of the binary payload (0 if none).
    pub len: u64,
    /// Identifier shared with the object's spans.
    pub target: Target,
}

impl ObjectMeta {
    pub fn new(target: Target, text: impl Into<String>, len: u64) -> Self {
        Self {
            text: text.into(),
            len,
            target,
        }
    }

    /// Returns `true` if the object was created without a binary payload.
    pub fn has_payload(&self) -> bool {
        self.len > 0
    }
}

/// A fully reassembled object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectPayload {
    pub meta: ObjectMeta,
    /// Concatenation of every span in sequence order.
    pub data: Bytes,
}

impl ObjectPayload {
    /// Byte count to report as the transport's content length.
    pub fn content_length(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
