use serde::{Deserialize, Serialize};

/// Version of the JSON reply shape. Bumped on any breaking change.
pub const ENVELOPE_VERSION: u32 = 1;

/// Tag carried by every failed reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InvalidAction,
    BadRequest,
    PayloadTooLarge,
    NotFound,
    UnknownTarget,
    PartialWrite,
    Storage,
    Internal,
}

/// JSON reply shape shared by every non-download response.
///
/// ```json
/// { "v": 1, "isOK": true, "message": "ok", "obj": 7 }
/// { "v": 1, "isOK": false, "kind": "validation", "message": "target len > 10", "obj": "12345678901" }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub v: u32,
    #[serde(rename = "isOK")]
    pub is_ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
    pub obj: T,
}

impl<T> Envelope<T> {
    pub fn ok(obj: T) -> Self {
        Self {
            v: ENVELOPE_VERSION,
            is_ok: true,
            kind: None,
            message: "ok".into(),
            obj,
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>, obj: T) -> Self {
        Self {
            v: ENVELOPE_VERSION,
            is_ok: false,
            kind: Some(kind),
            message: message.into(),
            obj,
        }
    }
}
