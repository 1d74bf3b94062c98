use serde::Serialize;
use thiserror::Error;

/// Why a request field was refused.
///
/// The display strings are part of the client-facing response shape and must
/// stay stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    #[error("target len > 10")]
    TargetTooLong,

    #[error("target has not 0-9 char")]
    TargetNotDigits,

    #[error("target is NAN or Infinity")]
    TargetNotFinite,

    #[error("text type error")]
    TextType,

    #[error("file type error")]
    FileType,
}

/// A request refused by the validator. No storage call has been made.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ValidationError {
    /// What was wrong with the input.
    pub reason: ValidationReason,
    /// The offending raw input, when it is textual.
    pub input: Option<String>,
}

impl ValidationError {
    pub fn new(reason: ValidationReason, input: impl Into<String>) -> Self {
        Self {
            reason,
            input: Some(input.into()),
        }
    }

    /// A refusal that has no meaningful textual input to echo back.
    pub fn without_input(reason: ValidationReason) -> Self {
        Self {
            reason,
            input: None,
        }
    }
}
