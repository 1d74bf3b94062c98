//! Foundation types for Spanbase.
//!
//! Spanbase stores large binary objects in a relational backend whose rows are
//! size-limited. Each object gets a numeric [`Target`], a metadata row, and a
//! sequence of bounded-size span rows. Every other Spanbase crate depends on
//! `spanbase-types`.
//!
//! # Key Types
//!
//! - [`Target`] - Integer identifier correlating an object with its spans
//! - [`ObjectMeta`] - The metadata row: label, byte length, target
//! - [`ObjectPayload`] - A reassembled object ready to hand to a transport
//! - [`FieldValue`] - A loosely typed request field (text, file, raw binary)
//! - [`ValidationError`] - Why a request was refused before reaching storage

pub mod error;
pub mod field;
pub mod object;
pub mod target;
pub mod validate;

pub use error::{ValidationError, ValidationReason};
pub use field::{FieldValue, FilePart};
pub use object::{ObjectMeta, ObjectPayload};
pub use target::{SpanSeq, Target};
pub use validate::{validate_query, validate_target, validate_upload, Query, Upload, MAX_TARGET_LEN};
