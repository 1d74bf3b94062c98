//! HTTP adapter for Spanbase.
//!
//! Exposes the file-list endpoint: multipart uploads are validated and stored
//! as chunked objects, `GET` either lists the most recent objects or streams
//! one reassembled object back with its `Content-Length`. Every failure is
//! converted into a tagged, versioned JSON [`Envelope`] at this boundary.

pub mod config;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use envelope::{Envelope, ErrorKind, ENVELOPE_VERSION};
pub use error::{ServerError, ServerResult};
pub use server::SpanbaseServer;
pub use state::AppState;
