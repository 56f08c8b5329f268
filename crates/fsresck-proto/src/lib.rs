//! NBD (Network Block Device) wire framing.
//!
//! The capture-side integration speaks this protocol to its block-device server host; this crate
//! provides the request/reply framing in isolation from any particular transport, so it can be
//! exercised against in-memory buffers in tests and against real sockets in production.

pub mod constants;
pub mod error;
mod framing;
pub mod request;
pub mod response;

pub use constants::{Magic, ReplyError, RequestType};
pub use error::{Error, Result};
pub use request::NBDRequest;
pub use response::{NBDResponse, PendingReads};
