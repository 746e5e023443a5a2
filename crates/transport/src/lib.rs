//! Network client for the animation server.
//!
//! The session engine consumes this crate through two narrow seams: the
//! [`Transport`] trait (connect/disconnect/send) and a
//! `tokio::sync::mpsc` channel carrying [`proto::TransportEvent`]
//! notifications for inbound payloads and connection lifecycle changes.

pub mod format;
pub mod tcp;

/// Re-export of the payload formatting collaborator.
pub use format::{FormattedMessage, format_payload};
/// Re-export of the transport seam and its TCP implementation.
pub use tcp::{TcpTransport, Transport};
