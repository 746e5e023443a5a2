//! Shared protocol types for the console session engine and transport.
//!
//! This crate defines the display line/style model used by the scrollback
//! buffer, the transport event and connection state types, the wire-format
//! constants of the animation server protocol, and strongly-typed error enums
//! shared across the workspace.

pub mod error;
pub mod event;
pub mod line;
pub mod wire;

/// Re-export of all protocol error types.
pub use error::*;
/// Re-export of transport notification and connection state types.
pub use event::{ConnectionState, MessageCategory, TransportEvent};
/// Re-export of display line and style types.
pub use line::{DisplayLine, StyleTag};
