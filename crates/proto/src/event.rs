use serde::{Deserialize, Serialize};

/// Connection state of the session, as seen by the controller.
///
/// Owned by the session controller; mutated only by transport-originated
/// notifications or explicit connect/disconnect commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection exists.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The connection is established.
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Asynchronous notification from the transport to the session controller.
///
/// Delivered over `tokio::sync::mpsc` so that inbound data and connection
/// lifecycle changes are serialized through the same event loop that handles
/// keyboard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection to `addr` has been established.
    Connected { addr: String },
    /// A connect attempt to `addr` failed.
    ConnectFailed { addr: String, reason: String },
    /// The connection to `addr` has been closed (by peer or locally).
    Disconnected { addr: String },
    /// One delimited inbound payload, undecoded.
    Received { payload: String },
}

/// Category of a formatted inbound message.
///
/// Animation info is the noisy category the server dumps on every connect;
/// it stays hidden until the operator has explicitly asked the server for
/// something once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCategory {
    /// A running animation's parameters.
    AnimationData,
    /// A supported-animation descriptor (suppressible).
    AnimationInfo,
    /// Strip hardware/configuration info.
    StripInfo,
    /// A strip section definition.
    Section,
    /// Notice that an animation ended.
    EndAnimation,
    /// Anything else, shown verbatim.
    Other,
}

impl MessageCategory {
    /// Returns `true` for categories hidden while the suppression flag is set.
    pub fn suppressible(self) -> bool {
        matches!(self, MessageCategory::AnimationInfo)
    }
}
