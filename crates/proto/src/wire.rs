//! Wire-format constants of the animation server protocol.
//!
//! Outbound commands are framed with a fixed prefix; inbound data is a stream
//! of delimited payloads, each starting with a four-character type prefix
//! followed by a colon and a JSON body.

/// Prefix prepended to every command forwarded to the server.
pub const COMMAND_PREFIX: &str = "CMD :";

/// Delimiter separating payloads in the inbound byte stream.
pub const MESSAGE_DELIMITER: &str = ";;;";

/// Length of the inbound payload type prefix.
pub const TYPE_PREFIX_LEN: usize = 4;

/// Animation data payload prefix.
pub const ANIMATION_DATA_PREFIX: &str = "DATA";
/// Animation info payload prefix (the suppressible category).
pub const ANIMATION_INFO_PREFIX: &str = "AINF";
/// Strip info payload prefix.
pub const STRIP_INFO_PREFIX: &str = "SINF";
/// Strip section payload prefix.
pub const SECTION_PREFIX: &str = "SECT";
/// End-animation payload prefix.
pub const END_ANIMATION_PREFIX: &str = "END ";

/// Frames a command for the wire.
pub fn frame_command(cmd: &str) -> String {
    format!("{COMMAND_PREFIX}{cmd}")
}
