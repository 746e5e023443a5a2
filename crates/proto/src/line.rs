use serde::{Deserialize, Serialize};

/// Presentation style of one scrollback line.
///
/// Maps one-to-one onto the terminal color/emphasis table used by the
/// renderer: normal server output, echoed commands, connection lifecycle
/// notices, and console-originated (system) messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleTag {
    /// Plain server output.
    Normal,
    /// Server output rendered bold (e.g. section headings).
    NormalEmphasis,
    /// A command line the operator submitted, echoed into the scrollback.
    Command,
    /// Connection lifecycle notice (connected/disconnected/failed).
    ConnectionEvent,
    /// A message originating from the console itself.
    SystemMessage,
    /// A console message rendered bold (e.g. the welcome banner).
    SystemMessageEmphasis,
}

/// One wrapped row of scrollback output.
///
/// The text is already wrapped to at most the viewport width; a `DisplayLine`
/// is immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    /// Row text, at most one viewport width long.
    pub text: String,
    /// Presentation style for the whole row.
    pub style: StyleTag,
}

impl DisplayLine {
    /// Creates a display line from text and style.
    pub fn new(text: impl Into<String>, style: StyleTag) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// An empty normal-styled row, used to pad the viewport past the
    /// end of the stored scrollback.
    pub fn blank() -> Self {
        Self::new("", StyleTag::Normal)
    }
}
