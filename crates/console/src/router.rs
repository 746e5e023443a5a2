//! Decides whether a submitted line is a terminal-local command or must be
//! forwarded verbatim to the server.

/// A command handled entirely within the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalCommand {
    /// Tear down the transport and end the session.
    Exit,
    /// Connect to a server, optionally overriding host and/or port.
    Connect {
        host: Option<String>,
        port: Option<u16>,
    },
    /// Drop the current connection.
    Disconnect,
    /// Print built-in help (and request server help while connected).
    Help,
    /// A local command with arguments that do not parse.
    Invalid(String),
}

/// Parses a submitted line into a local command, or `None` when the line is
/// not local and should be forwarded to the server.
pub fn parse_local(line: &str) -> Option<LocalCommand> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?;

    match command {
        "exit" => Some(LocalCommand::Exit),
        "disconnect" => Some(LocalCommand::Disconnect),
        "help" => Some(LocalCommand::Help),
        "connect" => {
            let host = parts.next().map(str::to_string);
            let port = match parts.next() {
                None => None,
                Some(raw) => match raw.parse::<u16>() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        return Some(LocalCommand::Invalid(format!(
                            "Port {raw} is not a valid integer"
                        )));
                    }
                },
            };
            Some(LocalCommand::Connect { host, port })
        }
        _ => None,
    }
}
