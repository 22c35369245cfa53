//! Parsing of terminal input lines.

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Users,
    /// `/open <id|username>`
    Open(String),
    /// Try the Presence Channel again after automatic reconnection gave up
    Reconnect,
    Help,
    Quit,
    /// Any non-command line: a message for the open conversation
    Send(String),
}

/// Parse one input line. Lines that do not start with `/` are messages.
pub fn parse_command(line: &str) -> Result<Command, ClientError> {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return Ok(Command::Send(line.to_string()));
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let argument = parts.next().map(str::trim).unwrap_or_default();

    match (name, argument) {
        ("/users", _) => Ok(Command::Users),
        ("/reconnect", _) => Ok(Command::Reconnect),
        ("/help", _) => Ok(Command::Help),
        ("/quit" | "/exit", _) => Ok(Command::Quit),
        ("/open", "") => Err(ClientError::Validation(
            "usage: /open <id|username>".to_string(),
        )),
        ("/open", target) => Ok(Command::Open(target.to_string())),
        (other, _) => Err(ClientError::Validation(format!(
            "unknown command '{}', try /help",
            other
        ))),
    }
}
