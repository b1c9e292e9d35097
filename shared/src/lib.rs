//! Wire protocol shared between the virtual-network server and client.
//!
//! The protocol is newline-delimited UTF-8 text: one command per line, one
//! (possibly multi-line) response per command. This crate owns the command
//! grammar so that both sides agree on exactly which verbs exist and how
//! their arguments are validated.

use thiserror::Error;

/// Static command reference rendered in response to `help`.
pub const HELP_TEXT: &str = "Available commands:\n\
    \x20 create <filename> <content> - Create a file on your host.\n\
    \x20 delete <filename> - Delete a file on your host.\n\
    \x20 list - List all files on your host.\n\
    \x20 ps - List all active host addresses.\n\
    \x20 help - Show this message.\n\
    \x20 exit - Disconnect from the server.";

/// The closed set of verbs a client can send.
///
/// Every line a session reads is tokenized once and mapped onto exactly one
/// of these variants (or a [`ParseError`]). File verbs (`create`, `delete`,
/// `list`) operate on the session's bound host; the rest are handled by the
/// session loop itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create or overwrite a file on the session's host.
    Create { name: String, content: String },
    /// Delete a file from the session's host.
    Delete { name: String },
    /// List all files on the session's host.
    List,
    /// List all currently allocated host addresses.
    Ps,
    /// Show the command reference.
    Help,
    /// Disconnect from the server.
    Exit,
}

/// Recoverable parse failures, rendered to the client as a single text line.
///
/// None of these ever terminates a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `create` with a missing filename or empty content.
    #[error("Usage: create <filename> <content>")]
    MalformedCreate,
    /// `delete` with zero or more than one argument.
    #[error("Usage: delete <filename>")]
    MalformedDelete,
    /// A verb outside the closed command set; carries the original input
    /// for diagnostic display.
    #[error("Unknown command '{input}'. Type 'help' for available commands.")]
    Unknown { input: String },
}

/// Parses one raw input line into a [`Command`].
///
/// Keyword matching is case-sensitive for the file-mutation verbs and
/// case-insensitive for the zero-argument verbs (`list`, `ps`, `help`,
/// `exit`), which also ignore any trailing tokens. For `create`, the content
/// is the remainder of the line after the filename token with leading
/// whitespace stripped; internal whitespace is preserved.
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let trimmed = line.trim();
    let mut tokens = trimmed.split_whitespace();

    let keyword = match tokens.next() {
        Some(keyword) => keyword,
        None => {
            return Err(ParseError::Unknown {
                input: String::new(),
            })
        }
    };

    match keyword.to_ascii_lowercase().as_str() {
        "list" => return Ok(Command::List),
        "ps" => return Ok(Command::Ps),
        "help" => return Ok(Command::Help),
        "exit" => return Ok(Command::Exit),
        _ => {}
    }

    match keyword {
        "create" => {
            // Content is everything after the filename, not a single token.
            let rest = trimmed[keyword.len()..].trim_start();
            let mut parts = rest.splitn(2, char::is_whitespace);
            let name = parts.next().filter(|name| !name.is_empty());
            let content = parts
                .next()
                .map(str::trim_start)
                .filter(|content| !content.is_empty());

            match (name, content) {
                (Some(name), Some(content)) => Ok(Command::Create {
                    name: name.to_string(),
                    content: content.to_string(),
                }),
                _ => Err(ParseError::MalformedCreate),
            }
        }
        "delete" => match (tokens.next(), tokens.next()) {
            (Some(name), None) => Ok(Command::Delete {
                name: name.to_string(),
            }),
            _ => Err(ParseError::MalformedDelete),
        },
        _ => Err(ParseError::Unknown {
            input: trimmed.to_string(),
        }),
    }
}
