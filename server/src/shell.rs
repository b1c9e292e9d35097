//! Command shell for a single host.
//!
//! The shell is a stateless dispatcher: it takes one parsed command plus the
//! host it targets and renders a human-readable response. It never touches
//! the network layer; the session owns all reads and writes.

use crate::host::Host;
use shared::Command;

/// Text shown when a `list` finds nothing on the host.
pub const NO_FILES: &str = "No files available.";

/// Executes a file command against the host's filesystem and renders the
/// outcome as response text.
pub fn execute(cmd: &Command, host: &mut Host) -> String {
    match cmd {
        Command::Create { name, content } => {
            host.filesystem_mut().create_or_update(name, content);
            format!("File '{}' created with content: {}", name, content)
        }
        Command::Delete { name } => match host.filesystem_mut().delete(name) {
            Ok(()) => format!("File '{}' deleted.", name),
            Err(err) => err.to_string(),
        },
        Command::List => {
            if host.filesystem().is_empty() {
                NO_FILES.to_string()
            } else {
                host.filesystem()
                    .list()
                    .map(|(name, content)| format!("{}: {}", name, content))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        // `ps`, `help` and `exit` are session built-ins, matched before
        // dispatch ever reaches the shell.
        Command::Ps | Command::Help | Command::Exit => shared::HELP_TEXT.to_string(),
    }
}
