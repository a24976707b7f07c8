//! Chat commands understood by the ledger bot

/// Acknowledgement published after a reset
pub const RESET_ACK: &str = "All data has been reset!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Zero the whole ledger: `!reset`
    Reset,
    /// Publish the current ledger: `!summary`
    Summary,
}

/// Parse a command from message text. Only the whole message counts.
pub fn parse(text: &str) -> Option<Command> {
    let command = text.trim().to_lowercase();

    match command.as_str() {
        "!reset" => Some(Command::Reset),
        "!summary" => Some(Command::Summary),
        _ => None,
    }
}
