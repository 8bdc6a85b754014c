//! Interactive prompt command parsing for the order creator.

use tracing::warn;

/// What the operator asked the creator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    /// Terminate the process with status 0.
    Exit,
    /// Publish `count` orders; `bulk` sends them with a single flush at the
    /// end instead of flushing after each one.
    Send { count: u32, bulk: bool },
}

/// Parse one prompt line.
///
/// - empty input → send 1
/// - `N` → send N sequentially
/// - `bulk-N` → send N in bulk
/// - `exit` → terminate
/// - anything unparsable → warn and default to 1
pub fn parse_user_command(input: &str) -> UserCommand {
    let trimmed = input.trim();

    if trimmed.eq_ignore_ascii_case("exit") {
        return UserCommand::Exit;
    }
    if trimmed.is_empty() {
        return UserCommand::Send { count: 1, bulk: false };
    }

    if let Some(rest) = trimmed.strip_prefix("bulk-") {
        let count = rest.parse().unwrap_or_else(|_| {
            warn!(input = %trimmed, "invalid bulk count, defaulting to 1 message");
            1
        });
        return UserCommand::Send { count, bulk: true };
    }

    let count = trimmed.parse().unwrap_or_else(|_| {
        warn!(input = %trimmed, "invalid count, defaulting to 1 message");
        1
    });
    UserCommand::Send { count, bulk: false }
}
