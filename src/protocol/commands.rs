//! Module `commands`
//!
//! Command parsing for the upload protocol and the result types handlers
//! return.

/// A command parsed from a client line.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    NOOP,
    LIST,
    PURGE,                                // Wipe and re-create the storage root
    RETR(String),                         // Download a stored file
    STOR { filename: String, size: u64 }, // Upload; `size` raw bytes follow the line
    INVALID(String),                      // Known command, bad arguments
    UNKNOWN,
}

impl Command {
    /// Whether handling this command touches the filesystem.
    pub fn needs_storage(&self) -> bool {
        matches!(
            self,
            Command::LIST | Command::PURGE | Command::RETR(_) | Command::STOR { .. }
        )
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Full result of a command: the reply line(s) and an optional raw payload
/// sent after them.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
    pub data: Option<Vec<u8>>,
}

impl CommandResult {
    pub fn success(message: String) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message),
            data: None,
        }
    }

    pub fn failure(reason: impl Into<String>, message: String) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: Some(message),
            data: None,
        }
    }
}

/// Parses a raw line into a `Command`.
///
/// `STOR` takes the size as its last argument so filenames may contain spaces.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "QUIT" => Command::QUIT,
        "NOOP" => Command::NOOP,
        "LIST" => Command::LIST,
        "PURGE" => Command::PURGE,
        "RETR" if !arg.is_empty() => Command::RETR(arg.to_string()),
        "RETR" => Command::INVALID("RETR requires a filename".into()),
        "STOR" => parse_stor(arg),
        _ => Command::UNKNOWN,
    }
}

fn parse_stor(arg: &str) -> Command {
    let Some((filename, size)) = arg.rsplit_once(char::is_whitespace) else {
        return Command::INVALID("usage: STOR <filename> <size>".into());
    };

    let filename = filename.trim();
    if filename.is_empty() {
        return Command::INVALID("STOR requires a filename".into());
    }

    match size.parse::<u64>() {
        Ok(size) => Command::STOR {
            filename: filename.to_string(),
            size,
        },
        Err(_) => Command::INVALID(format!("invalid size '{}'", size)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("QUIT\r\n"), Command::QUIT);
        assert_eq!(parse_command("noop"), Command::NOOP);
        assert_eq!(parse_command("LIST"), Command::LIST);
        assert_eq!(parse_command("PURGE"), Command::PURGE);
        assert_eq!(parse_command("HELO"), Command::UNKNOWN);
        assert_eq!(parse_command(""), Command::UNKNOWN);
    }

    #[test]
    fn test_retr() {
        assert_eq!(
            parse_command("RETR temas.json"),
            Command::RETR("temas.json".into())
        );
        assert!(matches!(parse_command("RETR"), Command::INVALID(_)));
    }

    #[test]
    fn test_stor() {
        assert_eq!(
            parse_command("STOR temas.json 42"),
            Command::STOR {
                filename: "temas.json".into(),
                size: 42
            }
        );
        assert_eq!(
            parse_command("stor plan de estudios.json 7"),
            Command::STOR {
                filename: "plan de estudios.json".into(),
                size: 7
            }
        );
    }

    #[test]
    fn test_stor_malformed() {
        assert!(matches!(parse_command("STOR"), Command::INVALID(_)));
        assert!(matches!(parse_command("STOR a.json"), Command::INVALID(_)));
        assert!(matches!(parse_command("STOR a.json -1"), Command::INVALID(_)));
        assert!(matches!(parse_command("STOR a.json big"), Command::INVALID(_)));
    }

    #[test]
    fn test_needs_storage() {
        assert!(Command::LIST.needs_storage());
        assert!(Command::RETR("a".into()).needs_storage());
        assert!(!Command::QUIT.needs_storage());
        assert!(!Command::UNKNOWN.needs_storage());
    }
}
