/// A chat command the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Connect,
    /// `/code <authorization code>`; the argument may be empty.
    Code(String),
    Analyze,
    Score,
    Disconnect,
    Unknown(String),
}

impl Command {
    /// Parses a message text. Returns `None` for plain text that is not a command.
    ///
    /// Accepts the `/cmd@BotName` form Telegram uses in group chats.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let (head, argument) = match rest.split_once(char::is_whitespace) {
            Some((head, argument)) => (head, argument.trim()),
            None => (rest, ""),
        };
        let name = head.split_once('@').map_or(head, |(name, _bot)| name);

        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "connect" => Self::Connect,
            "code" => Self::Code(argument.to_owned()),
            "analyze" => Self::Analyze,
            "score" => Self::Score,
            "disconnect" => Self::Disconnect,
            other => Self::Unknown(other.to_owned()),
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/analyze"), Some(Command::Analyze));
        assert_eq!(Command::parse("  /score  "), Some(Command::Score));
        assert_eq!(Command::parse("/Disconnect"), Some(Command::Disconnect));
    }

    #[test]
    fn strips_bot_mention() {
        assert_eq!(
            Command::parse("/analyze@PerfilBot"),
            Some(Command::Analyze)
        );
        assert_eq!(
            Command::parse("/code@PerfilBot 4/0Abc"),
            Some(Command::Code("4/0Abc".to_string()))
        );
    }

    #[test]
    fn code_keeps_argument() {
        assert_eq!(
            Command::parse("/code   4/0AX4XfWh-abc_123  "),
            Some(Command::Code("4/0AX4XfWh-abc_123".to_string()))
        );
        assert_eq!(Command::parse("/code"), Some(Command::Code(String::new())));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("hola"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            Command::parse("/reset now"),
            Some(Command::Unknown("reset".to_string()))
        );
    }
}
