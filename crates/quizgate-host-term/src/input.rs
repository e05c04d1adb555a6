//! Line command parsing

use quizgate_host_api::UserCommand;
use quizgate_util::PanelId;
use thiserror::Error;

pub const HELP_TEXT: &str = "\
Commands:
  login <user> <password>   open a session
  open <panel>              open a panel (starts its countdown)
  close <panel>             close a panel
  toggle <panel>            open or close a panel
  activity                  register an interaction
  extend                    extend the session now
  logout                    end the session
  status                    show session details
  show                      re-check the session (page visible again)
  panels                    list panels
  help                      show this text
  quit                      exit
Answer prompts with y or n.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Result<UserCommand, ParseError>> {
    let mut words = line.split_whitespace();
    let verb = words.next()?;
    let args: Vec<&str> = words.collect();

    let panel = |usage: &'static str| match args.as_slice() {
        [id] => Ok(PanelId::new(*id)),
        _ => Err(ParseError::Usage(usage)),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "login" => match args.as_slice() {
            [username, password] => Ok(UserCommand::Login {
                username: username.to_string(),
                password: password.to_string(),
            }),
            // Password may be blank; the login form reports missing fields
            [username] => Ok(UserCommand::Login {
                username: username.to_string(),
                password: String::new(),
            }),
            _ => Err(ParseError::Usage("login <user> <password>")),
        },
        "open" => panel("open <panel>").map(UserCommand::Open),
        "close" => panel("close <panel>").map(UserCommand::Close),
        "toggle" => panel("toggle <panel>").map(UserCommand::Toggle),
        "activity" => Ok(UserCommand::Activity),
        "extend" => Ok(UserCommand::Extend),
        "logout" => Ok(UserCommand::Logout),
        "status" => Ok(UserCommand::Status),
        "show" => Ok(UserCommand::Show),
        "panels" => Ok(UserCommand::Panels),
        "help" | "?" => Ok(UserCommand::Help),
        "quit" | "exit" => Ok(UserCommand::Quit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    };

    Some(command)
}

/// Parse a yes/no answer
pub fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<UserCommand, ParseError> {
        parse_command(line).unwrap()
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_command("").is_none());
        assert!(parse_command("   \t").is_none());
    }

    #[test]
    fn login_with_credentials() {
        assert_eq!(
            parse("login alice secret"),
            Ok(UserCommand::Login {
                username: "alice".into(),
                password: "secret".into(),
            })
        );
        assert_eq!(
            parse("login alice"),
            Ok(UserCommand::Login {
                username: "alice".into(),
                password: String::new(),
            })
        );
        assert!(matches!(parse("login"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn panel_commands() {
        assert_eq!(parse("open history"), Ok(UserCommand::Open(PanelId::new("history"))));
        assert_eq!(parse("CLOSE history"), Ok(UserCommand::Close(PanelId::new("history"))));
        assert_eq!(parse("toggle  sport "), Ok(UserCommand::Toggle(PanelId::new("sport"))));
        assert!(matches!(parse("open"), Err(ParseError::Usage(_))));
        assert!(matches!(parse("open a b"), Err(ParseError::Usage(_))));
    }

    #[test]
    fn bare_commands() {
        assert_eq!(parse("activity"), Ok(UserCommand::Activity));
        assert_eq!(parse("extend"), Ok(UserCommand::Extend));
        assert_eq!(parse("logout"), Ok(UserCommand::Logout));
        assert_eq!(parse("status"), Ok(UserCommand::Status));
        assert_eq!(parse("show"), Ok(UserCommand::Show));
        assert_eq!(parse("panels"), Ok(UserCommand::Panels));
        assert_eq!(parse("?"), Ok(UserCommand::Help));
        assert_eq!(parse("exit"), Ok(UserCommand::Quit));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse("dance"),
            Err(ParseError::UnknownCommand("dance".into()))
        );
    }

    #[test]
    fn answers() {
        assert_eq!(parse_answer("y"), Some(true));
        assert_eq!(parse_answer(" YES "), Some(true));
        assert_eq!(parse_answer("n"), Some(false));
        assert_eq!(parse_answer("maybe"), None);
    }
}
