//! Interactive chat loop.

use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::{ChatSession, ImageSource, UserInput};
use crate::conversation::LogEntry;
use crate::error::Result;
use crate::types::Role;

const HELP: &str = "\
Type a message and press enter.
  /image <url> [message]   attach an image from a URL
  /file <path> [message]   attach a local image
  /new                     start a new session (clears history)
  /history                 show the conversation
  /quit                    exit";

/// One line of REPL input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Send(UserInput),
    NewSession,
    History,
    Help,
    Quit,
    Empty,
    /// A known command used wrongly; carries the usage text.
    Usage(&'static str),
    Unknown(String),
}

pub fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ReplCommand::Send(UserInput::text(line));
    };

    let (name, rest) = split_word(command);
    match name {
        "quit" | "exit" => ReplCommand::Quit,
        "new" => ReplCommand::NewSession,
        "history" => ReplCommand::History,
        "help" => ReplCommand::Help,
        "image" => match split_word(rest) {
            ("", _) => ReplCommand::Usage("/image <url> [message]"),
            (url, text) => ReplCommand::Send(
                with_text(text).with_image(ImageSource::Url(url.to_string())),
            ),
        },
        "file" => match split_word(rest) {
            ("", _) => ReplCommand::Usage("/file <path> [message]"),
            (path, text) => ReplCommand::Send(
                with_text(text).with_image(ImageSource::Path(PathBuf::from(path))),
            ),
        },
        other => ReplCommand::Unknown(format!("/{other}")),
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn with_text(text: &str) -> UserInput {
    if text.is_empty() {
        UserInput::default()
    } else {
        UserInput::text(text)
    }
}

/// Single-line rendering of a log entry.
pub fn render_entry(entry: &LogEntry) -> String {
    match entry.role {
        Role::User => match &entry.image {
            Some(image) if entry.text.is_empty() => format!("you: [image: {}]", image.label()),
            Some(image) => format!("you: {} [image: {}]", entry.text, image.label()),
            None => format!("you: {}", entry.text),
        },
        Role::Assistant if entry.is_error => format!("agent (error): {}", entry.text),
        Role::Assistant => format!("agent: {}", entry.text),
    }
}

/// Read lines from stdin until `/quit` or end of input.
pub async fn run(chat: &mut ChatSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!(
        "Connected to {} as session '{}'. /help for commands.",
        chat.config().base_url,
        chat.config().session_id
    );

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Usage(usage) => println!("usage: {usage}"),
            ReplCommand::Unknown(name) => println!("unknown command {name}; /help for commands"),
            ReplCommand::History => {
                for entry in chat.log().snapshot() {
                    println!("{}", render_entry(entry));
                }
            }
            ReplCommand::NewSession => match chat.reset_session().await {
                Ok(handle) => println!("Session '{}' ready, history cleared.", handle.key.session_id),
                Err(e) => println!("{}", e.user_message()),
            },
            ReplCommand::Send(input) => match chat.submit(input).await {
                Ok(turn) => {
                    if let Some(e) = &turn.image_failure {
                        println!("(image skipped: {e})");
                    }
                    if let Some(entry) = chat.log().last() {
                        println!("{}", render_entry(entry));
                    }
                }
                Err(e) => println!("{}", e.user_message()),
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ImageRef;

    #[test]
    fn plain_text_is_sent() {
        assert_eq!(parse_line("  hello there \n"), ReplCommand::Send(UserInput::text("hello there")));
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(parse_line("   "), ReplCommand::Empty);
    }

    #[test]
    fn image_command_with_and_without_text() {
        assert_eq!(
            parse_line("/image https://example.com/cat.png what breed?"),
            ReplCommand::Send(
                UserInput::text("what breed?")
                    .with_image(ImageSource::Url("https://example.com/cat.png".into()))
            )
        );
        assert_eq!(
            parse_line("/image https://example.com/cat.png"),
            ReplCommand::Send(
                UserInput::default().with_image(ImageSource::Url("https://example.com/cat.png".into()))
            )
        );
        assert_eq!(parse_line("/image"), ReplCommand::Usage("/image <url> [message]"));
    }

    #[test]
    fn file_command_uses_path() {
        assert_eq!(
            parse_line("/file ./shots/a.png describe"),
            ReplCommand::Send(
                UserInput::text("describe").with_image(ImageSource::Path("./shots/a.png".into()))
            )
        );
    }

    #[test]
    fn session_and_exit_commands() {
        assert_eq!(parse_line("/new"), ReplCommand::NewSession);
        assert_eq!(parse_line("/history"), ReplCommand::History);
        assert_eq!(parse_line("/exit"), ReplCommand::Quit);
        assert_eq!(parse_line("/bogus x"), ReplCommand::Unknown("/bogus".into()));
    }

    #[test]
    fn entries_render_by_role() {
        let image = Some(ImageRef::Url {
            url: "https://example.com/cat.png".into(),
        });
        assert_eq!(
            render_entry(&LogEntry::user("look", image.clone())),
            "you: look [image: https://example.com/cat.png]"
        );
        assert_eq!(
            render_entry(&LogEntry::user("", image)),
            "you: [image: https://example.com/cat.png]"
        );
        assert_eq!(render_entry(&LogEntry::assistant("hi")), "agent: hi");
        assert_eq!(
            render_entry(&LogEntry::failure("Connection error")),
            "agent (error): Connection error"
        );
    }
}
