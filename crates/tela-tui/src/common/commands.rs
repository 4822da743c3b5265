//! Slash commands typed into the input line.

/// Static description of a slash command, used by `/help`.
pub struct CommandInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub description: &'static str,
}

/// All commands, in `/help` display order.
pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "new",
        aliases: &["clear"],
        usage: "/new",
        description: "Start a new conversation",
    },
    CommandInfo {
        name: "canvas",
        aliases: &["code"],
        usage: "/canvas <prompt>",
        description: "Generate code straight into the canvas panel",
    },
    CommandInfo {
        name: "copy",
        aliases: &[],
        usage: "/copy",
        description: "Copy the last assistant reply to the clipboard",
    },
    CommandInfo {
        name: "config",
        aliases: &[],
        usage: "/config",
        description: "Open the config file in the default editor",
    },
    CommandInfo {
        name: "help",
        aliases: &["?"],
        usage: "/help",
        description: "Show commands and key bindings",
    },
    CommandInfo {
        name: "quit",
        aliases: &["q", "exit"],
        usage: "/quit",
        description: "Exit",
    },
];

/// A parsed slash command ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    New,
    Canvas { prompt: String },
    Copy,
    Config,
    Help,
    Quit,
}

/// Parses submitted input as a slash command.
///
/// Returns `None` when the input is not a command at all (it does not
/// start with `/`), `Some(Err(message))` for a malformed or unknown
/// command where `message` is user-facing.
pub fn parse_slash_command(input: &str) -> Option<Result<SlashCommand, String>> {
    let trimmed = input.trim();
    let rest = trimmed.strip_prefix('/')?;

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let name = name.to_ascii_lowercase();

    let Some(info) = COMMANDS
        .iter()
        .find(|c| c.name == name || c.aliases.contains(&name.as_str()))
    else {
        return Some(Err(format!("Unknown command: /{name}. Try /help.")));
    };

    let command = match info.name {
        "new" => SlashCommand::New,
        "canvas" => {
            if args.is_empty() {
                return Some(Err(format!("Usage: {}", info.usage)));
            }
            SlashCommand::Canvas {
                prompt: args.to_string(),
            }
        }
        "copy" => SlashCommand::Copy,
        "config" => SlashCommand::Config,
        "help" => SlashCommand::Help,
        "quit" => SlashCommand::Quit,
        other => unreachable!("command table out of sync: {other}"),
    };
    Some(Ok(command))
}
