//! Console line parsing.
//!
//! ```text
//! stop                          shut the host down
//! list                          online players and registered commands
//! as <player> <command> [args]  run a command as a player (joins them if needed)
//! <command> [args]              run a command as the console
//! ```

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Stop,
    List,
    Run {
        /// `None` runs the command as the console.
        player: Option<String>,
        command: String,
        args: Vec<String>,
    },
}

pub fn parse(line: &str) -> Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Err("empty command".into());
    };
    let first = first.trim_start_matches('/');

    match first {
        "stop" => Ok(ConsoleCommand::Stop),
        "list" => Ok(ConsoleCommand::List),
        "as" => {
            let player = words
                .next()
                .ok_or_else(|| "usage: as <player> <command> [args...]".to_string())?;
            let command = words
                .next()
                .ok_or_else(|| "usage: as <player> <command> [args...]".to_string())?;
            Ok(ConsoleCommand::Run {
                player: Some(player.to_string()),
                command: command.trim_start_matches('/').to_string(),
                args: words.map(str::to_string).collect(),
            })
        }
        command => Ok(ConsoleCommand::Run {
            player: None,
            command: command.to_string(),
            args: words.map(str::to_string).collect(),
        }),
    }
}
