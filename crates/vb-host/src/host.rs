//! The host's primary context: owns players, the plugin manager, and the tick
//! counter. Everything here runs on one task and never waits on plugin I/O.

use tracing::{debug, info};
use vb_plugin_api::{CommandSender, PluginPlayer};

use crate::console::{self, ConsoleCommand};
use crate::plugin_manager::{PendingAction, PluginManager, ServerSnapshot};

/// A chat message delivered to a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub player: String,
    pub message: String,
}

/// What handling one console line produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConsoleOutcome {
    /// Lines for the console itself.
    pub console: Vec<String>,
    pub chat: Vec<ChatLine>,
    pub stop: bool,
}

pub struct Host {
    manager: PluginManager,
    players: Vec<PluginPlayer>,
    current_tick: u64,
}

impl Host {
    pub fn new(manager: PluginManager) -> Self {
        Self {
            manager,
            players: Vec::new(),
            current_tick: 0,
        }
    }

    /// Load plugin configs and enable every plugin.
    pub fn start(&mut self) -> Vec<ChatLine> {
        self.manager.load_configs();
        let snapshot = self.snapshot();
        let actions = self.manager.enable_all(&snapshot);
        self.deliver(actions)
    }

    pub fn shutdown(&mut self) {
        self.manager.disable_all();
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn tick(&mut self) -> Vec<ChatLine> {
        self.current_tick += 1;
        let snapshot = self.snapshot();
        let actions = self.manager.tick_scheduler(&snapshot);
        self.deliver(actions)
    }

    pub fn handle_console_line(&mut self, line: &str) -> ConsoleOutcome {
        let mut outcome = ConsoleOutcome::default();
        match console::parse(line) {
            Err(e) => outcome.console.push(e),
            Ok(ConsoleCommand::Stop) => outcome.stop = true,
            Ok(ConsoleCommand::List) => {
                let names: Vec<&str> = self.players.iter().map(|p| p.name.as_str()).collect();
                outcome
                    .console
                    .push(format!("Online ({}): {}", names.len(), names.join(", ")));
                for (name, description) in self.manager.commands() {
                    outcome.console.push(format!("/{name} - {description}"));
                }
            }
            Ok(ConsoleCommand::Run {
                player,
                command,
                args,
            }) => {
                if !self.manager.has_command(&command) {
                    outcome.console.push(format!("Unknown command: /{command}"));
                    return outcome;
                }
                let sender = match player {
                    Some(name) => CommandSender::Player(self.join(&name)),
                    None => CommandSender::Console,
                };
                let snapshot = self.snapshot();
                let (response, actions) =
                    self.manager
                        .handle_command(&command, &args, &sender, &snapshot);
                if let Some(response) = response {
                    match &sender {
                        CommandSender::Player(player) => outcome.chat.push(ChatLine {
                            player: player.name.clone(),
                            message: response,
                        }),
                        CommandSender::Console => outcome.console.push(response),
                    }
                }
                outcome.chat.extend(self.deliver(actions));
            }
        }
        outcome
    }

    /// Bring `name` online if they are not already, and return them.
    fn join(&mut self, name: &str) -> PluginPlayer {
        if let Some(player) = self.players.iter().find(|p| p.name == name) {
            return player.clone();
        }
        let player = PluginPlayer::new(name, offline_uuid(name));
        info!("{name} joined the game");
        self.players.push(player.clone());
        player
    }

    fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            players: self.players.clone(),
        }
    }

    fn deliver(&self, actions: Vec<PendingAction>) -> Vec<ChatLine> {
        let mut lines = Vec::new();
        for action in actions {
            if let PendingAction::SendMessage {
                player_name,
                message,
            } = action
            {
                if self.players.iter().any(|p| p.name == player_name) {
                    lines.push(ChatLine {
                        player: player_name,
                        message,
                    });
                } else {
                    debug!("Dropping message for offline player {player_name}");
                }
            }
        }
        lines
    }
}

/// Stable stand-in UUID for players created from the console.
fn offline_uuid(name: &str) -> String {
    let hash = name
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
    format!(
        "00000000-0000-3000-8000-{:012x}",
        hash & 0xffff_ffff_ffff
    )
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use vb_register::RegisterPlugin;

    /// An endpoint on a port nothing listens on. Duplicates the helper in
    /// vb-register's test support, which is `cfg(test)` and not exported.
    fn unreachable_endpoint() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/api/generateRegToken")
    }

    fn write_plugin_config(dir: &std::path::Path, endpoint: &str) {
        let plugin_dir = dir.join(vb_register::PLUGIN_NAME);
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(
            plugin_dir.join("config.json"),
            serde_json::json!({ "endpoint": endpoint }).to_string(),
        )
        .unwrap();
    }

    fn host_in(dir: &std::path::Path) -> Host {
        let mut manager = PluginManager::new(dir);
        manager.register(Box::new(RegisterPlugin::new()));
        let mut host = Host::new(manager);
        host.start();
        host
    }

    /// Host whose plugin points at a dead endpoint, so nothing leaves the machine.
    fn started_host(dir: &std::path::Path) -> Host {
        write_plugin_config(dir, &unreachable_endpoint());
        host_in(dir)
    }

    #[test]
    fn console_cannot_register() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = started_host(dir.path());

        let outcome = host.handle_console_line("register");
        assert_eq!(
            outcome.console,
            vec!["This command can only be run by a player.".to_string()]
        );
        assert!(outcome.chat.is_empty());
    }

    #[test]
    fn player_registration_failure_arrives_on_tick() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = started_host(dir.path());

        let outcome = host.handle_console_line("as Steve register");
        assert!(outcome.console.is_empty());
        assert!(outcome.chat.is_empty());

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut chat = Vec::new();
        while chat.is_empty() && Instant::now() < deadline {
            chat.extend(host.tick());
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(
            chat,
            vec![ChatLine {
                player: "Steve".into(),
                message: "§c[VB] An internal error occurred while trying to register.".into(),
            }]
        );
        host.shutdown();
    }

    #[test]
    fn list_and_unknown_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = started_host(dir.path());

        let outcome = host.handle_console_line("as Alex list");
        assert_eq!(outcome.console, vec!["Unknown command: /list".to_string()]);

        host.handle_console_line("as Alex register");
        let outcome = host.handle_console_line("list");
        assert_eq!(outcome.console[0], "Online (1): Alex");
        assert!(outcome.console[1].starts_with("/register - "));

        assert!(host.handle_console_line("stop").stop);
        assert_eq!(
            host.handle_console_line("balance").console,
            vec!["Unknown command: /balance".to_string()]
        );
    }

    #[test]
    fn start_writes_default_plugin_config() {
        let dir = tempfile::tempdir().unwrap();
        let _host = host_in(dir.path());
        let path = dir.path().join(vb_register::PLUGIN_NAME).join("config.json");
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["endpoint"], vb_register::config::DEFAULT_ENDPOINT);
    }

    #[test]
    fn ticks_advance() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = started_host(dir.path());
        host.tick();
        host.tick();
        assert_eq!(host.current_tick(), 2);
    }

    #[test]
    fn offline_uuid_is_stable() {
        assert_eq!(offline_uuid("Steve"), offline_uuid("Steve"));
        assert_ne!(offline_uuid("Steve"), offline_uuid("Alex"));
        assert_eq!(offline_uuid("Steve").len(), 36);
    }
}
