//! Plugin API: the traits a host runtime exposes to VanillaBank plugins.
//!
//! This crate only describes the seam between a host and its plugins. It has
//! no dependency on the host, the network stack, or any async runtime.

// ─── Types ───────────────────────────────────────────────────────────────────

/// A connected player, as seen by plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginPlayer {
    pub name: String,
    pub uuid: String,
}

impl PluginPlayer {
    pub fn new(name: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: uuid.into(),
        }
    }
}

/// Whoever issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSender {
    Player(PluginPlayer),
    Console,
}

impl CommandSender {
    /// Display name of the sender (`CONSOLE` for the server console).
    pub fn name(&self) -> &str {
        match self {
            CommandSender::Player(player) => &player.name,
            CommandSender::Console => "CONSOLE",
        }
    }

    pub fn as_player(&self) -> Option<&PluginPlayer> {
        match self {
            CommandSender::Player(player) => Some(player),
            CommandSender::Console => None,
        }
    }
}

/// Log level for plugin logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

// ─── Plugin trait ────────────────────────────────────────────────────────────

/// Metadata about a plugin.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

/// Implemented by every plugin the host loads.
///
/// All callbacks run on the host's primary context. They must return promptly:
/// anything that waits on the network belongs on a worker, with results handed
/// back through a scheduled task.
pub trait Plugin: Send {
    /// Return plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Called when the plugin is loaded. Use `api` to register commands, schedule tasks.
    fn on_enable(&mut self, api: &mut dyn ServerApi);

    /// Called when the plugin is unloaded.
    fn on_disable(&mut self) {}

    /// Called when a scheduled task fires.
    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        let _ = (task_id, api);
    }

    /// Called when a plugin-registered command is executed.
    ///
    /// A returned message is shown to the sender immediately.
    fn on_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        api: &mut dyn ServerApi,
    ) -> Option<String> {
        let _ = (command, args, sender, api);
        None
    }

    /// Return a default config as JSON. If `Some`, the plugin gets a config file.
    fn default_config(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called with the loaded config (from `plugins/<name>/config.json`).
    fn load_config(&mut self, _config: serde_json::Value) {}
}

// ─── Server API ──────────────────────────────────────────────────────────────

/// Access to host state, passed to plugins during callbacks.
///
/// Read methods return data immediately. Write methods are deferred (applied
/// after the plugin callback returns).
pub trait ServerApi {
    // --- Players ---
    fn online_players(&self) -> Vec<PluginPlayer>;
    fn get_player(&self, name: &str) -> Option<PluginPlayer>;
    fn send_message(&mut self, player_name: &str, message: &str);

    // --- Server ---
    fn log(&self, level: LogLevel, message: &str);

    // --- Scheduler ---
    fn schedule_repeating(
        &mut self,
        plugin_name: &str,
        delay_ticks: u64,
        interval_ticks: u64,
        task_id: u32,
    );
    fn cancel_task(&mut self, plugin_name: &str, task_id: u32);

    // --- Commands ---
    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str);
}

// ─── Tests ───────────────────────────────────────────────────────────────────
