//! Plugin manager: loads, enables, and routes commands and ticks to plugins.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, error, info, warn};
use vb_plugin_api::{CommandSender, LogLevel, Plugin, PluginPlayer, ServerApi};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A scheduled task owned by a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub plugin_name: String,
    pub task_id: u32,
    pub remaining_ticks: u64,
    /// `None` = one-shot, `Some(n)` = repeating every `n` ticks.
    pub interval: Option<u64>,
}

/// Host state snapshot for plugin API reads (built before dispatch).
pub struct ServerSnapshot {
    pub players: Vec<PluginPlayer>,
}

/// Deferred side-effect requested by a plugin during a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    SendMessage {
        player_name: String,
        message: String,
    },
    RegisterCommand {
        name: String,
        description: String,
        plugin_name: String,
    },
    ScheduleTask {
        task: ScheduledTask,
    },
    CancelTask {
        plugin_name: String,
        task_id: u32,
    },
}

fn log_plugin_message(level: LogLevel, message: &str) {
    match level {
        LogLevel::Info => info!("[plugin] {message}"),
        LogLevel::Warn => warn!("[plugin] {message}"),
        LogLevel::Error => error!("[plugin] {message}"),
        LogLevel::Debug => debug!("[plugin] {message}"),
    }
}

// ─── ServerApiImpl ───────────────────────────────────────────────────────────

/// Implements `ServerApi` using a snapshot for reads and accumulating PendingActions for writes.
struct ServerApiImpl<'a> {
    snapshot: &'a ServerSnapshot,
    actions: Vec<PendingAction>,
}

impl<'a> ServerApiImpl<'a> {
    fn new(snapshot: &'a ServerSnapshot) -> Self {
        Self {
            snapshot,
            actions: Vec::new(),
        }
    }

    fn take_actions(self) -> Vec<PendingAction> {
        self.actions
    }
}

impl ServerApi for ServerApiImpl<'_> {
    fn online_players(&self) -> Vec<PluginPlayer> {
        self.snapshot.players.clone()
    }

    fn get_player(&self, name: &str) -> Option<PluginPlayer> {
        self.snapshot
            .players
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    fn send_message(&mut self, player_name: &str, message: &str) {
        self.actions.push(PendingAction::SendMessage {
            player_name: player_name.to_string(),
            message: message.to_string(),
        });
    }

    fn log(&self, level: LogLevel, message: &str) {
        log_plugin_message(level, message);
    }

    fn schedule_repeating(
        &mut self,
        plugin_name: &str,
        delay_ticks: u64,
        interval_ticks: u64,
        task_id: u32,
    ) {
        self.actions.push(PendingAction::ScheduleTask {
            task: ScheduledTask {
                plugin_name: plugin_name.to_string(),
                task_id,
                remaining_ticks: delay_ticks,
                interval: Some(interval_ticks.max(1)),
            },
        });
    }

    fn cancel_task(&mut self, plugin_name: &str, task_id: u32) {
        self.actions.push(PendingAction::CancelTask {
            plugin_name: plugin_name.to_string(),
            task_id,
        });
    }

    fn register_command(&mut self, name: &str, description: &str, plugin_name: &str) {
        self.actions.push(PendingAction::RegisterCommand {
            name: name.to_string(),
            description: description.to_string(),
            plugin_name: plugin_name.to_string(),
        });
    }
}

// ─── PluginManager ───────────────────────────────────────────────────────────

/// Manages all loaded plugins, their scheduled tasks, and command registrations.
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    tasks: Vec<ScheduledTask>,
    plugins_dir: PathBuf,
    /// Commands registered by plugins: command_name → (plugin_name, description).
    pub plugin_commands: HashMap<String, (String, String)>,
}

impl PluginManager {
    pub fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins: Vec::new(),
            tasks: Vec::new(),
            plugins_dir: plugins_dir.into(),
            plugin_commands: HashMap::new(),
        }
    }

    /// Register a plugin (call before enable_all).
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        info!("Registered plugin: {}", plugin.info().name);
        self.plugins.push(plugin);
    }

    /// Enable all registered plugins.
    pub fn enable_all(&mut self, snapshot: &ServerSnapshot) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        for plugin in &mut self.plugins {
            let mut api = ServerApiImpl::new(snapshot);
            plugin.on_enable(&mut api);
            all_actions.extend(api.take_actions());
        }
        self.apply_internal_actions(all_actions)
    }

    /// Disable all registered plugins.
    pub fn disable_all(&mut self) {
        for plugin in &mut self.plugins {
            plugin.on_disable();
        }
        self.tasks.clear();
    }

    pub fn has_command(&self, command: &str) -> bool {
        self.plugin_commands.contains_key(command)
    }

    /// Registered commands as `(name, description)`, sorted by name.
    pub fn commands(&self) -> Vec<(String, String)> {
        let mut commands: Vec<_> = self
            .plugin_commands
            .iter()
            .map(|(name, (_, description))| (name.clone(), description.clone()))
            .collect();
        commands.sort();
        commands
    }

    /// Tick the scheduler. Returns pending actions from fired tasks.
    pub fn tick_scheduler(&mut self, snapshot: &ServerSnapshot) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        let mut fired: Vec<(String, u32)> = Vec::new();

        for task in &mut self.tasks {
            if task.remaining_ticks > 0 {
                task.remaining_ticks -= 1;
            }
            if task.remaining_ticks == 0 {
                fired.push((task.plugin_name.clone(), task.task_id));
                if let Some(interval) = task.interval {
                    task.remaining_ticks = interval;
                }
            }
        }

        // Remove one-shot tasks that fired
        self.tasks
            .retain(|t| t.remaining_ticks > 0 || t.interval.is_some());

        for (plugin_name, task_id) in fired {
            if let Some(plugin) = self
                .plugins
                .iter_mut()
                .find(|p| p.info().name == plugin_name)
            {
                let mut api = ServerApiImpl::new(snapshot);
                plugin.on_task(task_id, &mut api);
                all_actions.extend(api.take_actions());
            }
        }

        self.apply_internal_actions(all_actions)
    }

    /// Handle a plugin-registered command. Returns (response_message, pending_actions).
    pub fn handle_command(
        &mut self,
        command: &str,
        args: &[String],
        sender: &CommandSender,
        snapshot: &ServerSnapshot,
    ) -> (Option<String>, Vec<PendingAction>) {
        let plugin_name = match self.plugin_commands.get(command) {
            Some((name, _)) => name.clone(),
            None => return (None, Vec::new()),
        };

        if let Some(plugin) = self
            .plugins
            .iter_mut()
            .find(|p| p.info().name == plugin_name)
        {
            let mut api = ServerApiImpl::new(snapshot);
            let response = plugin.on_command(command, args, sender, &mut api);
            let actions = api.take_actions();
            (response, self.apply_internal_actions(actions))
        } else {
            (None, Vec::new())
        }
    }

    /// Load configs for all plugins from `<plugins_dir>/<name>/config.json`,
    /// writing the plugin's default when the file does not exist yet.
    pub fn load_configs(&mut self) {
        for plugin in &mut self.plugins {
            let info = plugin.info();
            let Some(default_config) = plugin.default_config() else {
                continue;
            };
            let plugin_dir = self.plugins_dir.join(&info.name);
            let config_path = plugin_dir.join("config.json");

            let config = if config_path.exists() {
                match std::fs::read_to_string(&config_path) {
                    Ok(data) => match serde_json::from_str(&data) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!("Failed to parse config for {}: {e}", info.name);
                            default_config
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config for {}: {e}", info.name);
                        default_config
                    }
                }
            } else {
                if let Err(e) = std::fs::create_dir_all(&plugin_dir) {
                    warn!("Failed to create {}: {e}", plugin_dir.display());
                } else if let Ok(json) = serde_json::to_string_pretty(&default_config) {
                    if let Err(e) = std::fs::write(&config_path, json) {
                        warn!("Failed to write default config for {}: {e}", info.name);
                    }
                }
                default_config
            };

            plugin.load_config(config);
        }
    }

    /// Apply scheduler and command-table actions immediately; return the rest
    /// (player-facing actions) for the host to deliver.
    fn apply_internal_actions(&mut self, actions: Vec<PendingAction>) -> Vec<PendingAction> {
        let mut outward = Vec::new();
        for action in actions {
            match action {
                PendingAction::RegisterCommand {
                    name,
                    description,
                    plugin_name,
                } => {
                    debug!("Plugin {plugin_name} registered command /{name}");
                    self.plugin_commands.insert(name, (plugin_name, description));
                }
                PendingAction::ScheduleTask { task } => {
                    self.tasks.push(task);
                }
                PendingAction::CancelTask {
                    plugin_name,
                    task_id,
                } => {
                    self.tasks
                        .retain(|t| !(t.plugin_name == plugin_name && t.task_id == task_id));
                }
                other @ PendingAction::SendMessage { .. } => outward.push(other),
            }
        }
        outward
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
