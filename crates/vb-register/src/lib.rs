//! VanillaBank `/register` plugin.
//!
//! A player runs `/register`; the plugin asks the bank's web API for a
//! registration link on a background worker and messages the result back on
//! a later scheduler tick, so the host's primary context never waits on the
//! network.

pub mod client;
pub mod config;
mod dto;
pub mod error;
pub mod messages;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use client::{RegistrationLinkClient, RegistrationResult};
pub use config::{ConfigError, RegisterConfig};
pub use error::{RegistrationError, WorkerError};
pub use worker::{CompletedRegistration, RegistrationWorker};

use tracing::{info, warn};
use vb_plugin_api::{CommandSender, LogLevel, Plugin, PluginInfo, ServerApi};

use crate::messages::{render, PLAYER_ONLY_MESSAGE};

pub const PLUGIN_NAME: &str = "VanillaBank";
pub const REGISTER_COMMAND: &str = "register";

/// Scheduler task that hands finished requests back to players.
const DELIVERY_TASK_ID: u32 = 1;

#[derive(Default)]
pub struct RegisterPlugin {
    config: RegisterConfig,
    worker: Option<RegistrationWorker>,
}

impl RegisterPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegisterConfig) -> Self {
        Self {
            config,
            worker: None,
        }
    }

    pub fn config(&self) -> &RegisterConfig {
        &self.config
    }

    fn start_worker(&self) -> Result<RegistrationWorker, WorkerError> {
        let client = RegistrationLinkClient::new(&self.config)?;
        Ok(RegistrationWorker::new(client, self.config.worker_threads())?)
    }
}

impl Plugin for RegisterPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: "Issues bank registration links to players".into(),
            author: "VanillaBank".into(),
        }
    }

    fn on_enable(&mut self, api: &mut dyn ServerApi) {
        api.register_command(
            REGISTER_COMMAND,
            "Get a link to register your bank account",
            PLUGIN_NAME,
        );

        match self.start_worker() {
            Ok(worker) => {
                self.worker = Some(worker);
                let interval = self.config.poll_interval_ticks();
                api.schedule_repeating(PLUGIN_NAME, interval, interval, DELIVERY_TASK_ID);
                api.log(
                    LogLevel::Info,
                    &format!(
                        "VanillaBank plugin has been enabled! (endpoint: {})",
                        self.config.endpoint
                    ),
                );
            }
            Err(e) => api.log(
                LogLevel::Error,
                &format!("VanillaBank could not start its registration worker: {e}"),
            ),
        }
    }

    fn on_disable(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
        info!("VanillaBank plugin has been disabled.");
    }

    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        if task_id != DELIVERY_TASK_ID {
            return;
        }
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        for done in worker.drain() {
            for line in render(&done.result) {
                api.send_message(&done.player.name, &line);
            }
        }
    }

    fn on_command(
        &mut self,
        command: &str,
        _args: &[String],
        sender: &CommandSender,
        api: &mut dyn ServerApi,
    ) -> Option<String> {
        if command != REGISTER_COMMAND {
            return None;
        }
        let Some(player) = sender.as_player() else {
            return Some(PLAYER_ONLY_MESSAGE.into());
        };

        match &self.worker {
            Some(worker) if worker.submit(player.clone()) => None,
            _ => {
                api.log(
                    LogLevel::Error,
                    &format!("Registration worker unavailable; cannot serve {}", player.name),
                );
                render(&RegistrationResult::internal_error())
                    .into_iter()
                    .next()
            }
        }
    }

    fn default_config(&self) -> Option<serde_json::Value> {
        Some(RegisterConfig::default().to_json())
    }

    fn load_config(&mut self, config: serde_json::Value) {
        match RegisterConfig::from_json(config) {
            Ok(config) => self.config = config,
            Err(e) => warn!("Invalid VanillaBank config, keeping current settings: {e}"),
        }
    }
}
