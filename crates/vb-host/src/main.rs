mod config;
mod console;
mod host;
mod plugin_manager;

use std::time::Duration;

use config::HostConfig;
use host::{ChatLine, Host};
use plugin_manager::PluginManager;
use tokio::io::AsyncBufReadExt;
use tracing::info;
use vb_register::RegisterPlugin;

fn print_chat(lines: Vec<ChatLine>) {
    for line in lines {
        info!(target: "chat", "-> {}: {}", line.player, line.message);
    }
}

#[tokio::main]
async fn main() {
    let config = match HostConfig::load_or_default("host.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load host.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("VanillaBank host v{} starting", env!("CARGO_PKG_VERSION"));
    info!("Plugins directory: {}", config.host.plugins_dir);
    info!("Tick interval: {}ms", config.host.tick_interval_ms);

    let mut manager = PluginManager::new(&config.host.plugins_dir);
    manager.register(Box::new(RegisterPlugin::new()));
    let mut host = Host::new(manager);
    print_chat(host.start());

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    info!("Ready. Try `as Steve register`, `list`, or `stop`.");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut tick_interval =
        tokio::time::interval(Duration::from_millis(config.host.tick_interval_ms.max(1)));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                print_chat(host.tick());
            }
            Some(line) = console_rx.recv() => {
                let outcome = host.handle_console_line(&line);
                for reply in outcome.console {
                    info!("{reply}");
                }
                print_chat(outcome.chat);
                if outcome.stop {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    host.shutdown();
    info!("Host shut down after {} ticks.", host.current_tick());
}
