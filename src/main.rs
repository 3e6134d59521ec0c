// ABOUTME: Entry point for the powerlimit daemon.
// ABOUTME: Presets the power-limit switch from the kernel node and serves it over D-Bus until shut down.

mod config;
mod dbus;
mod node;
mod persistence;
mod preference;

use config::Config;
use dbus::{DaemonInterface, SharedState};
use node::PowerLimitNode;
use preference::PowerLimitSettings;
use tracing_subscriber::EnvFilter;

type DynError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(signal) => signal,
        Err(e) => {
            tracing::error!("Failed to register SIGTERM handler: {e}");
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = run() => {
            if let Err(e) = result {
                tracing::error!("Fatal: {e}");
                std::process::exit(1);
            }
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT, shutting down");
        }
    }
}

async fn run() -> Result<(), DynError> {
    let config = Config::load()?;
    tracing::info!("Configuration loaded");

    let node = PowerLimitNode::new(config.node_path());
    if !node.exists() {
        tracing::warn!("{} does not exist, power limit will read as off", node.path().display());
    }

    if config.persistence.restore_on_start {
        restore_saved_state(&config, &node);
    }

    let settings = PowerLimitSettings::create(node);
    tracing::info!("Power limit is {}", powerlimit_ipc::on_off(settings.is_checked()));

    let shared = SharedState::new(settings, config.clone());

    let connection = config.bus.kind.connect().await?;
    connection
        .object_server()
        .at(powerlimit_ipc::OBJECT_PATH, DaemonInterface::new(shared.clone()))
        .await?;
    connection.request_name(powerlimit_ipc::BUS_NAME).await?;
    tracing::info!(
        "D-Bus interface registered at {} on the {} bus",
        powerlimit_ipc::BUS_NAME,
        config.bus.kind
    );

    shared.shutdown_requested().await;
    tracing::info!("Shutdown requested via D-Bus");
    Ok(())
}

/// Write the last accepted value back into the node. Kernel nodes come back
/// at their built-in default after a reboot.
fn restore_saved_state(config: &Config, node: &PowerLimitNode) -> bool {
    let Some(limited) = persistence::load_saved_state(&config.state_path()) else {
        return false;
    };
    if node.is_currently_limited() == limited {
        tracing::debug!("Node already matches saved state");
        return true;
    }
    let restored = node.on_toggle(limited);
    if restored {
        tracing::info!("Restored power limit {}", powerlimit_ipc::on_off(limited));
    } else {
        tracing::warn!("Could not restore saved power limit state");
    }
    restored
}
