// ABOUTME: Connects to the powerlimit daemon over D-Bus and carries out one front-end command.
// ABOUTME: Prints results to stdout; returns false when the daemon rejects a change.

use futures_util::StreamExt;
use powerlimit_ipc::{BusKind, PowerLimitProxy, PowerLimitStatus, on_off};

use crate::Command;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Run a single command against the daemon. Ok(false) means the daemon
/// answered but refused the change.
pub async fn run(bus: BusKind, command: Command) -> Result<bool, DynError> {
    let connection = bus.connect().await?;
    let proxy = PowerLimitProxy::new(&connection).await?;
    tracing::debug!("Connected to {} on the {bus} bus", powerlimit_ipc::BUS_NAME);

    match command {
        Command::Status => {
            let status: PowerLimitStatus = serde_json::from_str(&proxy.describe().await?)?;
            print!("{}", format_status(&status));
            Ok(true)
        }
        Command::Enable => set(&proxy, true).await,
        Command::Disable => set(&proxy, false).await,
        Command::Toggle => {
            let current = proxy.limited().await?;
            set(&proxy, !current).await
        }
        Command::Refresh => {
            let limited = proxy.refresh().await?;
            println!("limited: {}", on_off(limited));
            Ok(true)
        }
        Command::Watch => {
            watch(&proxy).await?;
            Ok(true)
        }
        Command::Quit => {
            proxy.quit().await?;
            Ok(true)
        }
    }
}

async fn set(proxy: &PowerLimitProxy<'_>, limited: bool) -> Result<bool, DynError> {
    if proxy.set_limited(limited).await? {
        println!("limited: {}", on_off(limited));
        return Ok(true);
    }
    let last_error = proxy.last_error().await?;
    tracing::warn!("Daemon rejected power limit {}: {last_error}", on_off(limited));
    println!("rejected: {last_error}");
    Ok(false)
}

async fn watch(proxy: &PowerLimitProxy<'_>) -> Result<(), DynError> {
    println!("limited: {}", on_off(proxy.limited().await?));
    let mut limited_stream = proxy.receive_limited_changed().await;
    let mut error_stream = proxy.receive_last_error_changed().await;

    loop {
        tokio::select! {
            change = limited_stream.next() => {
                let Some(change) = change else {
                    return Err("Daemon went away".into());
                };
                if let Ok(val) = change.get().await {
                    println!("limited: {}", on_off(val));
                }
            }
            change = error_stream.next() => {
                let Some(change) = change else {
                    return Err("Daemon went away".into());
                };
                if let Ok(val) = change.get().await {
                    if !val.is_empty() {
                        println!("error: {val}");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn format_status(status: &PowerLimitStatus) -> String {
    let mut out = format!("limited: {}\n", status.limited_label());
    out.push_str(&format!("node: {}", status.node_path));
    if !status.node_present {
        out.push_str(" (missing)");
    }
    out.push('\n');
    if !status.last_error.is_empty() {
        out.push_str(&format!("last error: {}\n", status.last_error));
    }
    out
}
