// ABOUTME: Entry point for the powerlimit settings front-end.
// ABOUTME: Command-line switch for reading and toggling the daemon's power-limit setting.

mod daemon_client;

use clap::{Parser, Subcommand};
use powerlimit_ipc::BusKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "powerlimit-ctl", about = "Read or toggle the kernel power limit", version)]
struct Cli {
    /// Talk to a daemon on the session bus instead of the system bus.
    #[arg(long)]
    session: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Show the switch, node path and last error.
    Status,
    /// Turn the power limit on.
    Enable,
    /// Turn the power limit off.
    Disable,
    /// Flip the power limit.
    Toggle,
    /// Make the daemon re-read the node.
    Refresh,
    /// Print every change of the switch until interrupted.
    Watch,
    /// Ask the daemon to exit.
    Quit,
}

impl Cli {
    fn bus(&self) -> BusKind {
        if self.session { BusKind::Session } else { BusKind::System }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match daemon_client::run(cli.bus(), cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_system_bus() {
        let cli = Cli::try_parse_from(["powerlimit-ctl", "status"]).unwrap();
        assert_eq!(cli.bus(), BusKind::System);
        assert_eq!(cli.command, Command::Status);
    }

    #[test]
    fn session_flag_selects_session_bus() {
        let cli = Cli::try_parse_from(["powerlimit-ctl", "--session", "enable"]).unwrap();
        assert_eq!(cli.bus(), BusKind::Session);
        assert_eq!(cli.command, Command::Enable);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["powerlimit-ctl"]).is_err());
        assert!(Cli::try_parse_from(["powerlimit-ctl", "maybe"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
