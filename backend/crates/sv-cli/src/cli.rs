use crate::commands::Commands;

use clap::Parser;

#[derive(Parser)]
#[command(name = "svctl")]
#[command(about = "Control the svctl game-server supervision daemon")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Daemon URL (auto-discovered from daemon.json, or specify manually)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Seconds to wait for the daemon (defaults to client.timeout_secs)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}
