//! svctl - control the game-server supervision daemon
//!
//! # Examples
//!
//! ```bash
//! # Supervise the server installed in the current directory
//! svctl init
//! svctl register
//! svctl start --pretty
//!
//! # Everything the daemon knows about
//! svctl list
//! ```

use sv_cli::{Cli, CliClientResult, Client, ClientError, Commands, init_instance, resolve_path};

use sv_config::{ClientConfig, Config, DaemonFileInfo};

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Local setup, no daemon needed
    if let Commands::Init { path } = &cli.command {
        let result = path_arg(path.clone()).and_then(|path| init_instance(&path));
        return print_result(result, cli.pretty);
    }

    // Discover daemon URL: explicit flag > daemon file > error
    let server_url = match cli.server {
        Some(url) => url,
        None => discover_daemon_url(),
    };

    let client = match Client::new(&server_url, client_timeout(cli.timeout_secs)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&client, cli.command).await;
    print_result(result, cli.pretty)
}

fn print_result(result: CliClientResult<Value>, pretty: bool) -> ExitCode {
    match result {
        Ok(value) => {
            let output = if pretty {
                serde_json::to_string_pretty(&value)
            } else {
                serde_json::to_string(&value)
            };

            match output {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error serializing response: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &Client, command: Commands) -> CliClientResult<Value> {
    match command {
        Commands::Init { path } => init_instance(&path_arg(path)?),
        Commands::Register { path } => client.register(&path_arg(path)?).await,
        Commands::Start { path } => client.start(&path_arg(path)?).await,
        Commands::Stop { path } => client.stop(&path_arg(path)?).await,
        Commands::Restart { path } => client.restart(&path_arg(path)?).await,
        Commands::Reset { path } => client.reset(&path_arg(path)?).await,
        Commands::Status { path } => client.status(&path_arg(path)?).await,
        Commands::List => client.list().await,
    }
}

fn path_arg(path: Option<PathBuf>) -> Result<PathBuf, ClientError> {
    resolve_path(path.as_deref())
}

/// `--timeout-secs`, else `client.timeout_secs` from the config file.
fn client_timeout(flag: Option<u64>) -> Duration {
    if let Some(secs) = flag {
        return Duration::from_secs(secs);
    }

    match Config::load() {
        Ok(config) => config.client.timeout(),
        Err(e) => {
            eprintln!("Warning: using default timeout, config not loaded: {}", e);
            ClientConfig::default().timeout()
        }
    }
}

/// Discover the daemon URL from the discovery file.
///
/// The daemon writes `daemon.json` after binding, containing its PID,
/// port, and host. A file left by a dead daemon is removed and ignored.
fn discover_daemon_url() -> String {
    let daemon_path = || {
        DaemonFileInfo::path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "daemon.json".to_string())
    };

    match DaemonFileInfo::read_live() {
        Ok(Some(info)) => info.url(),
        Ok(None) => {
            eprintln!("Error: No running svctl daemon found.");
            eprintln!();
            eprintln!("Checked: {}", daemon_path());
            eprintln!();
            eprintln!("Start the daemon first:");
            eprintln!("  svctl-daemon");
            eprintln!();
            eprintln!("Or specify a daemon URL explicitly:");
            eprintln!("  svctl --server http://127.0.0.1:50051 <command>");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error reading daemon file ({}): {}", daemon_path(), e);
            eprintln!();
            eprintln!("Specify a daemon URL explicitly:");
            eprintln!("  svctl --server http://127.0.0.1:50051 <command>");
            std::process::exit(1);
        }
    }
}
