use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Create the .svctl directory in a server installation
    Init {
        /// Server directory (defaults to the current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Put a server installation under supervision
    Register {
        /// Server directory (defaults to the current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Start a registered server
    Start {
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Stop a registered server
    Stop {
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Restart without counting against the restart budget
    Restart {
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Clear an errored server back to stopped
    Reset {
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Show the status of one server
    Status {
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// List all registered servers
    List,
}
