use crate::{Cli, Commands};

use std::path::PathBuf;

use clap::Parser;

#[test]
fn test_start_with_path() {
    let cli = Cli::try_parse_from(["svctl", "start", "--path", "/srv/pr"]).unwrap();

    match cli.command {
        Commands::Start { path } => assert_eq!(path, Some(PathBuf::from("/srv/pr"))),
        _ => panic!("expected start"),
    }
}

#[test]
fn test_path_is_optional() {
    let cli = Cli::try_parse_from(["svctl", "register"]).unwrap();

    assert!(matches!(cli.command, Commands::Register { path: None }));
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "svctl",
        "list",
        "--server",
        "http://127.0.0.1:9000",
        "--timeout-secs",
        "30",
        "--pretty",
    ])
    .unwrap();

    assert!(matches!(cli.command, Commands::List));
    assert_eq!(cli.server.as_deref(), Some("http://127.0.0.1:9000"));
    assert_eq!(cli.timeout_secs, Some(30));
    assert!(cli.pretty);
}

#[test]
fn test_init_with_path() {
    let cli = Cli::try_parse_from(["svctl", "init", "--path", "/srv/pr"]).unwrap();

    match cli.command {
        Commands::Init { path } => assert_eq!(path, Some(PathBuf::from("/srv/pr"))),
        _ => panic!("expected init"),
    }
}

#[test]
fn test_unknown_subcommand_rejected() {
    assert!(Cli::try_parse_from(["svctl", "deploy"]).is_err());
}
