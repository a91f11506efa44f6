use crate::tests::{EnvGuard, setup_config_dir};
use crate::{Config, UpdateCheckPolicy};

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok};
use serial_test::serial;

// =========================================================================
// Loading
// =========================================================================

#[test]
#[serial]
fn given_no_config_file_when_load_then_defaults() {
    // Given
    let (_temp, _guard) = setup_config_dir();

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.daemon.host.as_str(), eq("127.0.0.1"));
    assert_that!(config.daemon.port, eq(50051));
    assert_that!(config.supervisor.max_restarts, eq(5));
    assert_that!(config.supervisor.restart_window_secs, eq(60));
    assert_that!(config.supervisor.stop_grace_ms, eq(300));
    assert_that!(config.supervisor.render_interval_secs, eq(60));
    assert_that!(
        config.supervisor.update_check,
        eq(UpdateCheckPolicy::EveryRestart)
    );
    assert_that!(config.validate(), ok(anything()));
}

#[test]
#[serial]
fn given_missing_config_dir_when_load_then_directory_created() {
    // Given
    let (temp, _guard) = setup_config_dir();
    let nested = temp.path().join("nested").join("svctl");
    let _dir = EnvGuard::set(crate::CONFIG_DIR_ENV, nested.to_str().unwrap());

    // When
    let result = Config::load();

    // Then
    assert_that!(result, ok(anything()));
    assert_that!(nested.is_dir(), eq(true));
}

#[test]
#[serial]
fn given_config_file_when_load_then_file_values_used() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(
        temp.path().join("config.toml"),
        r#"
[daemon]
port = 6000

[supervisor]
max_restarts = 3
update_check = "first_in_streak"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.daemon.port, eq(6000));
    assert_that!(config.daemon.host.as_str(), eq("127.0.0.1"));
    assert_that!(config.supervisor.max_restarts, eq(3));
    assert_that!(
        config.supervisor.update_check,
        eq(UpdateCheckPolicy::FirstInStreak)
    );
    assert_that!(config.logging.level.as_directive(), eq("debug"));
}

#[test]
#[serial]
fn given_malformed_toml_when_load_then_error() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(temp.path().join("config.toml"), "[daemon\nport = ").unwrap();

    // When
    let result = Config::load();

    // Then
    assert_that!(result, err(anything()));
}

// =========================================================================
// Environment overrides
// =========================================================================

#[test]
#[serial]
fn given_env_overrides_when_load_then_env_wins_over_file() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(temp.path().join("config.toml"), "[daemon]\nport = 6000\n").unwrap();
    let _port = EnvGuard::set("SVCTL_DAEMON_PORT", "7000");
    let _policy = EnvGuard::set("SVCTL_SUPERVISOR_UPDATE_CHECK", "never");
    let _ansi = EnvGuard::set("SVCTL_LOG_ANSI", "0");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.daemon.port, eq(7000));
    assert_that!(config.supervisor.update_check, eq(UpdateCheckPolicy::Never));
    assert_that!(config.logging.ansi, eq(false));
}

#[test]
#[serial]
fn given_unparseable_env_value_when_load_then_default_kept() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _port = EnvGuard::set("SVCTL_DAEMON_PORT", "not-a-port");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.daemon.port, eq(50051));
}

// =========================================================================
// Validation
// =========================================================================

#[test]
#[serial]
fn given_empty_host_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _host = EnvGuard::set("SVCTL_DAEMON_HOST", " ");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.validate(), err(anything()));
}

#[test]
#[serial]
fn given_log_dir_escaping_config_dir_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _dir = EnvGuard::set("SVCTL_LOG_DIR", "../elsewhere");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.validate(), err(anything()));
}

#[test]
#[serial]
fn given_config_dir_env_when_state_path_then_inside_config_dir() {
    // Given
    let (temp, _guard) = setup_config_dir();

    // When
    let path = Config::state_path().unwrap();

    // Then
    assert_that!(path, eq(&temp.path().join("state.json")));
}

#[test]
fn given_default_config_when_bind_addr_then_host_and_port() {
    let config = Config::default();

    assert_that!(config.bind_addr().as_str(), eq("127.0.0.1:50051"));
}
