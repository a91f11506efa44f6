use crate::{Client, ClientError, resolve_path};

use std::path::Path;
use std::time::Duration;

#[test]
fn test_base_url_trailing_slash_trimmed() {
    let client = Client::new("http://localhost:50051/", Duration::from_secs(5)).unwrap();
    assert_eq!(client.base_url, "http://localhost:50051");
}

#[test]
fn test_base_url_no_trailing_slash() {
    let client = Client::new("http://localhost:50051", Duration::from_secs(5)).unwrap();
    assert_eq!(client.base_url, "http://localhost:50051");
}

#[test]
fn test_timeout_stored() {
    let client = Client::new("http://localhost:50051", Duration::from_secs(12)).unwrap();
    assert_eq!(client.timeout, Duration::from_secs(12));
}

#[test]
fn test_missing_path_resolves_to_current_dir() {
    let resolved = resolve_path(None).unwrap();

    assert!(resolved.is_absolute());
    assert_eq!(resolved, std::env::current_dir().unwrap());
}

#[test]
fn test_relative_path_made_absolute() {
    let resolved = resolve_path(Some(Path::new("servers/pr"))).unwrap();

    assert!(resolved.is_absolute());
    assert!(resolved.ends_with("servers/pr"));
}

#[test]
fn test_timeout_error_says_action_continues() {
    let error = ClientError::timeout(Duration::from_secs(5));

    let message = error.to_string();
    assert!(message.contains("within 5s"));
    assert!(message.contains("continues on the daemon"));
    assert!(error.code().is_none());
}

#[test]
fn test_api_error_exposes_code() {
    let error = ClientError::api_error("NOT_FOUND".into(), "server not registered".into());

    assert_eq!(error.code(), Some("NOT_FOUND"));
}
