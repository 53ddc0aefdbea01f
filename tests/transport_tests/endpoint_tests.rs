//! Tests for Endpoint
//!
//! These tests verify:
//! - Environment expansion of socket templates
//! - Distinct errors for missing paths and non-socket files
//! - Configuration defaults and validation

use std::collections::HashMap;
use std::fs;
use std::os::unix::net::UnixListener;

use gpgagent::config::DEFAULT_SOCKET_TEMPLATE;
use gpgagent::transport::{expand_env, Endpoint};
use gpgagent::{AgentError, Config};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

// =============================================================================
// Expansion Tests
// =============================================================================

#[test]
fn test_expand_default_template() {
    let lookup = lookup_from(&[("HOME", "/home/alice")]);
    assert_eq!(
        expand_env(DEFAULT_SOCKET_TEMPLATE, lookup),
        "/home/alice/.gnupg/S.gpg-agent"
    );
}

#[test]
fn test_expand_braced() {
    let lookup = lookup_from(&[("XDG_RUNTIME_DIR", "/run/user/1000")]);
    assert_eq!(
        expand_env("${XDG_RUNTIME_DIR}/gnupg/S.gpg-agent", lookup),
        "/run/user/1000/gnupg/S.gpg-agent"
    );
}

#[test]
fn test_expand_unset_is_empty() {
    let lookup = lookup_from(&[]);
    assert_eq!(expand_env("$NOPE/x", &lookup), "/x");
    assert_eq!(expand_env("${NOPE}/x", &lookup), "/x");
}

#[test]
fn test_expand_takes_longest_name() {
    let lookup = lookup_from(&[("HOME", "/h"), ("HOME_DIR", "/hd")]);
    assert_eq!(expand_env("$HOME_DIR/a", &lookup), "/hd/a");
    assert_eq!(expand_env("$HOME.d/a", &lookup), "/h.d/a");
}

#[test]
fn test_expand_keeps_lone_dollar() {
    let lookup = lookup_from(&[("HOME", "/h")]);
    assert_eq!(expand_env("a$ b", &lookup), "a$ b");
    assert_eq!(expand_env("cost$", &lookup), "cost$");
    assert_eq!(expand_env("${HOME", &lookup), "${HOME");
    assert_eq!(expand_env("${}", &lookup), "${}");
}

#[test]
fn test_expand_without_references() {
    let lookup = lookup_from(&[]);
    assert_eq!(expand_env("/tmp/plain", lookup), "/tmp/plain");
}

#[test]
fn test_resolve_with() {
    let endpoint = Endpoint::resolve_with("$D/S.gpg-agent", lookup_from(&[("D", "/sock")]));
    assert_eq!(endpoint.path().to_str(), Some("/sock/S.gpg-agent"));
    assert_eq!(endpoint.to_string(), "/sock/S.gpg-agent");
}

// =============================================================================
// Verification Tests
// =============================================================================

#[test]
fn test_verify_missing_path() {
    let endpoint = Endpoint::from_path("/no/such/file");
    match endpoint.verify() {
        Err(AgentError::EndpointNotFound { path }) => {
            assert_eq!(path.to_str(), Some("/no/such/file"));
        }
        other => panic!("Expected EndpointNotFound, got {:?}", other),
    }
}

#[test]
fn test_verify_regular_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("client_test.go");
    fs::write(&file, b"package gpgagent").unwrap();

    let err = Endpoint::from_path(&file).verify().unwrap_err();
    assert!(matches!(err, AgentError::EndpointNotASocket { .. }));
    assert_eq!(
        err.to_string(),
        format!("file \"{}\" is not a socket", file.display())
    );
}

#[test]
fn test_verify_directory() {
    let temp_dir = TempDir::new().unwrap();
    let err = Endpoint::from_path(temp_dir.path()).verify().unwrap_err();
    assert!(matches!(err, AgentError::EndpointNotASocket { .. }));
}

#[test]
fn test_verify_socket() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("S.gpg-agent");
    let _listener = UnixListener::bind(&path).unwrap();

    Endpoint::from_path(&path).verify().unwrap();
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.socket_path, "$HOME/.gnupg/S.gpg-agent");
    assert!(config.options.is_empty());
    config.validate().unwrap();
}

#[test]
fn test_config_builder() {
    let config = Config::builder()
        .socket_path("/run/agent.sock")
        .command_timeout_ms(10)
        .option("ttyname", "/dev/pts/1")
        .build();

    assert_eq!(config.command_timeout().as_millis(), 10);
    assert_eq!(config.endpoint().path().to_str(), Some("/run/agent.sock"));
    assert_eq!(config.options, vec![("ttyname".to_string(), "/dev/pts/1".to_string())]);
}

#[test]
fn test_config_rejects_zero_timeout() {
    let config = Config::builder().probe_timeout_ms(0).build();
    assert!(matches!(config.validate(), Err(AgentError::Config(_))));
}

#[test]
fn test_config_rejects_empty_socket() {
    let config = Config::builder().socket_path("  ").build();
    assert!(matches!(config.validate(), Err(AgentError::Config(_))));
}

#[test]
fn test_config_rejects_bad_option_name() {
    let config = Config::builder().option("a=b", "c").build();
    assert!(matches!(config.validate(), Err(AgentError::Config(_))));
}
