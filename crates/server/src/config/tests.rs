use secrecy::ExposeSecret;

use super::*;

#[test]
fn empty_config_uses_defaults() {
    let config = VitrineConfig::parse("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.shutdown_timeout_seconds, 30);
    assert!(config.auth.token_secret.is_none());
    assert_eq!(config.auth.token_ttl_seconds, 900);
    assert!(!config.auth.seed_demo_users);
    assert!(config.auth.users.is_empty());
    assert_eq!(config.attachments.dir, std::path::PathBuf::from("img"));
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn full_config() {
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9090
        shutdown_timeout_seconds = 5

        [auth]
        token_secret = "s3cret"
        token_ttl_seconds = 60
        seed_demo_users = true

        [[auth.users]]
        username = "alice"
        password_hash = "$argon2id$v=19$m=19456,t=2,p=1$abc$def"
        role = "admin"

        [attachments]
        dir = "/var/lib/vitrine/img"

        [logging]
        level = "debug"
        format = "json"
    "#;

    let config = VitrineConfig::parse(toml).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.shutdown_timeout_seconds, 5);
    assert_eq!(
        config.auth.token_secret.as_ref().unwrap().expose_secret(),
        "s3cret"
    );
    assert_eq!(config.auth.token_ttl_seconds, 60);
    assert!(config.auth.seed_demo_users);
    assert_eq!(config.auth.users.len(), 1);
    assert_eq!(config.auth.users[0].username, "alice");
    assert_eq!(config.auth.users[0].role, "admin");
    assert_eq!(
        config.attachments.dir,
        std::path::PathBuf::from("/var/lib/vitrine/img")
    );
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn unknown_log_format_is_rejected() {
    let err = VitrineConfig::parse("[logging]\nformat = \"xml\"").unwrap_err();
    assert!(err.to_string().contains("configuration error"));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (config, found) = VitrineConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert!(!found);
    assert_eq!(config.server.port, 8080);
}

#[test]
fn existing_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vitrine.toml");
    std::fs::write(&path, "[server]\nport = 7000\n").unwrap();
    let (config, found) = VitrineConfig::load(&path).unwrap();
    assert!(found);
    assert_eq!(config.server.port, 7000);
}
