use super::{load_settings_from, prepare_database_url, Settings};

use std::fs;

fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(&dir.path().join("server.toml"), env(&[])).expect("settings");
    let defaults = Settings::default();
    assert_eq!(settings.server_bind, defaults.server_bind);
    assert_eq!(settings.database_url, defaults.database_url);
    assert!(settings.admin_password.is_empty());
    assert_eq!(settings.max_body_bytes, 64 * 1024);
}

#[test]
fn file_then_prefixed_env_then_legacy_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("server.toml");
    fs::write(
        &file,
        r#"
bind_addr = "0.0.0.0:9000"
database_url = "sqlite://file.db"
admin_password = "from-file"
max_body_bytes = 1024
"#,
    )
    .expect("write settings");

    let from_file = load_settings_from(&file, env(&[])).expect("settings");
    assert_eq!(from_file.server_bind, "0.0.0.0:9000");
    assert_eq!(from_file.database_url, "sqlite://file.db");
    assert_eq!(from_file.admin_password, "from-file");
    assert_eq!(from_file.max_body_bytes, 1024);

    let prefixed = load_settings_from(
        &file,
        env(&[
            ("APP__ADMIN_PASSWORD", "from-app-env"),
            ("APP__MAX_BODY_BYTES", "2048"),
        ]),
    )
    .expect("settings");
    assert_eq!(prefixed.admin_password, "from-app-env");
    assert_eq!(prefixed.max_body_bytes, 2048);
    assert_eq!(prefixed.server_bind, "0.0.0.0:9000");

    let legacy = load_settings_from(
        &file,
        env(&[
            ("APP__ADMIN_PASSWORD", "from-app-env"),
            ("ADMIN_PASSWORD", "from-legacy-env"),
            ("SERVER_BIND", "127.0.0.1:1234"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]),
    )
    .expect("settings");
    assert_eq!(legacy.admin_password, "from-legacy-env");
    assert_eq!(legacy.server_bind, "127.0.0.1:1234");
    assert_eq!(legacy.database_url, "sqlite::memory:");
}

#[test]
fn numeric_admin_password_stays_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(
        &dir.path().join("server.toml"),
        env(&[("APP__ADMIN_PASSWORD", "1234")]),
    )
    .expect("settings");
    assert_eq!(settings.admin_password, "1234");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        prepare_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(prepare_database_url("  "), Settings::default().database_url);
    assert_eq!(prepare_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("server.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref());
    assert!(prepared.starts_with("sqlite://"));
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
