use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub admin_password: String,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/board.db".into(),
            admin_password: String::new(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Keys accepted in `server.toml` and as `APP__*` environment variables.
#[derive(Debug, Default, Deserialize)]
struct LayeredSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    admin_password: Option<String>,
    max_body_bytes: Option<usize>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), std::env::vars())
}

/// Layers defaults, the optional settings file, `APP__*` variables and finally
/// the unprefixed `SERVER_BIND`, `DATABASE_URL` and `ADMIN_PASSWORD` names.
pub fn load_settings_from(
    settings_file: &Path,
    env: impl IntoIterator<Item = (String, String)>,
) -> anyhow::Result<Settings> {
    let env: config::Map<String, String> = env.into_iter().collect();

    let layered: LayeredSettings = config::Config::builder()
        .add_source(config::File::from(settings_file).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true)
                .source(Some(env.clone())),
        )
        .build()
        .with_context(|| format!("failed to read settings from '{}'", settings_file.display()))?
        .try_deserialize()
        .context("invalid server settings")?;

    let mut settings = Settings::default();
    if let Some(v) = layered.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = layered.database_url {
        settings.database_url = v;
    }
    if let Some(v) = layered.admin_password {
        settings.admin_password = v;
    }
    if let Some(v) = layered.max_body_bytes {
        settings.max_body_bytes = v;
    }

    if let Some(v) = env.get("SERVER_BIND") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = env.get("DATABASE_URL") {
        settings.database_url = v.clone();
    }
    if let Some(v) = env.get("ADMIN_PASSWORD") {
        settings.admin_password = v.clone();
    }

    Ok(settings)
}

/// Turns a bare path or `sqlite:` shorthand into a `sqlite://` URL.
/// `Storage::new` creates the parent directory.
pub fn prepare_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
