use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use caliope_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in effective_values(&config) {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

type Entry = (&'static str, &'static [&'static str], String);

fn entry(key_path: &'static str, env_keys: &'static [&'static str], value: String) -> Entry {
    (key_path, env_keys, value)
}

fn effective_values(config: &AppConfig) -> Vec<Entry> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        entry("database.url", &["CALIOPE_DATABASE_URL"], config.database.url.clone()),
        entry(
            "database.max_connections",
            &["CALIOPE_DATABASE_MAX_CONNECTIONS"],
            config.database.max_connections.to_string(),
        ),
        entry(
            "database.timeout_secs",
            &["CALIOPE_DATABASE_TIMEOUT_SECS"],
            config.database.timeout_secs.to_string(),
        ),
        entry("llm.provider", &["CALIOPE_LLM_PROVIDER"], format!("{:?}", config.llm.provider)),
        entry("llm.model", &["CALIOPE_LLM_MODEL"], config.llm.model.clone()),
        entry(
            "llm.base_url",
            &["CALIOPE_LLM_BASE_URL"],
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
        ),
        entry("llm.api_key", &["CALIOPE_LLM_API_KEY"], api_key),
        entry("llm.timeout_secs", &["CALIOPE_LLM_TIMEOUT_SECS"], config.llm.timeout_secs.to_string()),
        entry("server.bind_address", &["CALIOPE_SERVER_BIND_ADDRESS"], config.server.bind_address.clone()),
        entry("server.port", &["CALIOPE_SERVER_PORT"], config.server.port.to_string()),
        entry(
            "server.graceful_shutdown_secs",
            &["CALIOPE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        entry(
            "catalog.data_source",
            &["CALIOPE_CATALOG_DATA_SOURCE"],
            format!("{:?}", config.catalog.data_source),
        ),
        entry(
            "catalog.default_page_size",
            &["CALIOPE_CATALOG_DEFAULT_PAGE_SIZE"],
            config.catalog.default_page_size.to_string(),
        ),
        entry(
            "recommendations.max_results",
            &["CALIOPE_RECOMMENDATIONS_MAX_RESULTS"],
            config.recommendations.max_results.to_string(),
        ),
        entry(
            "recommendations.ai_timeout_secs",
            &["CALIOPE_RECOMMENDATIONS_AI_TIMEOUT_SECS"],
            config.recommendations.ai_timeout_secs.to_string(),
        ),
        entry("import.chunk_size", &["CALIOPE_IMPORT_CHUNK_SIZE"], config.import.chunk_size.to_string()),
        entry(
            "logging.level",
            &["CALIOPE_LOGGING_LEVEL", "CALIOPE_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        entry(
            "logging.format",
            &["CALIOPE_LOGGING_FORMAT", "CALIOPE_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("caliope.toml"), PathBuf::from("config/caliope.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps at most the first four characters of a secret.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }

    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}
