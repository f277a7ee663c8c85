use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::import::MAX_BATCH_WRITES;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub recommendations: RecommendationsConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// True when a provider is selected and has what it needs to be called.
    pub fn is_usable(&self) -> bool {
        match self.provider {
            LlmProvider::Disabled => false,
            LlmProvider::Gemini | LlmProvider::OpenAi => self
                .api_key
                .as_ref()
                .is_some_and(|key| !key.expose_secret().trim().is_empty()),
            LlmProvider::Ollama => true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub data_source: DataSource,
    pub default_page_size: i64,
}

#[derive(Clone, Debug)]
pub struct RecommendationsConfig {
    pub max_results: usize,
    pub ai_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ImportConfig {
    pub chunk_size: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Disabled,
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

/// Where catalog, user and order data come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// In-memory repositories seeded with the fixture catalog.
    Demo,
    /// SQLite through `database.url`.
    Live,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub data_source: Option<DataSource>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://caliope.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::Disabled,
                api_key: None,
                base_url: None,
                model: "gemini-1.5-flash".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            catalog: CatalogConfig { data_source: DataSource::Demo, default_page_size: 10 },
            recommendations: RecommendationsConfig { max_results: 6, ai_timeout_secs: 8 },
            import: ImportConfig { chunk_size: 400 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" => Ok(Self::Disabled),
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected disabled|gemini|openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for DataSource {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "live" => Ok(Self::Live),
            other => Err(ConfigError::Validation(format!(
                "unsupported catalog data source `{other}` (expected demo|live)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("caliope.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(data_source) = catalog.data_source {
                self.catalog.data_source = data_source;
            }
            if let Some(default_page_size) = catalog.default_page_size {
                self.catalog.default_page_size = default_page_size;
            }
        }

        if let Some(recommendations) = patch.recommendations {
            if let Some(max_results) = recommendations.max_results {
                self.recommendations.max_results = max_results;
            }
            if let Some(ai_timeout_secs) = recommendations.ai_timeout_secs {
                self.recommendations.ai_timeout_secs = ai_timeout_secs;
            }
        }

        if let Some(import) = patch.import {
            if let Some(chunk_size) = import.chunk_size {
                self.import.chunk_size = chunk_size;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CALIOPE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CALIOPE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("CALIOPE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CALIOPE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("CALIOPE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CALIOPE_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("CALIOPE_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("CALIOPE_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("CALIOPE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("CALIOPE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("CALIOPE_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CALIOPE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CALIOPE_SERVER_PORT") {
            self.server.port = parse_u16("CALIOPE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CALIOPE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("CALIOPE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("CALIOPE_CATALOG_DATA_SOURCE") {
            self.catalog.data_source = value.parse()?;
        }
        if let Some(value) = read_env("CALIOPE_CATALOG_DEFAULT_PAGE_SIZE") {
            self.catalog.default_page_size =
                parse_i64("CALIOPE_CATALOG_DEFAULT_PAGE_SIZE", &value)?;
        }

        if let Some(value) = read_env("CALIOPE_RECOMMENDATIONS_MAX_RESULTS") {
            self.recommendations.max_results =
                parse_usize("CALIOPE_RECOMMENDATIONS_MAX_RESULTS", &value)?;
        }
        if let Some(value) = read_env("CALIOPE_RECOMMENDATIONS_AI_TIMEOUT_SECS") {
            self.recommendations.ai_timeout_secs =
                parse_u64("CALIOPE_RECOMMENDATIONS_AI_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CALIOPE_IMPORT_CHUNK_SIZE") {
            self.import.chunk_size = parse_usize("CALIOPE_IMPORT_CHUNK_SIZE", &value)?;
        }

        let log_level =
            read_env("CALIOPE_LOGGING_LEVEL").or_else(|| read_env("CALIOPE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CALIOPE_LOGGING_FORMAT").or_else(|| read_env("CALIOPE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(data_source) = overrides.data_source {
            self.catalog.data_source = data_source;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_catalog(&self.catalog)?;
        validate_recommendations(&self.recommendations)?;
        validate_import(&self.import)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("caliope.toml"), PathBuf::from("config/caliope.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if let Some(base_url) = &llm.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    // A missing api key for gemini/openai only disables AI features.
    if llm.provider == LlmProvider::Ollama {
        let missing = llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "llm.base_url is required for ollama provider".to_string(),
            ));
        }
    }

    if llm.provider != LlmProvider::Disabled && llm.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm.model must not be empty when a provider is selected".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.default_page_size <= 0 || catalog.default_page_size > 100 {
        return Err(ConfigError::Validation(
            "catalog.default_page_size must be in range 1..=100".to_string(),
        ));
    }
    Ok(())
}

fn validate_recommendations(recommendations: &RecommendationsConfig) -> Result<(), ConfigError> {
    if recommendations.max_results == 0 {
        return Err(ConfigError::Validation(
            "recommendations.max_results must be greater than zero".to_string(),
        ));
    }

    if recommendations.ai_timeout_secs == 0 || recommendations.ai_timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "recommendations.ai_timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_import(import: &ImportConfig) -> Result<(), ConfigError> {
    if import.chunk_size == 0 || import.chunk_size > MAX_BATCH_WRITES {
        return Err(ConfigError::Validation(format!(
            "import.chunk_size must be in range 1..={MAX_BATCH_WRITES}"
        )));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    catalog: Option<CatalogPatch>,
    recommendations: Option<RecommendationsPatch>,
    import: Option<ImportPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    data_source: Option<DataSource>,
    default_page_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationsPatch {
    max_results: Option<usize>,
    ai_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ImportPatch {
    chunk_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        AppConfig, ConfigError, ConfigOverrides, DataSource, LlmProvider, LoadOptions, LogFormat,
    };

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_run_in_demo_mode_without_ai() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.catalog.data_source == DataSource::Demo, "default source should be demo")?;
        ensure(config.llm.provider == LlmProvider::Disabled, "ai should be disabled by default")?;
        ensure(!config.llm.is_usable(), "disabled provider should not be usable")?;
        ensure(config.import.chunk_size == 400, "default chunk size should be 400")?;
        ensure(config.recommendations.max_results == 6, "default shortlist should hold 6 items")?;
        ensure(
            config.recommendations.ai_timeout_secs == 8,
            "default ai timeout should be 8 seconds",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_CALIOPE_GEMINI_KEY", "gemini-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("caliope.toml");
            fs::write(
                &path,
                r#"
[llm]
provider = "gemini"
api_key = "${TEST_CALIOPE_GEMINI_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let key = config.llm.api_key.as_ref().map(|key| key.expose_secret().to_string());
            ensure(key.as_deref() == Some("gemini-from-env"), "api key should come from env")?;
            ensure(config.llm.is_usable(), "gemini with a key should be usable")?;
            Ok(())
        })();

        clear_vars(&["TEST_CALIOPE_GEMINI_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("caliope.toml");
        fs::write(&path, "[database]\nurl = \"${CALIOPE_TEST_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "CALIOPE_TEST_UNSET_VAR"),
            "missing variable should be named in the error",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CALIOPE_LOG_LEVEL", "warn");
        env::set_var("CALIOPE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["CALIOPE_LOG_LEVEL", "CALIOPE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CALIOPE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("CALIOPE_CATALOG_DATA_SOURCE", "live");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("caliope.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[catalog]
data_source = "demo"
default_page_size = 12

[import]
chunk_size = 250

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.catalog.data_source == DataSource::Live,
                "env data source should win over file",
            )?;
            ensure(config.catalog.default_page_size == 12, "file page size should apply")?;
            ensure(config.import.chunk_size == 250, "file chunk size should apply")?;
            Ok(())
        })();

        clear_vars(&["CALIOPE_DATABASE_URL", "CALIOPE_CATALOG_DATA_SOURCE"]);
        result
    }

    #[test]
    fn chunk_size_above_store_limit_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CALIOPE_IMPORT_CHUNK_SIZE", "600");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("import.chunk_size")
            );
            ensure(has_message, "validation failure should mention import.chunk_size")
        })();

        clear_vars(&["CALIOPE_IMPORT_CHUNK_SIZE"]);
        result
    }

    #[test]
    fn malformed_numeric_env_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CALIOPE_SERVER_PORT", "eighty");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "CALIOPE_SERVER_PORT"),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["CALIOPE_SERVER_PORT"]);
        result
    }

    #[test]
    fn ollama_requires_base_url() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::Ollama),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });
        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("llm.base_url")),
            "ollama without base_url should fail validation",
        )
    }

    #[test]
    fn gemini_without_key_loads_but_is_not_usable() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::Gemini),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(!config.llm.is_usable(), "gemini without a key should not be usable")
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CALIOPE_LLM_API_KEY", "gemini-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("gemini-secret-value"),
                "debug output should not contain the llm api key",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["CALIOPE_LLM_API_KEY"]);
        result
    }
}
