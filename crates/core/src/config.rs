use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration, resolved in layers: built-in defaults, then an
/// optional `liwa.toml` patch, then `LIWA_*` environment variables, then
/// programmatic overrides. Validation runs once on the final result.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub completion: CompletionConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Hosted chat-completion endpoint used by the reservation agent.
#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// How many recent turns the agent keeps when resolving references
    /// and building completion requests.
    pub history_window: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "logging.format `{other}` is not one of compact|pretty|json"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub completion_api_key: Option<String>,
    pub completion_model: Option<String>,
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
    #[error("config references environment variable `{var}`, which is not set")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated `${{...}}` expression in config file")]
    UnterminatedInterpolation,
    #[error("environment variable `{key}` has unusable value `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://liwa.db".into(),
                max_connections: 5,
                timeout_secs: 30,
            },
            completion: CompletionConfig {
                api_key: None,
                base_url: "https://api.mistral.ai".into(),
                model: "mistral-small-latest".into(),
                timeout_secs: 30,
            },
            chat: ChatConfig { history_window: 10 },
            logging: LoggingConfig { level: "info".into(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match locate_config_file(options.config_path.as_deref()) {
            Some(path) => read_patch(&path)?.apply(&mut config),
            None if options.require_file => {
                let wanted = options.config_path.unwrap_or_else(|| PathBuf::from("liwa.toml"));
                return Err(ConfigError::MissingConfigFile(wanted));
            }
            None => {}
        }

        config.apply_env()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = env_string("LIWA_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(value) = env_parsed("LIWA_DATABASE_MAX_CONNECTIONS")? {
            self.database.max_connections = value;
        }
        if let Some(value) = env_parsed("LIWA_DATABASE_TIMEOUT_SECS")? {
            self.database.timeout_secs = value;
        }

        if let Some(key) = env_string("LIWA_COMPLETION_API_KEY") {
            self.completion.api_key = Some(key.into());
        }
        if let Some(url) = env_string("LIWA_COMPLETION_BASE_URL") {
            self.completion.base_url = url;
        }
        if let Some(model) = env_string("LIWA_COMPLETION_MODEL") {
            self.completion.model = model;
        }
        if let Some(value) = env_parsed("LIWA_COMPLETION_TIMEOUT_SECS")? {
            self.completion.timeout_secs = value;
        }

        if let Some(value) = env_parsed("LIWA_CHAT_HISTORY_WINDOW")? {
            self.chat.history_window = value;
        }

        // The short LIWA_LOG_* names are accepted as aliases.
        if let Some(level) = env_string("LIWA_LOGGING_LEVEL").or_else(|| env_string("LIWA_LOG_LEVEL"))
        {
            self.logging.level = level;
        }
        if let Some(format) =
            env_string("LIWA_LOGGING_FORMAT").or_else(|| env_string("LIWA_LOG_FORMAT"))
        {
            self.logging.format = format.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(key) = overrides.completion_api_key {
            self.completion.api_key = Some(key.into());
        }
        if let Some(model) = overrides.completion_model {
            self.completion.model = model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let reject = |message: &str| Err(ConfigError::Validation(message.to_string()));

        let url = self.database.url.trim();
        if !url.starts_with("sqlite://") && !url.starts_with("sqlite::") && url != ":memory:" {
            return reject(
                "database.url must be a sqlite URL (sqlite://..., sqlite::..., or :memory:)",
            );
        }
        if self.database.max_connections == 0 {
            return reject("database.max_connections must be at least 1");
        }
        if !(1..=300).contains(&self.database.timeout_secs) {
            return reject("database.timeout_secs must be between 1 and 300");
        }

        if !(1..=300).contains(&self.completion.timeout_secs) {
            return reject("completion.timeout_secs must be between 1 and 300");
        }
        let base_url = self.completion.base_url.trim();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return reject("completion.base_url must be an http(s) URL");
        }
        if self.completion.model.trim().is_empty() {
            return reject("completion.model must not be empty");
        }
        let has_key = self
            .completion
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty());
        if !has_key {
            return reject(
                "completion.api_key is required; set LIWA_COMPLETION_API_KEY or [completion] api_key",
            );
        }

        if self.chat.history_window == 0 {
            return reject("chat.history_window must be at least 1");
        }

        match self.logging.level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => reject("logging.level must be one of trace|debug|info|warn|error"),
        }
    }
}

fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => ["liwa.toml", "config/liwa.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists()),
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    let expanded = expand_env_expressions(&raw)?;
    toml::from_str(&expanded)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces every `${VAR}` in the raw file text with the value of that
/// environment variable. A missing variable is an error, not an empty
/// string.
fn expand_env_expressions(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &after[..end];
        let value =
            env::var(var).map_err(|_| ConfigError::MissingEnvInterpolation { var: var.into() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parsed<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    env_string(key)
        .map(|value| {
            value.parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
                key: key.to_string(),
                value,
            })
        })
        .transpose()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    completion: Option<CompletionPatch>,
    chat: Option<ChatPatch>,
    logging: Option<LoggingPatch>,
}

impl ConfigPatch {
    fn apply(self, config: &mut AppConfig) {
        if let Some(patch) = self.database {
            merge_field(&mut config.database.url, patch.url);
            merge_field(&mut config.database.max_connections, patch.max_connections);
            merge_field(&mut config.database.timeout_secs, patch.timeout_secs);
        }
        if let Some(patch) = self.completion {
            if let Some(key) = patch.api_key {
                config.completion.api_key = Some(key.into());
            }
            merge_field(&mut config.completion.base_url, patch.base_url);
            merge_field(&mut config.completion.model, patch.model);
            merge_field(&mut config.completion.timeout_secs, patch.timeout_secs);
        }
        if let Some(patch) = self.chat {
            merge_field(&mut config.chat.history_window, patch.history_window);
        }
        if let Some(patch) = self.logging {
            merge_field(&mut config.logging.level, patch.level);
            merge_field(&mut config.logging.format, patch.format);
        }
    }
}

fn merge_field<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    history_window: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
