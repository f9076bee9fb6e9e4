use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub workflow: WorkflowConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// Scheme and host of the backend, without a trailing slash.
    pub base_url: String,
    /// Path segment under `/api/` that most endpoints live in. The stock
    /// reduction endpoint lives outside it, under `/api/kurang-stok-cabang`.
    pub domain: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Branch assumed when a token carries no branch claim. Head office is
    /// branch 1; keep that default unless deployment says otherwise.
    pub default_branch: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
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

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub api_domain: Option<String>,
    pub default_branch: Option<u32>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
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
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                domain: "pengadaan-barang".to_string(),
            },
            workflow: WorkflowConfig { default_branch: 1 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("pengadaan.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(domain) = api.domain {
                self.api.domain = domain;
            }
        }
        if let Some(workflow) = patch.workflow {
            if let Some(default_branch) = workflow.default_branch {
                self.workflow.default_branch = default_branch;
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
        if let Some(base_url) = env_string("PENGADAAN_API_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Some(domain) = env_string("PENGADAAN_API_DOMAIN") {
            self.api.domain = domain;
        }
        if let Some(raw) = env_string("PENGADAAN_DEFAULT_BRANCH") {
            self.workflow.default_branch = raw.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "PENGADAAN_DEFAULT_BRANCH".to_string(),
                    value: raw,
                }
            })?;
        }
        if let Some(level) = env_string("PENGADAAN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(raw) = env_string("PENGADAAN_LOG_FORMAT") {
            self.logging.format = raw.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "PENGADAAN_LOG_FORMAT".to_string(),
                value: raw,
            })?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.api_base_url {
            self.api.base_url = base_url;
        }
        if let Some(domain) = overrides.api_domain {
            self.api.domain = domain;
        }
        if let Some(default_branch) = overrides.default_branch {
            self.workflow.default_branch = default_branch;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("api.base_url must not be empty".to_string()));
        }
        if self.api.base_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "api.base_url must not end with a slash".to_string(),
            ));
        }
        if self.api.domain.trim().is_empty() || self.api.domain.contains('/') {
            return Err(ConfigError::Validation(
                "api.domain must be a single path segment".to_string(),
            ));
        }
        if self.workflow.default_branch == 0 {
            return Err(ConfigError::Validation(
                "workflow.default_branch must be at least 1".to_string(),
            ));
        }
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "unsupported log level `{}` (expected trace|debug|info|warn|error)",
                self.logging.level
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    workflow: Option<WorkflowPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    domain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowPatch {
    default_branch: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let contents = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&contents)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        // An explicit path never falls back to the default file.
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => {
            let default = PathBuf::from("pengadaan.toml");
            default.exists().then_some(default)
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
