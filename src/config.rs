//! Runtime configuration, loaded from a TOML file.
//!
//! Every section and key is optional; a missing file yields the defaults.

use std::path::{Path, PathBuf};

use crate::registry::FieldMode;
use crate::wizard::WizardKind;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Invalid(String),
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Fully parsed configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub wizard: WizardConfig,
    pub logging: LoggingConfig,
}

/// `[api]` — where and how submissions are sent.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub auth_token: Option<String>,
    pub daily_entry_path: String,
    pub daily_diary_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 5,
            auth_token: None,
            daily_entry_path: "/api/daily/daily-entry".to_string(),
            daily_diary_path: "/api/diary/daily-diary".to_string(),
        }
    }
}

impl ApiConfig {
    /// Endpoint path for a wizard kind.
    pub fn path_for(&self, kind: WizardKind) -> &str {
        match kind {
            WizardKind::DailyEntry => &self.daily_entry_path,
            WizardKind::DailyDiary => &self.daily_diary_path,
        }
    }
}

/// `[wizard]` — store behaviour.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WizardConfig {
    pub field_mode: FieldMode,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Defaults to `<data_local_dir>/sitelog`.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    pub fn log_dir(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("sitelog")
        })
    }
}

/// Parse a TOML string into an [`AppConfig`], running validation.
pub fn parse(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig =
        toml::from_str(toml_str).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Read and parse the file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

/// `<config_dir>/sitelog/config.toml`, when the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sitelog").join("config.toml"))
}

/// Load `path` (or the default location); a missing file means defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path.map(Path::to_path_buf).or_else(default_path) {
        Some(p) => p,
        None => return Ok(AppConfig::default()),
    };
    if path.exists() {
        load(&path)
    } else {
        Ok(AppConfig::default())
    }
}

fn validate(cfg: &AppConfig) -> Result<(), ConfigError> {
    let api = &cfg.api;
    if !(api.base_url.starts_with("http://") || api.base_url.starts_with("https://")) {
        return Err(ConfigError::Invalid(format!(
            "api.base_url must start with http:// or https://, got `{}`",
            api.base_url
        )));
    }
    if api.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "api.timeout_secs must be greater than zero".to_string(),
        ));
    }
    for (name, path) in [
        ("api.daily_entry_path", &api.daily_entry_path),
        ("api.daily_diary_path", &api.daily_diary_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Invalid(format!("{name} must start with `/`")));
        }
    }
    Ok(())
}
