use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub rules_file: PathBuf,
    pub fetch_batch_size: u32,
    pub rules_limit: u32,
    pub default_labels: Vec<String>,
    /// Bearer token for the Gmail API. Without one, rules run in dry-run mode.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("emails.db"),
            rules_file: PathBuf::from("rules.json"),
            fetch_batch_size: 25,
            rules_limit: 20,
            default_labels: vec!["INBOX".to_string()],
            access_token: None,
        }
    }
}

impl Config {
    /// Settings file (if any), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(Path::new(SETTINGS_FILE))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = var("RULES_FILE") {
            self.rules_file = PathBuf::from(v);
        }
        if let Some(n) = var("FETCH_BATCH_SIZE").and_then(|v| v.trim().parse().ok()) {
            self.fetch_batch_size = n;
        }
        if let Some(n) = var("RULES_LIMIT").and_then(|v| v.trim().parse().ok()) {
            self.rules_limit = n;
        }
        if let Some(token) = var("GMAIL_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.access_token = Some(token);
        }
    }

    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.db_path.display())
    }
}
