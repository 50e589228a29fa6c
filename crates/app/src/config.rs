use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use sift_core::{default_categories, Category};
use sift_import::ai::{DEFAULT_AI_MODEL, DEFAULT_AI_TIMEOUT};
use sift_ocr::OcrConfig;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiSettings {
    pub host: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl AiSettings {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_AI_MODEL)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_AI_TIMEOUT)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("SIFT_AI_HOST") {
            self.host = Some(host);
        }
        if let Some(model) = var("SIFT_AI_MODEL") {
            self.model = Some(model);
        }
        if let Some(key) = var("SIFT_AI_API_KEY") {
            self.api_key = Some(key);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    ai: AiSettings,
    ocr: OcrConfig,
    /// Only checked for presence; [`Category::list_from_toml`] does the parsing.
    categories: Option<toml::Value>,
}

#[derive(Debug, Clone)]
pub struct SiftConfig {
    pub ai: AiSettings,
    pub ocr: OcrConfig,
    pub categories: Vec<Category>,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            ai: AiSettings::default(),
            ocr: OcrConfig::default(),
            categories: default_categories(),
        }
    }
}

impl SiftConfig {
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "sift", "sift")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// An explicit path must exist; the default location may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.ai.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Without a `categories` key the built-in list applies. An explicit
    /// empty list leaves only Unknown.
    pub fn parse(content: &str) -> Result<Self> {
        let settings: FileSettings = toml::from_str(content)?;
        let categories = match settings.categories {
            Some(_) => Category::list_from_toml(content)?,
            None => default_categories(),
        };
        Ok(Self { ai: settings.ai, ocr: settings.ocr, categories })
    }
}
