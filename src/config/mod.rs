
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Default config file name, looked up in the working directory when no
/// explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "recipeforge.toml";

/// Environment variable overriding the text model identifier.
pub const TEXT_MODEL_ENV: &str = "LLAMA_MODEL";

/// Environment variable overriding the vision model identifier.
pub const VISION_MODEL_ENV: &str = "VISION_MODEL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8420
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the chat-completions API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the environment variable holding the bearer credential.
    /// The key itself never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier for text-only prompt requests.
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Model identifier for requests that embed image data.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            text_model: default_text_model(),
            vision_model: default_vision_model(),
        }
    }
}

fn default_api_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}
fn default_text_model() -> String {
    "meta-llama/llama-3.3-70b-instruct".to_string()
}
fn default_vision_model() -> String {
    "meta-llama/llama-3.2-11b-vision-instruct".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory the exported PDF is written to.
    #[serde(default = "default_export_dir")]
    pub dir: String,

    #[serde(default = "default_export_filename")]
    pub filename: String,

    /// Static header printed at the top of every exported page.
    #[serde(default = "default_export_title")]
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            filename: default_export_filename(),
            title: default_export_title(),
        }
    }
}

fn default_export_dir() -> String {
    ".".to_string()
}
fn default_export_filename() -> String {
    "recipes_export.pdf".to_string()
}
fn default_export_title() -> String {
    "Generated Recipes".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration. An explicit path must exist; the default file is
    /// optional and silently falls back to built-in defaults. Model-identifier
    /// environment overrides are applied after the file is read.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(Path::new(p))?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Config::default()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = env::var(TEXT_MODEL_ENV) {
            if !model.trim().is_empty() {
                self.inference.text_model = model;
            }
        }
        if let Ok(model) = env::var(VISION_MODEL_ENV) {
            if !model.trim().is_empty() {
                self.inference.vision_model = model;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if self.inference.api_base.trim().is_empty() {
            anyhow::bail!("inference.api_base must not be empty");
        }
        if self.inference.text_model.trim().is_empty() {
            anyhow::bail!("inference.text_model must not be empty");
        }
        if self.inference.vision_model.trim().is_empty() {
            anyhow::bail!("inference.vision_model must not be empty");
        }
        if self.export.filename.trim().is_empty() {
            anyhow::bail!("export.filename must not be empty");
        }
        Ok(())
    }
}
