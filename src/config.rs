use anyhow::{anyhow, Context, Result};
use jsonc_parser::{parse_to_serde_value, ParseOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio::time;

use crate::generation::SamplingParams;

const MIN_REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_copy_feedback_ms")]
    pub copy_feedback_ms: u64,

    #[serde(default = "default_clipboard_enabled")]
    pub clipboard_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

fn default_gemini_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_temperature() -> f32 {
    SamplingParams::default().temperature
}

fn default_top_p() -> f32 {
    SamplingParams::default().top_p
}

fn default_top_k() -> u32 {
    SamplingParams::default().top_k
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_copy_feedback_ms() -> u64 {
    2_000
}

fn default_clipboard_enabled() -> bool {
    true
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_gemini_endpoint(),
            model: default_gemini_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
        }
    }
}

impl GeminiConfig {
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
            copy_feedback_ms: default_copy_feedback_ms(),
            clipboard_enabled: default_clipboard_enabled(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(MIN_REQUEST_TIMEOUT_SECS))
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }

    /// Whether moving from `self` to `new` requires a new generation client.
    pub fn generator_changed(&self, new: &Config) -> bool {
        self.gemini != new.gemini || self.request_timeout_secs != new.request_timeout_secs
    }
}

#[derive(Clone)]
pub struct ConfigManager {
    inner: Arc<ConfigManagerInner>,
}

struct ConfigManagerInner {
    config: RwLock<Config>,
    config_path: PathBuf,
    change_tx: watch::Sender<Config>,
    watcher_active: AtomicBool,
}

impl ConfigManager {
    pub fn load() -> Result<Self> {
        let config_dir = directories::ProjectDirs::from("", "", "reelscopy-rs")
            .context("Failed to get config directory")?
            .config_dir()
            .to_path_buf();

        Self::load_from_dir(&config_dir)
    }

    pub fn load_from_dir(config_dir: &Path) -> Result<Self> {
        fs::create_dir_all(config_dir).context("Failed to create config directory")?;

        let jsonc_path = config_dir.join("config.jsonc");
        let legacy_path = config_dir.join("config.json");

        let (config_path, config) = if jsonc_path.exists() {
            let config = Self::read_config_from_disk(&jsonc_path)?;
            (jsonc_path, config)
        } else if legacy_path.exists() {
            let config = Self::read_config_from_disk(&legacy_path)?;
            Self::write_config_file(&jsonc_path, &config)?;
            tracing::info!(
                "Migrated legacy config to JSONC: {:?} -> {:?}",
                legacy_path,
                jsonc_path
            );
            (jsonc_path, config)
        } else {
            let default_config = Config::default();
            Self::write_config_file(&jsonc_path, &default_config)?;
            tracing::info!("Created default config at: {:?}", jsonc_path);
            (jsonc_path, default_config)
        };

        tracing::info!("Loaded config from: {:?}", config_path);

        let (change_tx, _) = watch::channel(config.clone());

        Ok(Self {
            inner: Arc::new(ConfigManagerInner {
                config: RwLock::new(config),
                config_path,
                change_tx,
                watcher_active: AtomicBool::new(false),
            }),
        })
    }

    pub fn start_watching(&self) {
        if self.inner.watcher_active.swap(true, Ordering::SeqCst) {
            return;
        }

        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let mut last_state = Self::file_state(&inner.config_path);
            let mut ticker = time::interval(Duration::from_millis(500));

            loop {
                ticker.tick().await;

                let current_state = Self::file_state(&inner.config_path);
                if current_state == last_state {
                    continue;
                }

                last_state = current_state;

                match Self::read_config_from_disk(&inner.config_path) {
                    Ok(new_config) => {
                        let changed = match inner.config.write() {
                            Ok(mut guard) if *guard != new_config => {
                                *guard = new_config.clone();
                                true
                            }
                            Ok(_) => false,
                            Err(_) => {
                                tracing::error!("Config lock poisoned; stopping watcher");
                                break;
                            }
                        };

                        if changed && inner.change_tx.send(new_config.clone()).is_ok() {
                            tracing::info!("Reloaded config from: {:?}", inner.config_path);
                            tracing::debug!(?new_config, "Config watcher applied update");
                        }
                    }
                    Err(err) => {
                        tracing::warn!("Failed to reload config: {err:#}");
                    }
                }
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<Config> {
        self.inner.change_tx.subscribe()
    }

    pub fn get(&self) -> Config {
        match self.inner.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.inner.config_path
    }

    fn read_config_from_disk(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {:?}", path))?;
        parse_config(&content)
    }

    fn write_config_file(path: &Path, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("Failed to write config file at {:?}", path))
    }

    fn file_state(path: &Path) -> Option<(SystemTime, u64)> {
        let metadata = fs::metadata(path).ok()?;
        let modified = metadata.modified().ok()?;
        Some((modified, metadata.len()))
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let value = parse_to_serde_value(content, &ParseOptions::default())
        .context("Failed to parse config as JSONC")?
        .ok_or_else(|| anyhow!("Config file did not contain a JSON value"))?;
    serde_json::from_value(value).context("Failed to deserialize config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = parse_config("{}").expect("parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.gemini.model, "gemini-3-flash-preview");
        assert_eq!(config.gemini.sampling(), SamplingParams::default());
        assert_eq!(config.copy_feedback(), Duration::from_secs(2));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn accepts_comments_and_partial_sections() {
        let content = r#"{
            // a cheaper model for drafts
            "gemini": { "model": "gemini-2.5-flash", "top_k": 20 },
            "clipboard_enabled": false /* headless box */
        }"#;
        let config = parse_config(content).expect("parse");
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.top_k, 20);
        assert!((config.gemini.temperature - 0.7).abs() < f32::EPSILON);
        assert!(!config.clipboard_enabled);
    }

    #[test]
    fn request_timeout_has_a_floor() {
        let config = parse_config(r#"{ "request_timeout_secs": 0 }"#).expect("parse");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn only_backend_settings_require_a_new_client() {
        let base = Config::default();

        let mut feedback = base.clone();
        feedback.copy_feedback_ms = 500;
        assert!(!base.generator_changed(&feedback));

        let mut model = base.clone();
        model.gemini.model = "gemini-2.5-pro".into();
        assert!(base.generator_changed(&model));
    }

    #[test]
    fn rejects_empty_document() {
        assert!(parse_config("").is_err());
    }
}
