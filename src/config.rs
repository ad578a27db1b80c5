use crate::error::{MeterOcrError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub base_url: Option<String>,
    pub chunk_size: usize,
    pub per_page: u32,
    pub max_in_flight: usize,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            chunk_size: 10,        // バックエンドの1回あたり処理枚数に合わせる
            per_page: 12,
            max_in_flight: 4,
            poll_interval_ms: 3000,
            max_poll_attempts: 100,
            timeout_seconds: 120,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MeterOcrError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("meter-ocr").join("config.json"))
    }

    pub fn get_base_url(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(url) = std::env::var("METER_OCR_BASE_URL") {
            return Ok(url);
        }

        self.base_url.clone().ok_or(MeterOcrError::MissingBaseUrl)
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        self.base_url = Some(url);
        self.save()
    }
}
