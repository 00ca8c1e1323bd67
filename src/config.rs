//! CLI設定（~/.mkt/config.toml）
//!
//! マーケットプレイスドメイン、コアプラットフォームバージョン、保存済み
//! ライセンスキーを保持する。

use crate::error::{MktError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 既定のマーケットプレイスドメイン
pub const DEFAULT_DOMAIN: &str = "https://plugins.pluginhub.io";

/// 既定のコアプラットフォームバージョン
pub const DEFAULT_CORE_VERSION: &str = "5.3.0";

/// config.toml のシリアライズ形式
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    core_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    license_key: Option<String>,
}

/// CLI設定
pub struct MktConfig {
    path: PathBuf,
    pub domain: String,
    pub core_version: String,
    pub license_key: Option<String>,
}

impl MktConfig {
    /// 既定パス（~/.mkt/config.toml）から読み込み
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| MktError::Config("HOME environment variable not set".to_string()))?;
        let path = PathBuf::from(home).join(".mkt").join("config.toml");
        Self::load_from(path)
    }

    /// 指定パスから読み込み（ファイルがなければ既定値）
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let file = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str::<ConfigFile>(&content)
                .map_err(|e| MktError::Config(format!("failed to parse {}: {}", path.display(), e)))?
        } else {
            ConfigFile::default()
        };

        Ok(Self {
            path,
            domain: file.domain.unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            core_version: file
                .core_version
                .unwrap_or_else(|| DEFAULT_CORE_VERSION.to_string()),
            license_key: file.license_key.filter(|key| !key.is_empty()),
        })
    }

    /// 設定を書き戻す
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = ConfigFile {
            domain: Some(self.domain.clone()),
            core_version: Some(self.core_version.clone()),
            license_key: self.license_key.clone(),
        };

        let content = toml::to_string_pretty(&file)
            .map_err(|e| MktError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(&self.path, content)?;

        Ok(())
    }

    /// ライセンスキーを設定（`None` で削除）
    pub fn set_license_key(&mut self, license_key: Option<String>) {
        self.license_key = license_key.filter(|key| !key.is_empty());
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
