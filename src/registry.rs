//! ローカルプラグイン状態
//!
//! ホスト側プラグインマネージャの照会インターフェース。カタログ補強と
//! 更新チェックには必ずこの capability を注入する（グローバル状態経由の
//! アクセスはしない）。

use crate::error::{MktError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ロード済みプラグインの名前とバージョンの組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPlugin {
    pub name: String,
    pub version: String,
}

impl LoadedPlugin {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// プラグインマネージャ照会 trait
pub trait PluginRegistry: Send + Sync {
    /// ロード済みプラグイン一覧
    fn loaded_plugins(&self) -> Vec<LoadedPlugin>;

    /// ロード済みかどうか
    fn is_plugin_loaded(&self, name: &str) -> bool;

    /// 有効化済みかどうか
    fn is_plugin_activated(&self, name: &str) -> bool;

    /// コア同梱プラグインかどうか（同梱品は単独更新の対象外）
    fn is_plugin_bundled_with_core(&self, name: &str) -> bool;
}

/// plugins.toml の1レコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledPlugin {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub bundled: bool,
}

/// plugins.toml のルート構造
#[derive(Debug, Default, Serialize, Deserialize)]
struct PluginsFile {
    #[serde(default)]
    plugins: Vec<InstalledPlugin>,
}

/// ファイルベースのプラグインレジストリ（~/.mkt/plugins.toml）
pub struct InstalledPlugins {
    plugins: Vec<InstalledPlugin>,
}

impl InstalledPlugins {
    /// 既定パスから読み込み
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| MktError::Config("HOME environment variable not set".to_string()))?;
        let path = PathBuf::from(home).join(".mkt").join("plugins.toml");
        Self::load_from(path)
    }

    /// 指定パスから読み込み（ファイルがなければ空のレジストリ）
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self { plugins: Vec::new() });
        }

        let content = std::fs::read_to_string(&path)?;
        let file: PluginsFile = toml::from_str(&content)
            .map_err(|e| MktError::Config(format!("failed to parse {}: {}", path.display(), e)))?;

        Ok(Self {
            plugins: file.plugins,
        })
    }

    /// レコードから直接構築（テスト用）
    pub fn from_records(plugins: Vec<InstalledPlugin>) -> Self {
        Self { plugins }
    }

    fn find(&self, name: &str) -> Option<&InstalledPlugin> {
        self.plugins.iter().find(|p| p.name == name)
    }
}

impl PluginRegistry for InstalledPlugins {
    fn loaded_plugins(&self) -> Vec<LoadedPlugin> {
        self.plugins
            .iter()
            .map(|p| LoadedPlugin::new(&p.name, &p.version))
            .collect()
    }

    fn is_plugin_loaded(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn is_plugin_activated(&self, name: &str) -> bool {
        self.find(name).map_or(false, |p| p.activated)
    }

    fn is_plugin_bundled_with_core(&self, name: &str) -> bool {
        self.find(name).map_or(false, |p| p.bundled)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
