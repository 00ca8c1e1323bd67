//! マーケットプレイスクライアント
//!
//! ゲートウェイとキャッシュを束ね、カタログ検索・単体照会・コンシューマ照会・
//! 更新チェック・ダウンロードを提供する。取得系は全てキャッシュスルー。

use crate::error::{MktError, Result};
use crate::marketplace::cache::{cache_key, canonical_query, ResponseCache};
use crate::marketplace::consumer::ConsumerProfile;
use crate::marketplace::model::{PluginInfo, PluginUpdate, PurchaseType, UpdateInfo};
use crate::marketplace::service::{DownloadOutcome, MarketplaceService};
use crate::registry::{LoadedPlugin, PluginRegistry};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 取得応答のキャッシュTTL（秒）
pub const CACHE_TIMEOUT_IN_SECONDS: u64 = 1200;

/// マーケットプレイスクライアント
pub struct MarketplaceClient {
    service: Box<dyn MarketplaceService>,
    cache: Box<dyn ResponseCache>,
    /// 実行中のコアプラットフォームバージョン（ダウンロードURLに付与）
    core_version: String,
}

impl MarketplaceClient {
    pub fn new(
        service: Box<dyn MarketplaceService>,
        cache: Box<dyn ResponseCache>,
        core_version: impl Into<String>,
    ) -> Self {
        Self {
            service,
            cache,
            core_version: core_version.into(),
        }
    }

    /// キャッシュスルー取得
    ///
    /// キャッシュミスは常に再取得にフォールバックする。ダウンロードは
    /// この経路を通らない（キャッシュ対象外）。
    async fn fetch(&self, action: &str, params: BTreeMap<String, String>) -> Result<Value> {
        let query = canonical_query(&params);
        let key = cache_key(self.service.api_version(), action, &query);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let result = self.service.fetch(action, &params).await?;
        self.cache.put(&key, &result, CACHE_TIMEOUT_IN_SECONDS);

        Ok(result)
    }

    /// プラグイン単体のカタログエントリを取得
    ///
    /// 「存在しない」と「アクセス権がない」はリモート側で区別できないため、
    /// どちらも `PluginNotFound` として同一に報告する。
    pub async fn get_plugin_info(&self, name: &str) -> Result<PluginInfo> {
        let action = format!("plugins/{}/info", name);

        let value = match self.fetch(&action, BTreeMap::new()).await {
            Ok(value) => value,
            Err(MktError::NotAuthorized) | Err(MktError::RemoteError(_)) => {
                return Err(MktError::PluginNotFound(name.to_string()));
            }
            Err(e) => return Err(e),
        };

        Ok(serde_json::from_value(value)?)
    }

    /// コンシューマ（ライセンス状態）を取得
    ///
    /// 未認証は異常ではなく通常状態。認可エラーは明示的に `None` に写像し、
    /// トランスポート障害はそのまま伝播する。
    pub async fn get_consumer(&self) -> Result<Option<ConsumerProfile>> {
        match self.fetch("consumer", BTreeMap::new()).await {
            Ok(value) => Ok(Some(serde_json::from_value(value)?)),
            Err(MktError::NotAuthorized) | Err(MktError::RemoteError(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// プラグインを検索
    pub async fn search_for_plugins(
        &self,
        keywords: &str,
        query: &str,
        sort: &str,
        purchase_type: PurchaseType,
    ) -> Result<Vec<PluginInfo>> {
        self.search("plugins", keywords, query, sort, purchase_type)
            .await
    }

    /// テーマを検索
    pub async fn search_for_themes(
        &self,
        keywords: &str,
        query: &str,
        sort: &str,
        purchase_type: PurchaseType,
    ) -> Result<Vec<PluginInfo>> {
        self.search("themes", keywords, query, sort, purchase_type)
            .await
    }

    async fn search(
        &self,
        action: &str,
        keywords: &str,
        query: &str,
        sort: &str,
        purchase_type: PurchaseType,
    ) -> Result<Vec<PluginInfo>> {
        let mut params = BTreeMap::new();
        params.insert("keywords".to_string(), keywords.to_string());
        params.insert("query".to_string(), query.to_string());
        params.insert("sort".to_string(), sort.to_string());
        params.insert(
            "purchase_type".to_string(),
            purchase_type.as_query_value().to_string(),
        );

        let response = self.fetch(action, params).await?;

        // ヒットなしは空列。null やキー不在も同様に扱う
        match response.get("plugins") {
            Some(plugins) if !plugins.is_null() => Ok(serde_json::from_value(plugins.clone())?),
            _ => Ok(Vec::new()),
        }
    }

    /// 最新バージョンのダウンロードURLを解決
    ///
    /// `versions` の末尾が最新。バージョンが1件もなければエラー。
    pub async fn get_download_url(&self, name: &str) -> Result<String> {
        let plugin = self.get_plugin_info(name).await?;

        let latest = plugin
            .versions
            .last()
            .ok_or_else(|| MktError::NoVersionsAvailable(name.to_string()))?;

        let download = latest
            .download
            .as_deref()
            .ok_or_else(|| MktError::NoVersionsAvailable(name.to_string()))?;

        Ok(format!(
            "{}{}?coreVersion={}",
            self.service.domain(),
            download,
            self.core_version
        ))
    }

    /// パッケージを一時ファイルへダウンロード
    ///
    /// 保存先はプラグイン名から導出しないランダムなファイル名。成功時の
    /// ファイル削除は呼び出し側の責務。URL解決不能と転送失敗は `None`、
    /// トランスポート障害は `Err`。
    pub async fn download(&self, name: &str) -> Result<Option<PathBuf>> {
        let url = match self.get_download_url(name).await {
            Ok(url) => url,
            Err(e @ (MktError::PluginNotFound(_) | MktError::NoVersionsAvailable(_))) => {
                log::warn!("could not resolve download url for {}: {}", name, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let target = random_download_path()?;

        // 万一の残骸を消してから書く
        if target.exists() {
            std::fs::remove_file(&target)?;
        }

        // 巨大アーカイブの転送をタイムアウトで打ち切らない
        let outcome = self.service.download(&url, &target, None).await;

        match outcome {
            DownloadOutcome::Completed => Ok(Some(target)),
            DownloadOutcome::Failed { message } => {
                log::warn!("download of {} failed: {}", name, message);
                let _ = std::fs::remove_file(&target);
                Ok(None)
            }
        }
    }

    /// どのプラグインに新しいリモートバージョンがあるかを一括照会
    ///
    /// 同梱プラグインを除外した残り全件を1リクエストで問い合わせる。
    /// 対象が空ならネットワークに出ない。
    async fn check_updates(
        &self,
        plugins: &[LoadedPlugin],
        registry: &dyn PluginRegistry,
    ) -> Result<Vec<UpdateInfo>> {
        let mut entries = Vec::new();

        for plugin in plugins {
            if registry.is_plugin_bundled_with_core(&plugin.name) {
                continue;
            }
            entries.push(json!({ "name": plugin.name, "version": plugin.version }));
        }

        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = BTreeMap::new();
        params.insert(
            "plugins".to_string(),
            json!({ "plugins": entries }).to_string(),
        );

        let response = self.fetch("plugins/checkUpdates", params).await?;

        if response.is_null() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_value(response)?)
    }

    /// 更新のあるプラグインのカタログ全文を取得
    ///
    /// バッチ照会1回 + 更新ありと報告された件数分の個別照会。個別照会の
    /// 失敗はログに残してその1件だけを落とす。
    pub async fn get_info_of_plugins_having_update(
        &self,
        plugins: &[LoadedPlugin],
        registry: &dyn PluginRegistry,
    ) -> Result<Vec<PluginUpdate>> {
        let has_updates = self.check_updates(plugins, registry).await?;

        let mut details = Vec::new();

        for update in has_updates {
            if update.name.is_empty() {
                continue;
            }

            match self.get_plugin_info(&update.name).await {
                Ok(plugin) => details.push(PluginUpdate {
                    plugin,
                    repository_changelog_url: update.repository_changelog_url,
                }),
                Err(e) => {
                    log::error!("failed to fetch info for {}: {}", update.name, e);
                }
            }
        }

        Ok(details)
    }

    /// 全キャッシュエントリを破棄
    ///
    /// 資格情報（ライセンスキー）が変わったら必ず呼ぶこと。キャッシュ済み
    /// 応答には資格情報に依存する結果が含まれる。
    pub fn clear_all_cache_entries(&self) {
        self.cache.flush_all();
    }
}

/// ランダムな一時ダウンロードパスを生成
///
/// `{tmp}/mkt/latest/plugins/{uuid}.zip`。呼び出しごとに一意で、並行する
/// ダウンロード同士が衝突しない。
fn random_download_path() -> Result<PathBuf> {
    let dir = std::env::temp_dir()
        .join("mkt")
        .join("latest")
        .join("plugins");
    std::fs::create_dir_all(&dir)?;

    let filename = format!("{}.zip", uuid::Uuid::new_v4().simple());
    Ok(dir.join(filename))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
