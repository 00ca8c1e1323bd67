//! カタログ補強
//!
//! リモートのカタログエントリをローカルプラグイン状態・依存グラフ・
//! ライセンス資格と突き合わせ、表示可能なレコードに仕立てる。
//! プラグインマネージャと依存リゾルバは capability として注入する。

use crate::dates;
use crate::dependency::{DependencyResolver, MissingRequirement};
use crate::error::Result;
use crate::marketplace::advertising;
use crate::marketplace::client::MarketplaceClient;
use crate::marketplace::consumer::Consumer;
use crate::marketplace::model::{EnrichedPlugin, PluginInfo, PurchaseType, UpdateCandidate};
use crate::registry::PluginRegistry;

/// カタログ補強パイプライン
pub struct Catalog<'a> {
    client: &'a MarketplaceClient,
    registry: &'a dyn PluginRegistry,
    resolver: &'a dyn DependencyResolver,
}

impl<'a> Catalog<'a> {
    pub fn new(
        client: &'a MarketplaceClient,
        registry: &'a dyn PluginRegistry,
        resolver: &'a dyn DependencyResolver,
    ) -> Self {
        Self {
            client,
            registry,
            resolver,
        }
    }

    /// プラグイン単体の補強済みレコードを取得
    pub async fn get_plugin_info(&self, name: &str) -> Result<EnrichedPlugin> {
        let plugin = self.client.get_plugin_info(name).await?;
        let candidates = self.update_candidates_or_empty().await;

        Ok(self.enrich(plugin, &candidates))
    }

    /// カタログを検索し、資格フィルタと補強を適用する
    ///
    /// 購入種別の絞り込みはリモート検索側のクエリパラメータに委ねる。
    /// ディストリビュータ許可リストが空でない場合、リスト外の所有者の
    /// エントリは補強前に落とす。
    pub async fn search_plugins(
        &self,
        query: &str,
        sort: &str,
        themes_only: bool,
        purchase_type: PurchaseType,
    ) -> Result<Vec<EnrichedPlugin>> {
        let plugins = if themes_only {
            self.client
                .search_for_themes("", query, sort, purchase_type)
                .await?
        } else {
            self.client
                .search_for_plugins("", query, sort, purchase_type)
                .await?
        };

        let consumer = Consumer::new(self.client.get_consumer().await?);
        let whitelist = consumer.whitelisted_distributors();

        let candidates = self.update_candidates_or_empty().await;

        let mut results = Vec::new();
        for plugin in plugins {
            if !whitelist.is_empty() && !is_developed_by_distributors(&plugin, &whitelist) {
                // 資格制限下ではサードパーティ製エントリを見せない
                continue;
            }
            results.push(self.enrich(plugin, &candidates));
        }

        Ok(results)
    }

    /// 更新のあるローカルプラグインの一覧
    ///
    /// リモートが更新ありと報告してもローカルにロードされていない
    /// エントリは落とす。
    pub async fn plugins_having_update(&self) -> Result<Vec<UpdateCandidate>> {
        let loaded = self.registry.loaded_plugins();

        let updates = self
            .client
            .get_info_of_plugins_having_update(&loaded, self.registry)
            .await?;

        let mut candidates = Vec::new();

        for update in updates {
            let Some(local) = loaded.iter().find(|p| p.name == update.plugin.name) else {
                continue;
            };

            let missing_requirements = self.missing_requirements_for(&update.plugin);

            candidates.push(UpdateCandidate {
                is_activated: self.registry.is_plugin_activated(&update.plugin.name),
                current_version: local.version.clone(),
                repository_changelog_url: update.repository_changelog_url,
                missing_requirements,
                plugin: update.plugin,
            });
        }

        Ok(candidates)
    }

    /// 公開中のプラグイン/テーマ名の一覧（全件検索から抽出）
    pub async fn available_plugin_names(&self, themes_only: bool) -> Result<Vec<String>> {
        let plugins = if themes_only {
            self.client
                .search_for_themes("", "", "", PurchaseType::All)
                .await?
        } else {
            self.client
                .search_for_plugins("", "", "", PurchaseType::All)
                .await?
        };

        Ok(plugins.into_iter().map(|p| p.name).collect())
    }

    /// プラグインとテーマを合わせた公開名一覧
    pub async fn all_available_plugin_names(&self) -> Result<Vec<String>> {
        let mut names = self.available_plugin_names(true).await?;
        names.extend(self.available_plugin_names(false).await?);
        Ok(names)
    }

    /// 選択中の区分（種別 × 購入種別）に一致する公開エントリ数
    ///
    /// 表示する件数の定義はこの1つに統一する。区分ごとに別の母集団を
    /// 数えることはしない。
    pub async fn num_available_plugins(
        &self,
        themes_only: bool,
        purchase_type: PurchaseType,
    ) -> Result<usize> {
        let plugins = if themes_only {
            self.client
                .search_for_themes("", "", "", purchase_type)
                .await?
        } else {
            self.client
                .search_for_plugins("", "", "", purchase_type)
                .await?
        };

        Ok(plugins.len())
    }

    /// 補強本体
    ///
    /// 導入状態・更新候補の重ね合わせ・日付整形・宣伝URL付与・依存判定。
    fn enrich(&self, mut plugin: PluginInfo, candidates: &[UpdateCandidate]) -> EnrichedPlugin {
        let is_installed = self.registry.is_plugin_loaded(&plugin.name);

        let update = candidates.iter().find(|c| c.plugin.name == plugin.name);
        let can_be_updated = is_installed && update.is_some();

        let (current_version, repository_changelog_url) = match update {
            Some(update) if can_be_updated => (
                Some(update.current_version.clone()),
                update.repository_changelog_url.clone(),
            ),
            _ => (None, None),
        };

        if let Some(last_updated) = plugin.last_updated.take() {
            plugin.last_updated = Some(dates::to_short_date(&last_updated));
        }

        self.add_campaign_parameters(&mut plugin);

        for version in &mut plugin.versions {
            if let Some(release) = version.release.take() {
                version.release = Some(dates::to_long_date(&release));
            }
        }

        if let Some(activity) = plugin.activity.as_mut() {
            // ゼロ/エポックの番兵値は日付として見せない
            activity.last_commit_date = match activity.last_commit_date.take() {
                Some(raw)
                    if !raw.is_empty() && !raw.contains("0000") && !raw.contains("1970") =>
                {
                    Some(dates::to_long_date(&raw))
                }
                _ => None,
            };
        }

        let missing_requirements = self.missing_requirements_for(&plugin);

        EnrichedPlugin {
            is_installed,
            can_be_updated,
            current_version,
            repository_changelog_url,
            missing_requirements,
            plugin,
        }
    }

    /// 商用ディストリビュータのエントリにのみキャンペーンパラメータを付与
    fn add_campaign_parameters(&self, plugin: &mut PluginInfo) {
        let is_commercial = plugin
            .owner
            .as_deref()
            .map_or(false, |owner| {
                owner.to_lowercase() == advertising::COMMERCIAL_DISTRIBUTOR
            });

        if !is_commercial {
            return;
        }

        let Some(homepage) = plugin.homepage.as_deref() else {
            return;
        };

        if homepage.contains(advertising::CAMPAIGN_PARAM) {
            return;
        }

        plugin.homepage = Some(advertising::add_campaign_parameters(
            homepage,
            advertising::CAMPAIGN_NAME_UPGRADE_TO_PRO,
            "Marketplace",
            &plugin.name,
        ));
    }

    /// 最新バージョンの `requires` 指定から不足依存を求める
    fn missing_requirements_for(&self, plugin: &PluginInfo) -> Vec<MissingRequirement> {
        plugin
            .latest()
            .and_then(|version| version.requires.as_ref())
            .map(|requires| self.resolver.missing_dependencies(requires))
            .unwrap_or_default()
    }

    async fn update_candidates_or_empty(&self) -> Vec<UpdateCandidate> {
        match self.plugins_having_update().await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("update check failed, continuing without candidates: {}", e);
                Vec::new()
            }
        }
    }
}

/// エントリの所有者が許可ディストリビュータかどうか（小文字完全一致）
fn is_developed_by_distributors(plugin: &PluginInfo, whitelist: &[String]) -> bool {
    let Some(owner) = plugin.owner.as_deref() else {
        return false;
    };

    let owner = owner.to_lowercase();
    whitelist.iter().any(|org| *org == owner)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
