use crate::dependency::MissingRequirement;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// プラグイン作者情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
}

/// リポジトリアクティビティ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub last_commit_date: Option<String>,
    #[serde(default)]
    pub num_commits: Option<u64>,
    #[serde(default)]
    pub num_contributors: Option<u64>,
}

/// 公開済みバージョン
///
/// `versions` 列は古い順。末尾が常に最新版（並び替え禁止）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub name: String,
    #[serde(default)]
    pub release: Option<String>,
    /// 依存要件（依存リゾルバが解釈する形式のまま保持する）
    #[serde(default)]
    pub requires: Option<Value>,
    /// ダウンロードURL（マーケットプレイスドメインからの相対パス）
    #[serde(default)]
    pub download: Option<String>,
    #[serde(default)]
    pub num_downloads: u64,
    #[serde(default)]
    pub repository_changelog_url: Option<String>,
}

/// マーケットプレイスのカタログエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub is_theme: bool,
    #[serde(default)]
    pub num_downloads: u64,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub is_custom_plugin: bool,
    #[serde(default)]
    pub is_downloadable: bool,
    #[serde(default)]
    pub activity: Option<Activity>,
    #[serde(default)]
    pub versions: Vec<VersionRecord>,
}

impl PluginInfo {
    /// 最新バージョン（`versions` の末尾）
    pub fn latest(&self) -> Option<&VersionRecord> {
        self.versions.last()
    }
}

/// checkUpdates バッチ応答の1件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub name: String,
    #[serde(default)]
    pub repository_changelog_url: Option<String>,
}

/// 更新ありと報告されたプラグインのカタログ全文 + チェンジログURL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginUpdate {
    #[serde(flatten)]
    pub plugin: PluginInfo,
    pub repository_changelog_url: Option<String>,
}

/// ローカル導入済みプラグインと突き合わせ済みの更新候補
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidate {
    #[serde(flatten)]
    pub plugin: PluginInfo,
    pub repository_changelog_url: Option<String>,
    pub current_version: String,
    pub is_activated: bool,
    pub missing_requirements: Vec<MissingRequirement>,
}

/// 表示用に補強済みのカタログエントリ
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPlugin {
    #[serde(flatten)]
    pub plugin: PluginInfo,
    pub is_installed: bool,
    pub can_be_updated: bool,
    pub current_version: Option<String>,
    pub repository_changelog_url: Option<String>,
    pub missing_requirements: Vec<MissingRequirement>,
}

/// 購入種別フィルタ
///
/// リモート検索のクエリパラメータにそのまま渡す。`All` は空文字列。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PurchaseType {
    #[default]
    All,
    Free,
    Paid,
}

impl PurchaseType {
    /// クエリパラメータ値
    pub fn as_query_value(&self) -> &'static str {
        match self {
            PurchaseType::All => "",
            PurchaseType::Free => "free",
            PurchaseType::Paid => "paid",
        }
    }
}
