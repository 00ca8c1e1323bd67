//! mkt search コマンド
//!
//! マーケットプレイスを検索し、資格フィルタ適用済みの一覧を表示する。

use crate::commands::build_client;
use crate::config::MktConfig;
use crate::dependency::CoreDependencyResolver;
use crate::marketplace::{Catalog, EnrichedPlugin, PurchaseType};
use crate::registry::{InstalledPlugins, PluginRegistry};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

/// 購入種別フィルタ
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PurchaseFilter {
    All,
    Free,
    Paid,
}

impl From<PurchaseFilter> for PurchaseType {
    fn from(filter: PurchaseFilter) -> Self {
        match filter {
            PurchaseFilter::All => PurchaseType::All,
            PurchaseFilter::Free => PurchaseType::Free,
            PurchaseFilter::Paid => PurchaseType::Paid,
        }
    }
}

#[derive(Debug, Parser)]
pub struct Args {
    /// Search query (matches name and description)
    #[arg(default_value = "")]
    pub query: String,

    /// Search themes instead of plugins
    #[arg(long)]
    pub themes: bool,

    /// Sort order (marketplace-defined key, e.g. popular, newest)
    #[arg(long, default_value = "")]
    pub sort: String,

    /// Purchase type filter
    #[arg(long, value_enum, default_value = "all")]
    pub purchase_type: PurchaseFilter,
}

pub async fn run(args: Args) -> Result<(), String> {
    let config = MktConfig::load().map_err(|e| e.to_string())?;
    let client = build_client(&config)?;
    let registry = InstalledPlugins::load().map_err(|e| e.to_string())?;
    let resolver = CoreDependencyResolver::new(&config.core_version, &registry.loaded_plugins());
    let catalog = Catalog::new(&client, &registry, &resolver);

    let purchase_type: PurchaseType = args.purchase_type.into();
    let kind = if args.themes { "theme" } else { "plugin" };

    let results = catalog
        .search_plugins(&args.query, &args.sort, args.themes, purchase_type)
        .await
        .map_err(|e| e.to_string())?;

    if results.is_empty() {
        println!("No matching {}(s) found.", kind);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["NAME", "OWNER", "LATEST", "DOWNLOADS", "STATUS"]);

    for plugin in &results {
        table.add_row(vec![
            plugin.plugin.name.clone(),
            plugin.plugin.owner.clone().unwrap_or_else(|| "-".to_string()),
            plugin
                .plugin
                .latest_version
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            plugin.plugin.num_downloads.to_string(),
            status_of(plugin),
        ]);
    }

    println!("{table}");

    // 件数の定義は「選択中の区分に一致する全公開エントリ数」で統一
    let num_available = catalog
        .num_available_plugins(args.themes, purchase_type)
        .await
        .map_err(|e| e.to_string())?;

    println!("{} of {} available {}(s) shown.", results.len(), num_available, kind);

    Ok(())
}

fn status_of(plugin: &EnrichedPlugin) -> String {
    if plugin.can_be_updated {
        "update available".to_string()
    } else if plugin.is_installed {
        "installed".to_string()
    } else if plugin.plugin.is_paid {
        "paid".to_string()
    } else {
        "-".to_string()
    }
}
