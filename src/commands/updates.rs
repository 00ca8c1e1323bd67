//! mkt updates コマンド
//!
//! ローカル導入済みプラグインのうち更新のあるものを一覧表示する。

use crate::commands::build_client;
use crate::config::MktConfig;
use crate::dependency::CoreDependencyResolver;
use crate::marketplace::Catalog;
use crate::output::UpdateSummary;
use crate::registry::{InstalledPlugins, PluginRegistry};
use clap::Parser;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

#[derive(Debug, Parser)]
pub struct Args {}

pub async fn run(_args: Args) -> Result<(), String> {
    let config = MktConfig::load().map_err(|e| e.to_string())?;
    let client = build_client(&config)?;
    let registry = InstalledPlugins::load().map_err(|e| e.to_string())?;
    let resolver = CoreDependencyResolver::new(&config.core_version, &registry.loaded_plugins());
    let catalog = Catalog::new(&client, &registry, &resolver);

    let checked = registry.loaded_plugins().len();
    if checked == 0 {
        println!("No plugins installed.");
        return Ok(());
    }

    let candidates = catalog
        .plugins_having_update()
        .await
        .map_err(|e| e.to_string())?;

    if !candidates.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["NAME", "INSTALLED", "LATEST", "ACTIVATED", "CHANGELOG"]);

        for candidate in &candidates {
            table.add_row(vec![
                candidate.plugin.name.clone(),
                candidate.current_version.clone(),
                candidate
                    .plugin
                    .latest()
                    .map(|v| v.name.clone())
                    .unwrap_or_else(|| "-".to_string()),
                if candidate.is_activated { "yes" } else { "no" }.to_string(),
                candidate
                    .repository_changelog_url
                    .clone()
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }

        println!("{table}");
    }

    let summary = UpdateSummary::format(candidates.len(), checked);
    println!("{} {}", summary.prefix, summary.message);

    Ok(())
}
